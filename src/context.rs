//! Session context: the signed-in user and explicit collaborator handles.
//!
//! Wizards and chat flows receive a `SessionContext` at construction instead
//! of reading ambient client state.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::intake::ReportDraft;
use crate::store::{Collection, RecordId, RecordStore};

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the caller should take the user next.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// A record was stored; the form is finished.
    Submitted { collection: Collection, id: RecordId },
    /// The user backed out of the first wizard step.
    Cancelled,
    /// Open the found-animal report form, pre-filled with whatever is known.
    OpenReportForm { prefill: Box<ReportDraft> },
}

/// Caller-supplied navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, event: NavigationEvent);
}

/// Forwards navigation events over an unbounded channel.
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, event: NavigationEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Navigation receiver dropped; event discarded");
        }
    }
}

/// Records every event it receives. Handy for tests and headless callers.
#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, event: NavigationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Everything a screen-level flow needs from the outside world.
#[derive(Clone)]
pub struct SessionContext {
    /// The signed-in user, if any.
    pub user: Option<UserId>,
    pub store: Arc<dyn RecordStore>,
    pub navigator: Arc<dyn Navigator>,
}

impl SessionContext {
    pub fn new(
        user: Option<UserId>,
        store: Arc<dyn RecordStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            user,
            store,
            navigator,
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
