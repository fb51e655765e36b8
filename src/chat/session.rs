//! ChatFlow: one conversation with the assistant, from greeting to hand-off.
//!
//! At most one completion request is in flight per flow. A reply that carries
//! a hand-off payload schedules navigation to the report form after a short
//! delay so the user can read the final message first.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::config::ChatConfig;
use crate::context::{NavigationEvent, SessionContext};
use crate::error::CollaboratorError;
use crate::intake::ReportDraft;
use crate::llm::{CompletionRequest, LlmProvider};
use crate::store::{Collection, RecordId};

use super::extract::{ExtractedPayload, extract};
use super::quick_actions::QuickAction;
use super::transcript::{ChatTranscript, Message};

/// Assistant message shown when the completion service cannot be reached.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Why a send was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    Pending,
    QuickActionsHidden,
}

/// What a send (or quick action) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing changed.
    Rejected(Rejection),
    /// An assistant reply was appended.
    Replied { handoff_scheduled: bool },
    /// The completion call failed and the fallback message was appended.
    Fallback,
    /// Navigated straight to the report form.
    OpenedForm,
}

#[derive(Debug)]
struct ChatState {
    transcript: ChatTranscript,
    session_id: Option<RecordId>,
    pending: bool,
    quick_actions_dismissed: bool,
    last_payload: Option<ExtractedPayload>,
}

/// A single chat session.
#[derive(Clone)]
pub struct ChatFlow {
    ctx: SessionContext,
    llm: Arc<dyn LlmProvider>,
    config: ChatConfig,
    state: Arc<RwLock<ChatState>>,
}

impl ChatFlow {
    /// Seed the transcript with the greeting and try to create the session
    /// record. Without a signed-in user, or if the insert fails, the flow runs
    /// unpersisted.
    pub async fn start(ctx: SessionContext, llm: Arc<dyn LlmProvider>, config: ChatConfig) -> Self {
        let transcript = ChatTranscript::seeded(config.greeting.clone());
        let session_id = Self::create_session(&ctx, &transcript).await;

        Self {
            ctx,
            llm,
            config,
            state: Arc::new(RwLock::new(ChatState {
                transcript,
                session_id,
                pending: false,
                quick_actions_dismissed: false,
                last_payload: None,
            })),
        }
    }

    async fn create_session(ctx: &SessionContext, transcript: &ChatTranscript) -> Option<RecordId> {
        let Some(user) = ctx.user.as_ref() else {
            tracing::debug!("No signed-in user; chat will not be persisted");
            return None;
        };
        let record = json!({
            "user_id": user.as_str(),
            "messages": transcript,
        });
        match ctx.store.insert(Collection::ChatSessions, record).await {
            Ok(id) => {
                tracing::info!(session_id = %id, "Chat session created");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to create chat session, continuing unpersisted: {}",
                    CollaboratorError::from(e)
                );
                None
            }
        }
    }

    /// Send a user message and append the assistant's reply.
    ///
    /// Blank input and sends while a request is pending are rejected without
    /// touching the transcript.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Rejected(Rejection::EmptyInput);
        }

        let context = {
            let mut state = self.state.write().await;
            if state.pending {
                return SendOutcome::Rejected(Rejection::Pending);
            }
            state.pending = true;
            state.quick_actions_dismissed = true;
            state.transcript.push(Message::user(text));
            state.transcript.to_chat_messages()
        };

        let result = self.llm.complete(CompletionRequest::new(context)).await;

        let (outcome, payload) = match result {
            Ok(response) => {
                let extraction = extract(&response.content);
                let mut state = self.state.write().await;
                state.transcript.push(Message::assistant(extraction.display));
                state.last_payload = extraction.payload.clone();
                state.pending = false;
                drop(state);
                self.persist().await;
                let outcome = SendOutcome::Replied {
                    handoff_scheduled: extraction.payload.is_some(),
                };
                (outcome, extraction.payload)
            }
            Err(e) => {
                tracing::warn!("Chat completion failed: {}", CollaboratorError::from(e));
                let mut state = self.state.write().await;
                state.transcript.push(Message::assistant(FALLBACK_REPLY));
                state.pending = false;
                (SendOutcome::Fallback, None)
            }
        };

        if let Some(payload) = payload {
            self.schedule_handoff(payload);
        }
        outcome
    }

    /// Trigger a quick action. Only available while the greeting is the
    /// sole message.
    pub async fn quick_action(&self, action: QuickAction) -> SendOutcome {
        if !self.quick_actions_visible().await {
            return SendOutcome::Rejected(Rejection::QuickActionsHidden);
        }
        match action.prompt() {
            Some(prompt) => self.send_message(prompt).await,
            None => {
                self.ctx.navigator.navigate(NavigationEvent::OpenReportForm {
                    prefill: Box::default(),
                });
                SendOutcome::OpenedForm
            }
        }
    }

    pub async fn quick_actions_visible(&self) -> bool {
        let state = self.state.read().await;
        !state.quick_actions_dismissed && state.transcript.len() == 1
    }

    /// Write the transcript and latest payload to the session record.
    async fn persist(&self) {
        let (session_id, patch) = {
            let state = self.state.read().await;
            let Some(id) = state.session_id.clone() else {
                return;
            };
            let context = state
                .last_payload
                .as_ref()
                .map_or(Value::Null, ExtractedPayload::to_value);
            (id, json!({ "messages": &state.transcript, "context": context }))
        };
        if let Err(e) = self
            .ctx
            .store
            .update(Collection::ChatSessions, &session_id, patch)
            .await
        {
            tracing::warn!(session_id = %session_id, "Failed to persist chat session: {}", e);
        }
    }

    fn schedule_handoff(&self, payload: ExtractedPayload) {
        let navigator = self.ctx.navigator.clone();
        let delay = self.config.handoff_delay;
        let prefill = Box::new(ReportDraft::from_payload(&payload));
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Hand-off to report form scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(NavigationEvent::OpenReportForm { prefill });
        });
    }

    pub async fn transcript(&self) -> ChatTranscript {
        self.state.read().await.transcript.clone()
    }

    pub async fn session_id(&self) -> Option<RecordId> {
        self.state.read().await.session_id.clone()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.read().await.pending
    }

    /// Payload decoded from the most recent assistant reply, if any.
    pub async fn last_payload(&self) -> Option<ExtractedPayload> {
        self.state.read().await.last_payload.clone()
    }
}

impl std::fmt::Debug for ChatFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatFlow")
            .field("model", &self.llm.model_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
