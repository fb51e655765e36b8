//! Integration tests for the chat → report form → store path.
//!
//! A stub completion provider stands in for the remote API; navigation is
//! captured with a channel so tests can follow the hand-off like a caller would.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

use straymatch::chat::{ChatFlow, Rejection, SendOutcome};
use straymatch::config::ChatConfig;
use straymatch::context::{ChannelNavigator, NavigationEvent, RecordingNavigator, SessionContext, UserId};
use straymatch::error::LlmError;
use straymatch::intake::{HealthStatus, ReportDraft, Species, Wizard, WizardPhase};
use straymatch::llm::{CompletionRequest, CompletionResponse, LlmProvider, Role};
use straymatch::matches::load_matches;
use straymatch::store::{Collection, Filter, LibSqlStore, MemoryStore, RecordStore};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Always answers with the same text and remembers the last request.
struct StubLlm {
    reply: String,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl StubLlm {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        *self.last_request.lock().await = Some(request);
        Ok(CompletionResponse::text(&self.reply))
    }
}

/// Blocks every call until released, counting calls.
struct GatedLlm {
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for GatedLlm {
    fn model_name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(CompletionResponse::text("Thanks for waiting."))
    }
}

fn fast_config() -> ChatConfig {
    ChatConfig {
        handoff_delay: Duration::from_millis(20),
        ..Default::default()
    }
}

#[tokio::test]
async fn transcript_sent_as_role_content_pairs() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SessionContext::new(
        Some(UserId::new("u1")),
        store,
        Arc::new(RecordingNavigator::new()),
    );
    let llm = Arc::new(StubLlm::new("Is the animal hurt?"));
    let flow = ChatFlow::start(ctx, llm.clone(), ChatConfig::default()).await;

    flow.send_message("I found a stray dog").await;

    let request = llm.last_request.lock().await.clone().unwrap();
    let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User]);
    assert_eq!(request.messages[1].content, "I found a stray dog");
}

#[tokio::test]
async fn second_send_while_pending_is_rejected() {
    let ctx = SessionContext::new(
        Some(UserId::new("u1")),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNavigator::new()),
    );
    let llm = Arc::new(GatedLlm {
        gate: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let flow = ChatFlow::start(ctx, llm.clone(), ChatConfig::default()).await;

    let first = {
        let flow = flow.clone();
        tokio::spawn(async move { flow.send_message("first").await })
    };

    timeout(TEST_TIMEOUT, async {
        while !flow.is_pending().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("first send never became pending");

    let before = flow.transcript().await.len();
    assert_eq!(
        flow.send_message("second").await,
        SendOutcome::Rejected(Rejection::Pending)
    );
    assert_eq!(flow.transcript().await.len(), before);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);

    llm.gate.notify_one();
    let outcome = timeout(TEST_TIMEOUT, first).await.unwrap().unwrap();
    assert_eq!(outcome, SendOutcome::Replied { handoff_scheduled: false });
    assert_eq!(flow.transcript().await.len(), 3);
    assert!(!flow.is_pending().await);
}

#[tokio::test]
async fn handoff_prefills_report_and_submit_reaches_store() {
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
    let (navigator, mut navigation) = ChannelNavigator::new();
    let ctx = SessionContext::new(Some(UserId::new("finder-1")), store.clone(), Arc::new(navigator));

    let reply = "I've got what I need and will open the report form.\n\
        {\"species\": \"dog\", \"size\": \"large\", \"color\": \"black\", \
        \"health_status\": \"needs_vet\", \"description\": \"Limping, friendly\", \
        \"can_keep_temporarily\": false, \"urgency\": \"high\"}";
    let flow = ChatFlow::start(ctx.clone(), Arc::new(StubLlm::new(reply)), fast_config()).await;

    assert_eq!(
        flow.send_message("Found a big black dog, it's limping").await,
        SendOutcome::Replied { handoff_scheduled: true }
    );
    assert_eq!(
        flow.transcript().await.last().unwrap().content,
        "I've got what I need and will open the report form."
    );

    let event = timeout(TEST_TIMEOUT, navigation.recv()).await.unwrap().unwrap();
    let NavigationEvent::OpenReportForm { prefill } = event else {
        panic!("expected report form hand-off, got {event:?}");
    };
    assert_eq!(prefill.species, Some(Species::Dog));
    assert_eq!(prefill.health_status, Some(HealthStatus::NeedsVet));
    assert_eq!(prefill.color, "black");

    // The user adds the location, which the chat never supplies.
    let wizard = Wizard::with_prefill(ctx.clone(), *prefill)
        .edit(|d: &mut ReportDraft| d.set_location(29.4241, -98.4936).unwrap())
        .unwrap();
    let done = wizard.submit().await.unwrap();
    assert!(matches!(done.phase(), WizardPhase::Done { .. }));

    let submitted = timeout(TEST_TIMEOUT, navigation.recv()).await.unwrap().unwrap();
    assert!(matches!(
        submitted,
        NavigationEvent::Submitted { collection: Collection::FoundAnimals, .. }
    ));

    let report = store
        .get_one(Collection::FoundAnimals, &Filter::new().eq("finder_id", "finder-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.data["urgency_level"], "high");
    assert_eq!(report.data["status"], "active");
    assert_eq!(report.data["location_lat"], 29.4241);

    // The chat session kept the payload as context.
    let session_id = flow.session_id().await.unwrap();
    let session = store
        .get_one(Collection::ChatSessions, &Filter::new().eq("id", session_id.as_str()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.data["context"]["species"], "dog");
    assert_eq!(session.data["messages"].as_array().unwrap().len(), 3);

    // With no foster application, every active report is a match.
    let matches = load_matches(&ctx).await.unwrap();
    assert_eq!(matches.animals.len(), 1);
}
