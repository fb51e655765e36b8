//! Conversational extraction flow.

pub mod extract;
pub mod quick_actions;
pub mod session;
pub mod transcript;

pub use extract::{ExtractedPayload, Extraction, extract};
pub use quick_actions::QuickAction;
pub use session::{ChatFlow, FALLBACK_REPLY, Rejection, SendOutcome};
pub use transcript::{ChatTranscript, Message, MessageRole};
