//! Conversation domain module
//!
//! The in-memory record of a chat session ([`ConversationContext`]), the
//! messages it is made of, keyword intent analysis, and the persisted
//! conversation record kept by the backend.

pub mod context;
pub mod intent;
pub mod message;
pub mod record;

pub use context::{ContextUpdates, ConversationContext, PersonaSummary, TemporaryState};
pub use intent::{IntentMatch, analyze_intent};
pub use message::{ConversationMessage, Sender};
pub use record::{ConversationRecord, ConversationStatus, NewConversation};
