//! Application layer for bestself-coach
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatParams, SyncParams};
pub use ports::{
    auth::AuthPort,
    backend_error::BackendError,
    chat_progress::{ChatProgressNotifier, NoChatProgress},
    connectivity::ConnectivityProbe,
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_repository::ConversationRepository,
    goal_repository::GoalRepository,
    llm_gateway::{ChatRequest, GatewayError, LlmGateway},
    persona_repository::PersonaRepository,
    session_store::SessionStore,
};
pub use use_cases::chat_service::{ChatError, ChatService, PendingMessage, SendMessageResult};
pub use use_cases::conversation_manager::{CoachReply, ConversationManager, TurnOutcome};
pub use use_cases::debounce::FieldDebouncer;
pub use use_cases::goal_service::{GoalActionReport, GoalService, GoalServiceError};
pub use use_cases::persona_service::{
    PersonaActionReport, PersonaField, PersonaService, PersonaServiceError,
};
pub use use_cases::sign_in::{SignInError, SignInUseCase};
