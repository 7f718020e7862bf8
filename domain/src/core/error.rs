//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every variant is recoverable: callers surface the message as a banner and
/// the session carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("You can have at most {max} personas. Remove one before adding another.")]
    PersonaLimitReached { max: usize },

    #[error("Persona \"{0}\" was not found")]
    PersonaNotFound(String),

    #[error("Goal \"{0}\" was not found")]
    GoalNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown agent type: {0}")]
    UnknownAgent(String),
}

impl DomainError {
    /// Check if this error is a failed lookup of a named entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::PersonaNotFound(_) | DomainError::GoalNotFound(_)
        )
    }
}
