//! Errors shared by every backend port

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Whether retrying later could succeed
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Unreachable(_))
    }
}
