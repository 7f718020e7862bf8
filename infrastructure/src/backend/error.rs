//! Error types for the HTTP backend adapter

use bestself_application::BackendError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("Could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        source: reqwest::Error,
    },
}

impl From<HttpClientError> for BackendError {
    fn from(error: HttpClientError) -> Self {
        match error {
            HttpClientError::Transport(e) if e.is_connect() || e.is_timeout() => {
                BackendError::Unreachable(e.to_string())
            }
            HttpClientError::Transport(e) => BackendError::Other(e.to_string()),
            HttpClientError::Status { status, detail } if status == StatusCode::NOT_FOUND => {
                BackendError::NotFound(detail)
            }
            HttpClientError::Status { status, detail } if status.is_server_error() => {
                BackendError::Unreachable(format!("{status}: {detail}"))
            }
            HttpClientError::Status { status, detail } => BackendError::Rejected {
                status: status.as_u16(),
                message: detail,
            },
            HttpClientError::Decode { what, source } => {
                BackendError::InvalidResponse(format!("{what}: {source}"))
            }
        }
    }
}

/// FastAPI puts the reason in `{"detail": ...}`
pub(crate) fn detail_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }
    match serde_json::from_str::<Detail>(body) {
        Ok(Detail {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(Detail { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
