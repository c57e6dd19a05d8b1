use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend on rejected requests, e.g.
/// `{"error": "invalid file type"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub error: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Best-effort extraction of the backend message from a raw response body.
    pub fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<BackendError>(body)
            .ok()
            .map(|parsed| parsed.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Error)]
#[error("backend rejected request ({status}): {message}")]
pub struct BackendRejection {
    pub status: u16,
    pub message: String,
}

impl BackendRejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn from_body(status: u16, body: &str) -> Self {
        let message = BackendError::message_from_body(body)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::new(status, message)
    }
}

impl From<BackendRejection> for BackendError {
    fn from(value: BackendRejection) -> Self {
        Self {
            error: value.message,
        }
    }
}
