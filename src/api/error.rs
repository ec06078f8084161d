//! API Errors
//!
//! Every failed backend call ends up as one `ApiError`, carrying the HTTP
//! status when there was one.

use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("backend did not respond in {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Timeout { .. } | ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout { seconds: timeout.as_secs().max(1) }
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status { status: status.as_u16(), message: err.to_string() }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Human-readable message from an error body: `message` or `error` fields of
/// a JSON body, else the raw text, else the status reason.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}
