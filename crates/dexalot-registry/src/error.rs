//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid {resource} response: {reason}")]
    Validation {
        resource: &'static str,
        reason: String,
    },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Unknown pair: {0}")]
    UnknownPair(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn validation(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            resource,
            reason: reason.into(),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
