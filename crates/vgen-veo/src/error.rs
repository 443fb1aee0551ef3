//! Veo client error types.

use std::time::Duration;

use thiserror::Error;

pub type VeoResult<T> = Result<T, VeoError>;

#[derive(Debug, Error)]
pub enum VeoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Veo API returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The operation finished with an error; `message` is the provider's text
    #[error("{message}")]
    Provider { code: Option<i64>, message: String },

    #[error("Generation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeoError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn provider(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Provider {
            code,
            message: message.into(),
        }
    }

    /// Network errors and 5xx responses are retried. A 429 is not, since
    /// submits carry no idempotency key.
    pub fn is_retryable(&self) -> bool {
        match self {
            VeoError::Network(e) => !e.is_decode() && !e.is_builder(),
            VeoError::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            VeoError::Http { status, .. } => Some(*status),
            VeoError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
