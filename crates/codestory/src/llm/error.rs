use thiserror::Error;

use super::repair::JsonRepairError;

/// Failure talking to, or interpreting output from, the text generator.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Text generator is not configured (missing or placeholder API key)")]
    NotConfigured,

    #[error("Text generator returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Repair(#[from] JsonRepairError),
}

impl LlmError {
    /// Transport failures, throttling and upstream 5xx are worth another
    /// attempt; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) => true,
            LlmError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
