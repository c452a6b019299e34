//! Provider error types

use thiserror::Error;

/// Errors from a single chat-completion call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for the LLM provider")]
    MissingCredentials,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether a later identical call could plausibly succeed.
    ///
    /// Recorded in the per-attempt log; the plan generator retries every
    /// failure regardless.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::MissingCredentials | Self::InvalidResponse(_) | Self::Json(_) => false,
        }
    }
}
