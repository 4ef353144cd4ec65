use thiserror::Error;

pub const CREDENTIALS_MISSING_MESSAGE: &str = "Azure OpenAI credentials not configured";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to get response from AI";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Failures of a single proxied chat request
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Azure OpenAI credentials not configured")]
    CredentialsMissing,

    #[error("Azure OpenAI returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Request to Azure OpenAI failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected Azure OpenAI response: {0}")]
    Decode(String),

    #[error("Invalid chat request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}

impl ProxyError {
    /// HTTP status reported to the caller
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::Upstream { status, .. } => *status,
            _ => 500,
        }
    }

    /// Caller-facing message. The upstream body is never part of it.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::CredentialsMissing => CREDENTIALS_MISSING_MESSAGE,
            ProxyError::Upstream { .. } => UPSTREAM_FAILURE_MESSAGE,
            ProxyError::Transport(_) | ProxyError::Decode(_) | ProxyError::InvalidRequest(_) => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}
