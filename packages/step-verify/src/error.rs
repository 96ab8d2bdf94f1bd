//! Typed errors for the step-verify library.
//!
//! Uses `thiserror` for library errors (not `anyhow`); the CLI wraps these
//! with context.

use thiserror::Error;

/// Errors that can occur during verification and evidence operations.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The model provider failed (network, rate limit, malformed response).
    ///
    /// Never retried locally; retries happen at the generation level.
    #[error("provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The classifier returned a label outside the closed enumeration.
    #[error("classifier returned {label:?} for step {step_index}, which is not a known step label")]
    ContractViolation { step_index: usize, label: String },

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Operation was cancelled between steps
    #[error("operation cancelled")]
    Cancelled,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl VerifyError {
    /// Wrap any provider-side error.
    pub fn provider(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        VerifyError::Provider(err.into())
    }
}

#[cfg(feature = "openai")]
impl From<llm_client::LlmError> for VerifyError {
    fn from(err: llm_client::LlmError) -> Self {
        VerifyError::Provider(Box::new(err))
    }
}

/// Result type alias for step-verify operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
