//! Rationale generation boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::verdict::Answer;

/// Inputs for one generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Question to answer (already rendered from the message understanding)
    pub question: String,

    /// 1-based attempt number
    pub attempt: usize,

    /// Why the previous attempt failed verification, if it did
    pub feedback: Option<String>,
}

impl GenerationRequest {
    pub fn first(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            attempt: 1,
            feedback: None,
        }
    }
}

/// Produces an answer together with the chain of thought behind it.
#[async_trait]
pub trait RationaleGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Answer>;
}
