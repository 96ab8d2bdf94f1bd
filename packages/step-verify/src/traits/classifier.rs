//! Step classification boundary.

use async_trait::async_trait;

use crate::error::Result;

/// Inputs for classifying one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRequest {
    /// What the user is ultimately trying to achieve
    pub objective: String,

    /// The original question
    pub question: String,

    /// Text of the preceding step; empty for the first step
    pub previous_step: String,

    /// Text of the step being classified
    pub current_step: String,
}

/// Classifies a reasoning step into one of the step labels.
///
/// Pure delegation: implementations call a model and return its label
/// verbatim. Validation against the closed label set happens in the
/// verification loop, so an adapter must not coerce unknown labels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StepClassifier: Send + Sync {
    /// Return the raw label for `request.current_step`.
    ///
    /// Provider failures (timeouts, rate limits) must be returned as errors,
    /// never swallowed.
    async fn classify(&self, request: &ClassificationRequest) -> Result<String>;
}

#[async_trait]
impl<T: StepClassifier + ?Sized> StepClassifier for std::sync::Arc<T> {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String> {
        (**self).classify(request).await
    }
}
