//! Backtrack coordinator: bounded regeneration until a rationale verifies.
//!
//! Each attempt regenerates the whole answer, segments its rationale and
//! runs the verification loop. The first passing attempt wins. When the
//! budget runs out the last answer is returned as unverified instead of
//! failing, so callers always get something to show.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::prompts::format_retry_feedback;
use super::segment::rationale_to_steps;
use super::verify::ChainVerifier;
use crate::error::{Result, VerifyError};
use crate::traits::{
    classifier::StepClassifier,
    generator::{GenerationRequest, RationaleGenerator},
};
use crate::types::{
    config::VerifyConfig,
    verdict::{VerificationStatus, VerifiedAnswer},
};

/// Generation + verification with an explicit retry budget.
pub struct Backtracker<G, C> {
    generator: G,
    verifier: ChainVerifier<C>,
    config: VerifyConfig,
}

impl<G: RationaleGenerator, C: StepClassifier> Backtracker<G, C> {
    /// Fails if `config.max_attempts` is zero.
    pub fn new(generator: G, classifier: C, config: VerifyConfig) -> Result<Self> {
        if config.max_attempts == 0 {
            return Err(VerifyError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            generator,
            verifier: ChainVerifier::new(classifier).with_label_policy(config.label_policy),
            config,
        })
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn classifier(&self) -> &C {
        self.verifier.classifier()
    }

    /// Run until verified or out of attempts.
    ///
    /// `input` goes to the generator; `objective` and `question` go to the
    /// classifier with every step.
    pub async fn run(&self, input: &str, objective: &str, question: &str) -> Result<VerifiedAnswer> {
        self.run_with_cancel(input, objective, question, &CancellationToken::new())
            .await
    }

    pub async fn run_with_cancel(
        &self,
        input: &str,
        objective: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<VerifiedAnswer> {
        let mut request = GenerationRequest::first(input);

        loop {
            if cancel.is_cancelled() {
                return Err(VerifyError::Cancelled);
            }

            let answer = self.generator.generate(&request).await?;
            let steps = rationale_to_steps(&answer.rationale);
            let verdict = self
                .verifier
                .verify_with_cancel(objective, question, &steps, cancel)
                .await?;

            if verdict.passed() {
                info!(attempt = request.attempt, steps = steps.len(), "Rationale verified");
                return Ok(VerifiedAnswer {
                    answer,
                    verdict,
                    attempts: request.attempt,
                    status: VerificationStatus::Verified,
                });
            }

            warn!(
                attempt = request.attempt,
                max_attempts = self.config.max_attempts,
                failed_steps = ?verdict.failed_indices(),
                "Rationale failed verification"
            );

            if request.attempt >= self.config.max_attempts {
                return Ok(VerifiedAnswer {
                    answer,
                    verdict,
                    attempts: request.attempt,
                    status: VerificationStatus::Unverified,
                });
            }

            request = GenerationRequest {
                question: input.to_string(),
                attempt: request.attempt + 1,
                feedback: self
                    .config
                    .feedback_on_retry
                    .then(|| format_retry_feedback(&verdict)),
            };
        }
    }
}
