//! Chain verification loop.
//!
//! Classifies each step of a rationale in order, carrying the previous
//! step's text as context, and records a retry signal for every step that
//! is not `necessary_essential_valid`. The loop never aborts on a failed
//! step and never retries anything itself: the caller decides what to do
//! with the verdict.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, VerifyError};
use crate::traits::classifier::{ClassificationRequest, StepClassifier};
use crate::types::{
    config::LabelPolicy,
    step::{Step, StepType},
    verdict::{ChainVerdict, RetrySignal, StepVerdict, RETRY_REASON},
};

/// Drives a [`StepClassifier`] across a sequence of steps.
pub struct ChainVerifier<C> {
    classifier: C,
    label_policy: LabelPolicy,
}

impl<C: StepClassifier> ChainVerifier<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            label_policy: LabelPolicy::default(),
        }
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Verify `steps` in order.
    pub async fn verify(&self, objective: &str, question: &str, steps: &[Step]) -> Result<ChainVerdict> {
        self.verify_with_cancel(objective, question, steps, &CancellationToken::new())
            .await
    }

    /// Verify `steps` in order, stopping between steps once `cancel` fires.
    ///
    /// A classification already in flight is allowed to finish.
    pub async fn verify_with_cancel(
        &self,
        objective: &str,
        question: &str,
        steps: &[Step],
        cancel: &CancellationToken,
    ) -> Result<ChainVerdict> {
        let mut verdict = ChainVerdict::default();
        let mut request = ClassificationRequest {
            objective: objective.to_string(),
            question: question.to_string(),
            ..Default::default()
        };

        for step in steps {
            if cancel.is_cancelled() {
                debug!(step = step.index, "Verification cancelled");
                return Err(VerifyError::Cancelled);
            }

            request.current_step = step.text.clone();
            let raw_label = self.classifier.classify(&request).await?;
            let label = self.interpret(step, &raw_label)?;

            debug!(step = step.index, label = %raw_label, "Classified step");

            if !label.is_some_and(|l| l.is_valid()) {
                info!(step = step.index, label = %raw_label, "Step failed verification, requesting retry");
                verdict.retries.push(RetrySignal {
                    step_index: step.index,
                    label,
                    raw_label: raw_label.clone(),
                    reason: RETRY_REASON.to_string(),
                });
            }

            verdict.steps.push(StepVerdict {
                index: step.index,
                text: step.text.clone(),
                label,
            });

            request.previous_step = std::mem::take(&mut request.current_step);
        }

        Ok(verdict)
    }

    fn interpret(&self, step: &Step, raw_label: &str) -> Result<Option<StepType>> {
        match raw_label.parse::<StepType>() {
            Ok(label) => Ok(Some(label)),
            Err(unknown) => match self.label_policy {
                LabelPolicy::Strict => Err(VerifyError::ContractViolation {
                    step_index: step.index,
                    label: unknown.0,
                }),
                LabelPolicy::TreatAsInvalid => {
                    warn!(step = step.index, label = %raw_label, "Unknown step label, treating as invalid");
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::classifier::MockStepClassifier;
    use crate::testing::ScriptedClassifier;

    fn steps(texts: &[&str]) -> Vec<Step> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Step::new(i, *t))
            .collect()
    }

    #[tokio::test]
    async fn test_previous_step_threading() {
        let classifier = ScriptedClassifier::always(StepType::NecessaryEssentialAndValid);
        let verifier = ChainVerifier::new(classifier);

        verifier
            .verify("obj", "q", &steps(&["A.", "B.", "C."]))
            .await
            .unwrap();

        let requests = verifier.classifier().requests();
        let previous: Vec<_> = requests.iter().map(|r| r.previous_step.as_str()).collect();
        let current: Vec<_> = requests.iter().map(|r| r.current_step.as_str()).collect();
        assert_eq!(previous, vec!["", "A.", "B."]);
        assert_eq!(current, vec!["A.", "B.", "C."]);
        assert!(requests.iter().all(|r| r.objective == "obj" && r.question == "q"));
    }

    #[tokio::test]
    async fn test_all_valid_no_retries() {
        let verifier = ChainVerifier::new(ScriptedClassifier::new(vec![
            StepType::NecessaryEssentialAndValid,
            StepType::NecessaryEssentialAndValid,
            StepType::NecessaryEssentialAndValid,
        ]));

        let verdict = verifier.verify("", "", &steps(&["a", "b", "c"])).await.unwrap();

        assert!(verdict.passed());
        assert_eq!(verdict.steps.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_middle_step_does_not_abort() {
        let verifier = ChainVerifier::new(ScriptedClassifier::new(vec![
            StepType::NecessaryEssentialAndValid,
            StepType::Unnecessary,
            StepType::NecessaryEssentialAndValid,
        ]));

        let verdict = verifier
            .verify("", "", &steps(&["one", "two", "three"]))
            .await
            .unwrap();

        assert_eq!(verdict.retries.len(), 1);
        assert_eq!(verdict.retries[0].step_index, 1);
        assert_eq!(verdict.retries[0].label, Some(StepType::Unnecessary));
        assert_eq!(verdict.retries[0].reason, RETRY_REASON);

        let requests = verifier.classifier().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].previous_step, "two");
    }

    #[tokio::test]
    async fn test_empty_steps_never_call_classifier() {
        let mut mock = MockStepClassifier::new();
        mock.expect_classify().never();

        let verdict = ChainVerifier::new(mock).verify("o", "q", &[]).await.unwrap();
        assert!(verdict.passed());
        assert!(verdict.steps.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_label_strict_is_contract_violation() {
        let mut mock = MockStepClassifier::new();
        mock.expect_classify()
            .returning(|_| Ok("looks fine to me".to_string()));

        let err = ChainVerifier::new(mock)
            .verify("o", "q", &steps(&["x"]))
            .await
            .unwrap_err();

        match err {
            VerifyError::ContractViolation { step_index, label } => {
                assert_eq!(step_index, 0);
                assert_eq!(label, "looks fine to me");
            }
            other => panic!("expected contract violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_label_tolerated_as_invalid() {
        let mut mock = MockStepClassifier::new();
        mock.expect_classify()
            .times(2)
            .returning(|_| Ok("maybe".to_string()));

        let verdict = ChainVerifier::new(mock)
            .with_label_policy(LabelPolicy::TreatAsInvalid)
            .verify("o", "q", &steps(&["x", "y"]))
            .await
            .unwrap();

        assert_eq!(verdict.failed_indices(), vec![0, 1]);
        assert_eq!(verdict.retries[0].label, None);
        assert_eq!(verdict.retries[0].raw_label, "maybe");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut mock = MockStepClassifier::new();
        mock.expect_classify()
            .times(1)
            .returning(|_| Err(VerifyError::provider("rate limited")));

        let err = ChainVerifier::new(mock)
            .verify("o", "q", &steps(&["x", "y"]))
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::Provider(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_step() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut mock = MockStepClassifier::new();
        mock.expect_classify().never();

        let err = ChainVerifier::new(mock)
            .verify_with_cancel("o", "q", &steps(&["x"]), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_while_classifying_stops_before_next_step() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let mut mock = MockStepClassifier::new();
        mock.expect_classify().times(1).returning(move |request| {
            assert_eq!(request.current_step, "x");
            token.cancel();
            Ok("necessary_essential_valid".to_string())
        });

        let err = ChainVerifier::new(mock)
            .verify_with_cancel("o", "q", &steps(&["x", "y"]), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::Cancelled));
    }
}
