//! Verification results: per-step verdicts, retry signals, and the final
//! verified answer handed back to callers.

use serde::{Deserialize, Serialize};

use super::step::StepType;

/// Reason attached to every retry signal.
pub const RETRY_REASON: &str =
    "Each step in the thought process must be necessary, logically valid, and factually backed.";

/// Output of the generation provider for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Final answer text
    pub answer: String,

    /// Chain-of-thought the answer was derived from
    pub rationale: String,
}

impl Answer {
    pub fn new(answer: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            rationale: rationale.into(),
        }
    }
}

/// Classification of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepVerdict {
    pub index: usize,
    pub text: String,

    /// `None` when the classifier returned a label outside the closed set
    /// and the label policy tolerated it.
    pub label: Option<StepType>,
}

impl StepVerdict {
    pub fn passed(&self) -> bool {
        self.label.is_some_and(|l| l.is_valid())
    }
}

/// Request to redo the whole upstream generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySignal {
    /// Index of the step that failed
    pub step_index: usize,

    /// Label the step received (`None` for an out-of-set label)
    pub label: Option<StepType>,

    /// Raw label text as returned by the classifier
    pub raw_label: String,

    pub reason: String,
}

/// Result of one pass of the verification loop over a rationale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerdict {
    /// One verdict per step, in step order
    pub steps: Vec<StepVerdict>,

    /// One signal per failed step, in step order
    pub retries: Vec<RetrySignal>,
}

impl ChainVerdict {
    /// True iff no step requested a retry.
    pub fn passed(&self) -> bool {
        self.retries.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.retries.iter().map(|r| r.step_index).collect()
    }
}

/// Whether the returned answer survived verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Some attempt produced a rationale with every step valid.
    Verified,

    /// The retry budget ran out; the answer is the last attempt's.
    Unverified,
}

/// Answer returned by the backtrack coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedAnswer {
    pub answer: Answer,

    /// Verdict for the returned answer's rationale
    pub verdict: ChainVerdict,

    /// Number of generations performed (1-based)
    pub attempts: usize,

    pub status: VerificationStatus,
}

impl VerifiedAnswer {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(index: usize) -> RetrySignal {
        RetrySignal {
            step_index: index,
            label: Some(StepType::Unnecessary),
            raw_label: "unnecessary".into(),
            reason: RETRY_REASON.into(),
        }
    }

    #[test]
    fn test_empty_chain_passes() {
        assert!(ChainVerdict::default().passed());
    }

    #[test]
    fn test_failed_indices_in_order() {
        let verdict = ChainVerdict {
            steps: vec![],
            retries: vec![signal(1), signal(3)],
        };
        assert!(!verdict.passed());
        assert_eq!(verdict.failed_indices(), vec![1, 3]);
    }

    #[test]
    fn test_step_verdict_without_label_fails() {
        let verdict = StepVerdict {
            index: 0,
            text: "x".into(),
            label: None,
        };
        assert!(!verdict.passed());
    }
}
