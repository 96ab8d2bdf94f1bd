//! Configuration for verification and evidence ingestion.

use serde::{Deserialize, Serialize};

/// What to do when the classifier returns a label outside the closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Fail the pass with a contract-violation error.
    #[default]
    Strict,

    /// Log a warning and count the step as failed (triggers a retry).
    TreatAsInvalid,
}

/// Configuration for the verification loop and the backtrack coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Maximum number of generations per request, including the first.
    ///
    /// Must be at least 1. Default: 3.
    pub max_attempts: usize,

    /// Handling of out-of-set classifier labels. Default: strict.
    pub label_policy: LabelPolicy,

    /// Feed the previous attempt's failed steps back into regeneration.
    ///
    /// Default: true.
    pub feedback_on_retry: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            label_policy: LabelPolicy::Strict,
            feedback_on_retry: true,
        }
    }
}

impl VerifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn with_feedback_on_retry(mut self, enabled: bool) -> Self {
        self.feedback_on_retry = enabled;
        self
    }
}

/// Configuration for evidence ingestion and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Related records considered when verifying an outcome. Default: 10.
    pub search_limit: usize,

    /// Run the evidence gatherer during ingest. Default: true.
    pub gather_evidence: bool,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            search_limit: 10,
            gather_evidence: true,
        }
    }
}

impl EvidenceConfig {
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_gather_evidence(mut self, enabled: bool) -> Self {
        self.gather_evidence = enabled;
        self
    }
}
