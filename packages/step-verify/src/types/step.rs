//! Reasoning steps and their classification labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One sentence-like segment of a rationale.
///
/// Has no identity beyond its position in the segmented sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 0-based position in the rationale
    pub index: usize,

    /// Step text, trimmed of surrounding whitespace
    pub text: String,
}

impl Step {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Closed set of labels a step classifier may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// The only label that lets a step pass verification.
    #[serde(rename = "necessary_essential_valid", alias = "necessary_essential_and_valid")]
    NecessaryEssentialAndValid,
    Unnecessary,
    LogicallyFalse,
    NotBackedByPriorFacts,
    BadDeductiveReasoning,
}

impl StepType {
    /// All labels, in the order they are presented to the classifier.
    pub const ALL: [StepType; 5] = [
        StepType::NecessaryEssentialAndValid,
        StepType::Unnecessary,
        StepType::LogicallyFalse,
        StepType::NotBackedByPriorFacts,
        StepType::BadDeductiveReasoning,
    ];

    /// Wire value expected from the classifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::NecessaryEssentialAndValid => "necessary_essential_valid",
            StepType::Unnecessary => "unnecessary",
            StepType::LogicallyFalse => "logically_false",
            StepType::NotBackedByPriorFacts => "not_backed_by_prior_facts",
            StepType::BadDeductiveReasoning => "bad_deductive_reasoning",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, StepType::NecessaryEssentialAndValid)
    }

    /// Comma-separated list of wire values, for prompts and schemas.
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(StepType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label string that is not one of the five [`StepType`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStepType(pub String);

impl fmt::Display for UnknownStepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown step label {:?} (expected one of: {})",
            self.0,
            StepType::allowed_values()
        )
    }
}

impl std::error::Error for UnknownStepType {}

impl FromStr for StepType {
    type Err = UnknownStepType;

    /// Lenient on case, whitespace, surrounding quotes and `-`/space
    /// separators; strict on the label itself.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");

        match normalized.as_str() {
            "necessary_essential_valid" | "necessary_essential_and_valid" => {
                Ok(StepType::NecessaryEssentialAndValid)
            }
            "unnecessary" => Ok(StepType::Unnecessary),
            "logically_false" => Ok(StepType::LogicallyFalse),
            "not_backed_by_prior_facts" => Ok(StepType::NotBackedByPriorFacts),
            "bad_deductive_reasoning" => Ok(StepType::BadDeductiveReasoning),
            _ => Err(UnknownStepType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_values() {
        for label in StepType::ALL {
            assert_eq!(label.as_str().parse::<StepType>().unwrap(), label);
        }
    }

    #[test]
    fn test_parse_long_form_alias() {
        let label: StepType = "necessary_essential_and_valid".parse().unwrap();
        assert!(label.is_valid());
    }

    #[test]
    fn test_parse_is_lenient_on_formatting() {
        assert_eq!(
            "  \"Logically False\" ".parse::<StepType>().unwrap(),
            StepType::LogicallyFalse
        );
        assert_eq!(
            "not-backed-by-prior-facts".parse::<StepType>().unwrap(),
            StepType::NotBackedByPriorFacts
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "probably fine".parse::<StepType>().unwrap_err();
        assert_eq!(err.0, "probably fine");
        assert!(err.to_string().contains("bad_deductive_reasoning"));
    }

    #[test]
    fn test_only_one_valid_label() {
        let valid: Vec<_> = StepType::ALL.iter().filter(|t| t.is_valid()).collect();
        assert_eq!(valid, vec![&StepType::NecessaryEssentialAndValid]);
    }

    #[test]
    fn test_serde_uses_wire_value() {
        let json = serde_json::to_string(&StepType::NecessaryEssentialAndValid).unwrap();
        assert_eq!(json, "\"necessary_essential_valid\"");

        let parsed: StepType = serde_json::from_str("\"necessary_essential_and_valid\"").unwrap();
        assert_eq!(parsed, StepType::NecessaryEssentialAndValid);
    }
}
