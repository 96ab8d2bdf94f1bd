//! Structured reading of a user message, produced before generation.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What the user asked, why, and how the question decomposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessageUnderstanding {
    /// Clearer rephrasing of the question; empty unless useful.
    #[serde(default)]
    pub clear_rephrasing_of_message: String,

    /// Why the user is asking this at this point in the chat.
    #[serde(default)]
    pub why_is_user_asking_this: String,

    /// The user's overall objective, implicit or explicit.
    #[serde(default)]
    pub what_is_user_objective: String,

    /// Simpler sub-questions.
    #[serde(default)]
    pub question_decomposition: Vec<String>,
}

impl MessageUnderstanding {
    /// Understanding that carries only an objective.
    pub fn with_objective(objective: impl Into<String>) -> Self {
        Self {
            what_is_user_objective: objective.into(),
            ..Default::default()
        }
    }
}

/// Rendered form fed to the generator and the responder.
impl fmt::Display for MessageUnderstanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.clear_rephrasing_of_message.is_empty() {
            writeln!(f, "Question: {}", self.clear_rephrasing_of_message)?;
        }
        if !self.why_is_user_asking_this.is_empty() {
            writeln!(f, "Why asked: {}", self.why_is_user_asking_this)?;
        }
        if !self.what_is_user_objective.is_empty() {
            writeln!(f, "Objective: {}", self.what_is_user_objective)?;
        }
        if !self.question_decomposition.is_empty() {
            writeln!(f, "Sub-questions:")?;
            for sub in &self.question_decomposition {
                writeln!(f, "- {}", sub)?;
            }
        }
        Ok(())
    }
}
