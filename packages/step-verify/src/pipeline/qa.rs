//! Verified question answering with a conversational wrapper.
//!
//! understand message → backtracked generation + verification → reply.

use tracing::{debug, info};

use super::backtrack::Backtracker;
use crate::error::Result;
use crate::traits::{
    classifier::StepClassifier,
    conversation::{ConversationalResponder, MessageUnderstander},
    generator::RationaleGenerator,
};
use crate::types::{understanding::MessageUnderstanding, verdict::VerifiedAnswer};

/// Everything produced for one question.
#[derive(Debug, Clone)]
pub struct QaOutcome {
    /// Conversational reply for the user
    pub reply: String,

    pub understanding: MessageUnderstanding,

    /// The answer the reply is based on, with its verification status
    pub verified: VerifiedAnswer,
}

/// Question answering whose chain of thought is verified step by step.
///
/// Generation and classification are separate adapters, so they can run
/// on different models.
pub struct VerifiedQa<U, R, G, C> {
    understander: U,
    responder: R,
    backtracker: Backtracker<G, C>,
}

impl<U, R, G, C> VerifiedQa<U, R, G, C>
where
    U: MessageUnderstander,
    R: ConversationalResponder,
    G: RationaleGenerator,
    C: StepClassifier,
{
    pub fn new(understander: U, responder: R, backtracker: Backtracker<G, C>) -> Self {
        Self {
            understander,
            responder,
            backtracker,
        }
    }

    pub fn backtracker(&self) -> &Backtracker<G, C> {
        &self.backtracker
    }

    /// Answer a question that opens a new chat.
    pub async fn ask(&self, question: &str) -> Result<QaOutcome> {
        self.ask_in_chat(&[], question).await
    }

    /// Answer a message given the chat so far.
    pub async fn ask_in_chat(&self, chat: &[String], question: &str) -> Result<QaOutcome> {
        let understanding = self.understander.understand(chat, question).await?;
        let structured = understanding.to_string();
        debug!(objective = %understanding.what_is_user_objective, "Message understood");

        let objective = if understanding.what_is_user_objective.trim().is_empty() {
            question
        } else {
            understanding.what_is_user_objective.as_str()
        };

        let verified = self.backtracker.run(&structured, objective, question).await?;
        info!(
            status = ?verified.status,
            attempts = verified.attempts,
            "Answer ready"
        );

        let reply = self
            .responder
            .respond(question, &structured, &verified.answer.answer)
            .await?;

        Ok(QaOutcome {
            reply,
            understanding,
            verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAI, MockAICall, ScriptedClassifier, ScriptedGenerator};
    use crate::types::{config::VerifyConfig, step::StepType, verdict::Answer};

    fn qa(
        ai: MockAI,
        generator: ScriptedGenerator,
        classifier: ScriptedClassifier,
    ) -> VerifiedQa<MockAI, MockAI, ScriptedGenerator, ScriptedClassifier> {
        let backtracker = Backtracker::new(generator, classifier, VerifyConfig::default()).unwrap();
        VerifiedQa::new(ai.clone(), ai, backtracker)
    }

    #[tokio::test]
    async fn test_objective_and_structured_message_flow() {
        let ai = MockAI::new().with_understanding(MessageUnderstanding {
            clear_rephrasing_of_message: "Does metformin lower HbA1c?".into(),
            what_is_user_objective: "manage type 2 diabetes".into(),
            ..Default::default()
        });
        let generator = ScriptedGenerator::new(vec![Answer::new("Yes.", "Trials agree.")]);
        let classifier = ScriptedClassifier::always(StepType::NecessaryEssentialAndValid);

        let qa = qa(ai.clone(), generator, classifier);
        let outcome = qa.ask("metformin?").await.unwrap();

        assert!(outcome.verified.is_verified());
        assert_eq!(outcome.reply, "You asked \"metformin?\". Yes.");

        let gen_requests = qa.backtracker().generator().requests();
        assert!(gen_requests[0].question.contains("Objective: manage type 2 diabetes"));

        let cls_requests = qa.backtracker().classifier().requests();
        assert_eq!(cls_requests[0].objective, "manage type 2 diabetes");
        assert_eq!(cls_requests[0].question, "metformin?");

        assert!(matches!(ai.calls()[0], MockAICall::Understand { .. }));
        assert!(matches!(ai.calls().last(), Some(MockAICall::Respond { .. })));
    }

    #[tokio::test]
    async fn test_empty_objective_falls_back_to_question() {
        let ai = MockAI::new().with_understanding(MessageUnderstanding::default());
        let generator = ScriptedGenerator::new(vec![Answer::new("42", "Compute it.")]);
        let classifier = ScriptedClassifier::always(StepType::NecessaryEssentialAndValid);

        let qa = qa(ai, generator, classifier);
        qa.ask("what is six times seven").await.unwrap();

        let requests = qa.backtracker().classifier().requests();
        assert_eq!(requests[0].objective, "what is six times seven");
    }

    #[tokio::test]
    async fn test_unverified_answer_still_gets_reply() {
        let ai = MockAI::new();
        let generator = ScriptedGenerator::new(vec![Answer::new("maybe", "Guess.")]);
        let classifier = ScriptedClassifier::always(StepType::NotBackedByPriorFacts);

        let qa = qa(ai, generator, classifier);
        let outcome = qa.ask("q").await.unwrap();

        assert!(!outcome.verified.is_verified());
        assert_eq!(outcome.verified.attempts, 3);
        assert!(outcome.reply.contains("maybe"));
    }
}
