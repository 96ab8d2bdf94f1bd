//! Conversational wrapper boundaries: understanding before, reply after.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::understanding::MessageUnderstanding;

/// Reads a new user message in the context of the chat so far.
#[async_trait]
pub trait MessageUnderstander: Send + Sync {
    async fn understand(&self, chat: &[String], message: &str) -> Result<MessageUnderstanding>;
}

/// Turns a verified answer into a conversational reply.
#[async_trait]
pub trait ConversationalResponder: Send + Sync {
    /// `rationale` is the text the reply should be based on.
    async fn respond(
        &self,
        raw_message: &str,
        structured_message: &str,
        rationale: &str,
    ) -> Result<String>;
}
