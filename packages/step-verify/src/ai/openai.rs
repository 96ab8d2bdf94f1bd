//! Adapter over an OpenAI-compatible endpoint (OpenAI, Ollama).
//!
//! One adapter talks to one chat model. To generate and classify with
//! different models, build two adapters over clones of the same client;
//! clones share the connection pool and the exchange history.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::LlmClient;
//! use step_verify::ai::LlmAdapter;
//!
//! let client = LlmClient::ollama();
//! let generator = LlmAdapter::new(client.clone(), "mistral:v0.2");
//! let classifier = LlmAdapter::new(client, "command-r:latest");
//! let backtracker = Backtracker::new(generator, classifier, VerifyConfig::default())?;
//! ```

use async_trait::async_trait;
use llm_client::LlmClient;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, VerifyError};
use crate::pipeline::prompts::{
    format_aggregator_task, format_conversational_prompt, format_evidence_task,
    format_generate_prompt, format_outcome_prompt, format_step_verification_prompt,
    format_suggester_task, format_understand_prompt, strip_termination, CONVERSATIONAL_SYSTEM,
    EVIDENCE_AGGREGATOR_SYSTEM, EVIDENCE_EXTRACTOR_SYSTEM, EVIDENCE_SUGGESTER_SYSTEM,
    GENERATE_SYSTEM, ICO_SYSTEM, OUTCOME_SYSTEM, REFERENCES_SYSTEM, STEP_VERIFICATION_SYSTEM,
    UNDERSTAND_SYSTEM,
};
use crate::traits::{
    classifier::{ClassificationRequest, StepClassifier},
    conversation::{ConversationalResponder, MessageUnderstander},
    evidence::{EvidenceGatherer, Embedder, IcoExtractor, OutcomeVerifier, ReferenceExtractor},
    generator::{GenerationRequest, RationaleGenerator},
};
use crate::types::{
    evidence::{IcoTriple, ScoredRecord, SignificantChange},
    understanding::MessageUnderstanding,
    verdict::Answer,
};

/// Embedding model used unless overridden.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Label for one step, as the classifier model returns it.
#[derive(Debug, Deserialize, JsonSchema)]
struct StepAnnotation {
    /// One of the allowed step labels
    step_annotation: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GeneratedAnswer {
    /// Step-by-step reasoning, one declarative sentence per step
    rationale: String,

    /// Final answer to the question
    answer: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ReferenceList {
    /// References cited in the article, in citation order
    references: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct OutcomeConclusion {
    /// significant_increase, significant_decrease or no_significant_difference
    conclusion: String,
}

/// Implements every model trait against one chat model.
#[derive(Clone)]
pub struct LlmAdapter {
    client: LlmClient,
    model: String,
    embedding_model: String,
}

impl LlmAdapter {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Set the embedding model (default: text-embedding-3-small).
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    async fn role_turn(&self, system: &str, task: String) -> Result<String> {
        let content = self.client.complete(&self.model, system, task).await?;
        Ok(strip_termination(&content))
    }
}

#[async_trait]
impl StepClassifier for LlmAdapter {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String> {
        let prompt = format_step_verification_prompt(
            &request.objective,
            &request.question,
            &request.previous_step,
            &request.current_step,
        );

        let annotation: StepAnnotation = self
            .client
            .extract(&self.model, STEP_VERIFICATION_SYSTEM, prompt)
            .await?;

        debug!(label = %annotation.step_annotation, "Step classified");
        Ok(annotation.step_annotation)
    }
}

#[async_trait]
impl RationaleGenerator for LlmAdapter {
    async fn generate(&self, request: &GenerationRequest) -> Result<Answer> {
        let prompt = format_generate_prompt(&request.question, request.feedback.as_deref());
        let generated: GeneratedAnswer = self
            .client
            .extract(&self.model, GENERATE_SYSTEM, prompt)
            .await?;

        Ok(Answer::new(generated.answer, generated.rationale))
    }
}

#[async_trait]
impl MessageUnderstander for LlmAdapter {
    async fn understand(&self, chat: &[String], message: &str) -> Result<MessageUnderstanding> {
        let prompt = format_understand_prompt(chat, message);
        Ok(self
            .client
            .extract::<MessageUnderstanding>(&self.model, UNDERSTAND_SYSTEM, prompt)
            .await?)
    }
}

#[async_trait]
impl ConversationalResponder for LlmAdapter {
    async fn respond(
        &self,
        raw_message: &str,
        structured_message: &str,
        rationale: &str,
    ) -> Result<String> {
        let prompt = format_conversational_prompt(raw_message, structured_message, rationale);
        Ok(self
            .client
            .complete(&self.model, CONVERSATIONAL_SYSTEM, prompt)
            .await?)
    }
}

#[async_trait]
impl IcoExtractor for LlmAdapter {
    async fn extract_ico(&self, text: &str) -> Result<IcoTriple> {
        Ok(self
            .client
            .extract::<IcoTriple>(&self.model, ICO_SYSTEM, text)
            .await?)
    }
}

#[async_trait]
impl ReferenceExtractor for LlmAdapter {
    async fn extract_references(&self, text: &str) -> Result<Vec<String>> {
        let list: ReferenceList = self
            .client
            .extract(&self.model, REFERENCES_SYSTEM, text)
            .await?;
        Ok(list.references)
    }
}

#[async_trait]
impl EvidenceGatherer for LlmAdapter {
    /// Extractor, suggester and aggregator roles take one turn each.
    async fn gather(&self, document: &str, ico: &IcoTriple) -> Result<String> {
        let extracted = self
            .role_turn(EVIDENCE_EXTRACTOR_SYSTEM, format_evidence_task(document, ico))
            .await?;
        let suggested = self
            .role_turn(
                EVIDENCE_SUGGESTER_SYSTEM,
                format_suggester_task(document, &extracted),
            )
            .await?;
        self.role_turn(
            EVIDENCE_AGGREGATOR_SYSTEM,
            format_aggregator_task(&extracted, &suggested),
        )
        .await
    }
}

#[async_trait]
impl Embedder for LlmAdapter {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .client
            .create_embedding(text, &self.embedding_model)
            .await?)
    }
}

#[async_trait]
impl OutcomeVerifier for LlmAdapter {
    async fn infer(&self, ico: &IcoTriple, related: &[ScoredRecord]) -> Result<SignificantChange> {
        let outcome: OutcomeConclusion = self
            .client
            .extract(&self.model, OUTCOME_SYSTEM, format_outcome_prompt(ico, related))
            .await?;

        outcome
            .conclusion
            .parse::<SignificantChange>()
            .map_err(VerifyError::provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::StructuredOutput;

    #[test]
    fn test_adapter_builder() {
        let adapter = LlmAdapter::new(LlmClient::ollama(), "command-r:latest")
            .with_embedding_model("nomic-embed-text");

        assert_eq!(adapter.model(), "command-r:latest");
        assert_eq!(adapter.embedding_model(), "nomic-embed-text");
        assert_eq!(adapter.client().base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_step_annotation_schema_is_closed() {
        let schema = StepAnnotation::strict_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"][0], "step_annotation");
    }

    #[test]
    fn test_generated_answer_requires_both_fields() {
        let schema = GeneratedAnswer::strict_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }
}
