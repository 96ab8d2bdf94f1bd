//! Testing utilities including scripted implementations of every model trait.
//!
//! These let applications exercise verification and evidence flows without
//! making real model calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{Result, VerifyError};
use crate::traits::{
    classifier::{ClassificationRequest, StepClassifier},
    conversation::{ConversationalResponder, MessageUnderstander},
    evidence::{EvidenceGatherer, Embedder, IcoExtractor, OutcomeVerifier, ReferenceExtractor},
    generator::{GenerationRequest, RationaleGenerator},
};
use crate::types::{
    evidence::{IcoTriple, ScoredRecord, SignificantChange},
    step::StepType,
    understanding::MessageUnderstanding,
    verdict::Answer,
};

/// A classifier that replays a script of labels.
///
/// Labels keyed by exact step text take precedence over the script. Once
/// the script runs out, the fallback label is returned.
#[derive(Clone)]
pub struct ScriptedClassifier {
    script: Arc<RwLock<VecDeque<String>>>,
    by_text: Arc<RwLock<HashMap<String, String>>>,
    fallback: String,
    fail_with: Option<String>,
    requests: Arc<RwLock<Vec<ClassificationRequest>>>,
}

impl ScriptedClassifier {
    /// Replay `labels` in order, then fall back to valid.
    pub fn new(labels: Vec<StepType>) -> Self {
        Self::raw(labels.iter().map(|l| l.as_str().to_string()).collect())
    }

    /// Replay raw label strings, including ones outside the closed set.
    pub fn raw(labels: Vec<String>) -> Self {
        Self {
            script: Arc::new(RwLock::new(labels.into())),
            by_text: Arc::default(),
            fallback: StepType::NecessaryEssentialAndValid.as_str().to_string(),
            fail_with: None,
            requests: Arc::default(),
        }
    }

    /// Always return `label`.
    pub fn always(label: StepType) -> Self {
        Self {
            fallback: label.as_str().to_string(),
            ..Self::raw(vec![])
        }
    }

    /// Return `label` whenever the current step text is exactly `text`.
    pub fn with_label_for(self, text: impl Into<String>, label: StepType) -> Self {
        self.by_text
            .write()
            .unwrap()
            .insert(text.into(), label.as_str().to_string());
        self
    }

    /// Fail every call with a provider error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Every request seen, in call order.
    pub fn requests(&self) -> Vec<ClassificationRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl StepClassifier for ScriptedClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String> {
        self.requests.write().unwrap().push(request.clone());

        if let Some(message) = &self.fail_with {
            return Err(VerifyError::provider(message.clone()));
        }

        if let Some(label) = self.by_text.read().unwrap().get(&request.current_step) {
            return Ok(label.clone());
        }

        Ok(self
            .script
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// A generator that replays a script of answers.
///
/// The last answer repeats once the script is exhausted.
#[derive(Clone)]
pub struct ScriptedGenerator {
    answers: Arc<RwLock<VecDeque<Answer>>>,
    last: Arc<RwLock<Option<Answer>>>,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Arc::new(RwLock::new(answers.into())),
            last: Arc::default(),
            requests: Arc::default(),
        }
    }

    /// Every request seen, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl RationaleGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Answer> {
        self.requests.write().unwrap().push(request.clone());

        let next = self.answers.write().unwrap().pop_front();
        let mut last = self.last.write().unwrap();
        if let Some(answer) = next {
            *last = Some(answer);
        }

        (*last)
            .clone()
            .ok_or_else(|| VerifyError::provider("scripted generator has no answers"))
    }
}

/// Record of a call made to [`MockAI`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockAICall {
    Understand { message: String },
    Respond { raw_message: String, rationale: String },
    ExtractIco { text_len: usize },
    ExtractReferences { text_len: usize },
    Gather { intervention: String },
    Embed { text: String },
    Infer { related: usize },
}

/// A mock for the conversation and evidence traits.
///
/// Returns deterministic, configurable responses and records every call.
#[derive(Clone)]
pub struct MockAI {
    understanding: Option<MessageUnderstanding>,
    icos: Arc<RwLock<HashMap<String, IcoTriple>>>,
    references: Vec<String>,
    references_by_text: Arc<RwLock<HashMap<String, Vec<String>>>>,
    evidence: String,
    conclusion: SignificantChange,
    embedding_dim: usize,
    calls: Arc<RwLock<Vec<MockAICall>>>,
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            understanding: None,
            icos: Arc::default(),
            references: Vec::new(),
            references_by_text: Arc::default(),
            evidence: String::new(),
            conclusion: SignificantChange::NoSignificantDifference,
            embedding_dim: 64,
            calls: Arc::default(),
        }
    }

    /// Understanding returned for every message.
    pub fn with_understanding(mut self, understanding: MessageUnderstanding) -> Self {
        self.understanding = Some(understanding);
        self
    }

    /// ICO returned for a text that contains `needle`.
    pub fn with_ico(self, needle: impl Into<String>, ico: IcoTriple) -> Self {
        self.icos.write().unwrap().insert(needle.into(), ico);
        self
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// References returned for a text that contains `needle`.
    pub fn with_references_for(self, needle: impl Into<String>, references: Vec<String>) -> Self {
        self.references_by_text
            .write()
            .unwrap()
            .insert(needle.into(), references);
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }

    pub fn with_conclusion(mut self, conclusion: SignificantChange) -> Self {
        self.conclusion = conclusion;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockAICall> {
        self.calls.read().unwrap().clone()
    }

    fn record(&self, call: MockAICall) {
        self.calls.write().unwrap().push(call);
    }

    /// Deterministic embedding seeded from a hash of the text.
    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let hash = Sha256::digest(text.as_bytes());
        (0..self.embedding_dim)
            .map(|i| (hash[i % 32] as f32 / 127.5) - 1.0)
            .collect()
    }
}

#[async_trait]
impl MessageUnderstander for MockAI {
    async fn understand(&self, _chat: &[String], message: &str) -> Result<MessageUnderstanding> {
        self.record(MockAICall::Understand {
            message: message.to_string(),
        });

        Ok(self.understanding.clone().unwrap_or_else(|| MessageUnderstanding {
            clear_rephrasing_of_message: message.to_string(),
            what_is_user_objective: format!("Answer: {}", message),
            ..Default::default()
        }))
    }
}

#[async_trait]
impl ConversationalResponder for MockAI {
    async fn respond(
        &self,
        raw_message: &str,
        _structured_message: &str,
        rationale: &str,
    ) -> Result<String> {
        self.record(MockAICall::Respond {
            raw_message: raw_message.to_string(),
            rationale: rationale.to_string(),
        });

        Ok(format!("You asked \"{}\". {}", raw_message, rationale))
    }
}

#[async_trait]
impl IcoExtractor for MockAI {
    async fn extract_ico(&self, text: &str) -> Result<IcoTriple> {
        self.record(MockAICall::ExtractIco {
            text_len: text.len(),
        });

        let icos = self.icos.read().unwrap();
        let found = icos
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, ico)| ico.clone());

        Ok(found.unwrap_or_else(|| IcoTriple::new("unknown intervention", "placebo", "unknown outcome")))
    }
}

#[async_trait]
impl ReferenceExtractor for MockAI {
    async fn extract_references(&self, text: &str) -> Result<Vec<String>> {
        self.record(MockAICall::ExtractReferences {
            text_len: text.len(),
        });

        let by_text = self.references_by_text.read().unwrap();
        let found = by_text
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, references)| references.clone());

        Ok(found.unwrap_or_else(|| self.references.clone()))
    }
}

#[async_trait]
impl EvidenceGatherer for MockAI {
    async fn gather(&self, _document: &str, ico: &IcoTriple) -> Result<String> {
        self.record(MockAICall::Gather {
            intervention: ico.intervention.clone(),
        });
        Ok(self.evidence.clone())
    }
}

#[async_trait]
impl Embedder for MockAI {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.record(MockAICall::Embed {
            text: text.to_string(),
        });
        Ok(self.deterministic_embedding(text))
    }
}

#[async_trait]
impl OutcomeVerifier for MockAI {
    async fn infer(&self, _ico: &IcoTriple, related: &[ScoredRecord]) -> Result<SignificantChange> {
        self.record(MockAICall::Infer {
            related: related.len(),
        });
        Ok(self.conclusion)
    }
}
