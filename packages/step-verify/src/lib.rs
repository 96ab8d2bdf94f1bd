//! Step-Verified Reasoning Library
//!
//! Answers questions with a chain of thought whose every step is checked
//! by a classifier model before the answer is accepted, and builds an
//! evidence graph from clinical-trial documents.
//!
//! # Flow
//!
//! 1. Understand the user's message (rephrasing, intent, objective)
//! 2. Generate an answer plus rationale
//! 3. Split the rationale into steps at sentence boundaries
//! 4. Classify each step given the objective, question and previous step
//! 5. Any step not labelled `necessary_essential_valid` fails the rationale;
//!    regenerate with feedback until it passes or the attempt budget is spent
//! 6. Wrap the answer in a conversational reply
//!
//! # Usage
//!
//! ```rust,ignore
//! use llm_client::LlmClient;
//! use step_verify::{ai::LlmAdapter, Backtracker, VerifiedQa, VerifyConfig};
//!
//! let client = LlmClient::ollama();
//! let chat = LlmAdapter::new(client.clone(), "mistral:v0.2");
//! let verifier = LlmAdapter::new(client, "command-r:latest");
//!
//! let backtracker = Backtracker::new(chat.clone(), verifier, VerifyConfig::default())?;
//! let qa = VerifiedQa::new(chat.clone(), chat, backtracker);
//!
//! let outcome = qa.ask("Does aspirin reduce stroke risk?").await?;
//! println!("{}", outcome.reply);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Model and storage boundaries
//! - [`types`] - Steps, labels, verdicts, evidence records
//! - [`pipeline`] - Segmentation, verification, backtracking, evidence graph
//! - [`stores`] - Evidence storage implementations
//! - [`testing`] - Scripted implementations for testing

pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{Result, VerifyError};
pub use traits::{
    classifier::{ClassificationRequest, StepClassifier},
    conversation::{ConversationalResponder, MessageUnderstander},
    evidence::{EvidenceGatherer, Embedder, IcoExtractor, OutcomeVerifier, ReferenceExtractor},
    generator::{GenerationRequest, RationaleGenerator},
    store::{cosine_similarity, EvidenceStore},
};
pub use types::{
    config::{EvidenceConfig, LabelPolicy, VerifyConfig},
    evidence::{
        Comparison, EvidenceRecord, IcoTriple, OutcomeVerification, Reference, Relation,
        ScoredRecord, SignificantChange,
    },
    step::{Step, StepType, UnknownStepType},
    understanding::MessageUnderstanding,
    verdict::{
        Answer, ChainVerdict, RetrySignal, StepVerdict, VerificationStatus, VerifiedAnswer,
        RETRY_REASON,
    },
};

// Re-export pipeline components
pub use pipeline::{
    rationale_to_steps, split_segments, Backtracker, ChainVerifier, EvidenceAI, EvidenceGraph,
    QaOutcome, Segment, VerifiedQa,
};

// Re-export stores
pub use stores::MemoryEvidenceStore;

// Re-export testing utilities
pub use testing::{MockAI, ScriptedClassifier, ScriptedGenerator};
