//! Evidence extraction boundaries.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::evidence::{IcoTriple, ScoredRecord, SignificantChange};

/// Extracts the Intervention/Comparator/Outcome triple from a trial text.
#[async_trait]
pub trait IcoExtractor: Send + Sync {
    async fn extract_ico(&self, text: &str) -> Result<IcoTriple>;
}

/// Extracts cited references from a trial text.
#[async_trait]
pub trait ReferenceExtractor: Send + Sync {
    async fn extract_references(&self, text: &str) -> Result<Vec<String>>;
}

/// Finds the passages of a document that support an ICO triple.
#[async_trait]
pub trait EvidenceGatherer: Send + Sync {
    async fn gather(&self, document: &str, ico: &IcoTriple) -> Result<String>;
}

/// Generates embeddings for semantic similarity search.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Concludes how the outcome changed given related stored evidence.
#[async_trait]
pub trait OutcomeVerifier: Send + Sync {
    async fn infer(&self, ico: &IcoTriple, related: &[ScoredRecord]) -> Result<SignificantChange>;
}
