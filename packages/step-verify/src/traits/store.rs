//! Storage trait for the evidence graph.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::evidence::{EvidenceRecord, ScoredRecord};

/// Evidence graph storage.
///
/// Records are keyed by normalised intervention name; storing a record for
/// an intervention that already exists merges into it.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Insert or merge a record. Returns the stored (possibly merged) record.
    async fn merge_record(&self, record: EvidenceRecord) -> Result<EvidenceRecord>;

    /// Look up by intervention name (normalised the same way as on merge).
    async fn get_record(&self, intervention: &str) -> Result<Option<EvidenceRecord>>;

    /// Records sorted by cosine similarity to `embedding`, highest first.
    async fn search_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>>;

    /// Every stored record, in no particular order.
    async fn records(&self) -> Result<Vec<EvidenceRecord>>;
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
