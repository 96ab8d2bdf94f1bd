//! In-memory evidence graph.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::store::{cosine_similarity, EvidenceStore};
use crate::types::evidence::{normalize_intervention, EvidenceRecord, ScoredRecord};

/// In-memory evidence graph keyed by normalised intervention name.
///
/// Useful for testing and CLI runs. Persist with [`MemoryEvidenceStore::to_json`].
#[derive(Default)]
pub struct MemoryEvidenceStore {
    records: RwLock<HashMap<String, EvidenceRecord>>,
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild a store from saved records, merging duplicates.
    pub fn from_records(records: impl IntoIterator<Item = EvidenceRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap();
            for record in records {
                merge_into(&mut map, record);
            }
        }
        store
    }

    /// Serialize every record as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        let records: Vec<EvidenceRecord> = self.records.read().unwrap().values().cloned().collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Load a store saved with [`MemoryEvidenceStore::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<EvidenceRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }
}

fn merge_into(
    records: &mut HashMap<String, EvidenceRecord>,
    record: EvidenceRecord,
) -> &EvidenceRecord {
    match records.entry(record.ico.intervention_key()) {
        Entry::Occupied(entry) => {
            let existing = entry.into_mut();
            existing.merge(record);
            existing
        }
        Entry::Vacant(entry) => entry.insert(record),
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn merge_record(&self, record: EvidenceRecord) -> Result<EvidenceRecord> {
        let mut records = self.records.write().unwrap();
        Ok(merge_into(&mut records, record).clone())
    }

    async fn get_record(&self, intervention: &str) -> Result<Option<EvidenceRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&normalize_intervention(intervention))
            .cloned())
    }

    async fn search_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>> {
        let records = self.records.read().unwrap();

        let mut scored: Vec<_> = records
            .values()
            .map(|record| ScoredRecord {
                score: cosine_similarity(embedding, &record.embedding),
                record: record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn records(&self) -> Result<Vec<EvidenceRecord>> {
        Ok(self.records.read().unwrap().values().cloned().collect())
    }
}
