//! Evidence graph over clinical-trial documents.
//!
//! Ingest: extract ICO → extract references → gather evidence → embed → merge.
//! Verify: extract ICO → embed → similarity search → infer conclusion.

use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{
    evidence::{EvidenceGatherer, Embedder, IcoExtractor, OutcomeVerifier, ReferenceExtractor},
    store::EvidenceStore,
};
use crate::types::{
    config::EvidenceConfig,
    evidence::{EvidenceRecord, OutcomeVerification, Reference},
};

/// Everything the evidence graph needs from a model provider.
pub trait EvidenceAI:
    IcoExtractor + ReferenceExtractor + EvidenceGatherer + Embedder + OutcomeVerifier
{
}

impl<T> EvidenceAI for T where
    T: IcoExtractor + ReferenceExtractor + EvidenceGatherer + Embedder + OutcomeVerifier
{
}

/// Intervention nodes linked to comparators, outcomes and references.
pub struct EvidenceGraph<S: EvidenceStore, A: EvidenceAI> {
    store: S,
    ai: A,
    config: EvidenceConfig,
}

impl<S: EvidenceStore, A: EvidenceAI> EvidenceGraph<S, A> {
    pub fn new(store: S, ai: A) -> Self {
        Self {
            store,
            ai,
            config: EvidenceConfig::default(),
        }
    }

    pub fn with_config(store: S, ai: A, config: EvidenceConfig) -> Self {
        Self { store, ai, config }
    }

    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ai(&self) -> &A {
        &self.ai
    }

    /// Add one trial document to the graph.
    ///
    /// References get ids `ref0..refN` in citation order. A document with no
    /// extractable references stores its gathered evidence as `ref0`. When
    /// the intervention is already in the graph, the document's comparator,
    /// outcome and references are added to the existing node and numbered
    /// after the ones already there.
    pub async fn ingest(&self, text: &str) -> Result<EvidenceRecord> {
        let ico = self.ai.extract_ico(text).await?;
        debug!(intervention = %ico.intervention, "ICO extracted");

        let cited = self.ai.extract_references(text).await?;

        let evidence = if self.config.gather_evidence {
            self.ai.gather(text, &ico).await?
        } else {
            String::new()
        };

        let mut references: Vec<Reference> = cited
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .enumerate()
            .map(|(i, r)| Reference::new(format!("ref{}", i), r))
            .collect();

        if references.is_empty() && !evidence.trim().is_empty() {
            references.push(Reference::new("ref0", evidence.trim()));
        }

        let embedding = self.ai.embed(&ico.embedding_text()).await?;
        let record = self
            .store
            .merge_record(EvidenceRecord::new(ico, embedding, references))
            .await?;

        info!(
            intervention = %record.ico.intervention,
            references = record.references.len(),
            "Evidence ingested"
        );

        Ok(record)
    }

    /// Ingest documents in order, stopping at the first failure.
    pub async fn ingest_all<I, T>(&self, documents: I) -> Result<Vec<EvidenceRecord>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut records = Vec::new();
        for document in documents {
            records.push(self.ingest(document.as_ref()).await?);
        }
        Ok(records)
    }

    /// Check a new document's outcome claim against the stored evidence.
    pub async fn verify_outcome(&self, text: &str) -> Result<OutcomeVerification> {
        let ico = self.ai.extract_ico(text).await?;
        let embedding = self.ai.embed(&ico.embedding_text()).await?;
        let related = self
            .store
            .search_similar(&embedding, self.config.search_limit)
            .await?;

        debug!(related = related.len(), "Related evidence found");

        let conclusion = self.ai.infer(&ico, &related).await?;
        info!(
            intervention = %ico.intervention,
            conclusion = %conclusion,
            "Outcome verified"
        );

        Ok(OutcomeVerification {
            ico,
            related,
            conclusion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryEvidenceStore;
    use crate::testing::{MockAI, MockAICall};
    use crate::traits::store::EvidenceStore;
    use crate::types::evidence::{IcoTriple, Relation, SignificantChange};

    fn aspirin() -> IcoTriple {
        IcoTriple::new("Aspirin", "placebo", "stroke incidence")
    }

    #[tokio::test]
    async fn test_ingest_numbers_references() {
        let ai = MockAI::new()
            .with_ico("aspirin", aspirin())
            .with_references(vec!["Smith 2019".into(), "  ".into(), "Lee 2020".into()]);
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), ai);

        let record = graph.ingest("a trial of aspirin").await.unwrap();

        let ids: Vec<_> = record.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ref0", "ref1"]);
        assert_eq!(record.references[1].text, "Lee 2020");
        assert_eq!(graph.store().len(), 1);
    }

    #[tokio::test]
    async fn test_gathered_evidence_used_without_references() {
        let ai = MockAI::new()
            .with_ico("aspirin", aspirin())
            .with_evidence("- Stroke fell by 20%.\n");
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), ai);

        let record = graph.ingest("a trial of aspirin").await.unwrap();

        assert_eq!(record.references.len(), 1);
        assert_eq!(record.references[0].id, "ref0");
        assert_eq!(record.references[0].text, "- Stroke fell by 20%.");
    }

    #[tokio::test]
    async fn test_gathering_can_be_disabled() {
        let ai = MockAI::new().with_evidence("unused");
        let graph = EvidenceGraph::with_config(
            MemoryEvidenceStore::new(),
            ai,
            EvidenceConfig::default().with_gather_evidence(false),
        );

        let record = graph.ingest("text").await.unwrap();

        assert!(record.references.is_empty());
        assert!(!graph
            .ai()
            .calls()
            .iter()
            .any(|c| matches!(c, MockAICall::Gather { .. })));
    }

    #[tokio::test]
    async fn test_same_intervention_merges() {
        let ai = MockAI::new()
            .with_ico("first", aspirin())
            .with_ico("second", IcoTriple::new("aspirin ", "warfarin", "bleeding"))
            .with_references(vec!["Smith 2019".into()]);
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), ai);

        let first = graph.ingest("first trial").await.unwrap();
        let second = graph.ingest("second trial").await.unwrap();

        assert_eq!(graph.store().len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.ico.comparator, "placebo");
        assert_eq!(second.comparisons.len(), 2);
        assert_eq!(second.comparisons[1].comparator, "warfarin");
        assert_eq!(second.references.len(), 1);
    }

    #[tokio::test]
    async fn test_same_intervention_keeps_every_citation() {
        let ai = MockAI::new()
            .with_ico("first", aspirin())
            .with_ico("second", IcoTriple::new("aspirin", "warfarin", "bleeding"))
            .with_references_for("first", vec!["Smith 2019".into()])
            .with_references_for("second", vec!["Lee 2020".into(), "Smith 2019".into()]);
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), ai);

        graph
            .ingest_all(["first trial", "second trial"])
            .await
            .unwrap();

        let record = graph.store().get_record("aspirin").await.unwrap().unwrap();
        assert_eq!(
            record.references,
            vec![
                Reference::new("ref0", "Smith 2019"),
                Reference::new("ref1", "Lee 2020"),
            ]
        );

        let relations = record.relations();
        assert!(relations.contains(&(Relation::ComparedWith, "placebo".to_string())));
        assert!(relations.contains(&(Relation::ComparedWith, "warfarin".to_string())));
        assert!(relations.contains(&(Relation::LeadsTo, "stroke incidence".to_string())));
        assert!(relations.contains(&(Relation::LeadsTo, "bleeding".to_string())));
    }

    #[tokio::test]
    async fn test_verify_outcome_searches_store() {
        let ai = MockAI::new()
            .with_ico("aspirin", aspirin())
            .with_ico("statin", IcoTriple::new("statin", "placebo", "LDL"))
            .with_conclusion(SignificantChange::SignificantDecrease);
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), ai);

        graph
            .ingest_all(["aspirin trial", "statin trial"])
            .await
            .unwrap();
        let verification = graph.verify_outcome("new aspirin trial").await.unwrap();

        assert_eq!(verification.conclusion, SignificantChange::SignificantDecrease);
        assert_eq!(verification.related.len(), 2);
        assert_eq!(verification.related[0].record.ico.intervention, "Aspirin");
        assert!((verification.related[0].score - 1.0).abs() < 1e-5);
        assert!(matches!(
            graph.ai().calls().last(),
            Some(MockAICall::Infer { related: 2 })
        ));
    }

    #[tokio::test]
    async fn test_search_limit_bounds_related_evidence() {
        let ai = MockAI::new()
            .with_ico("aspirin", aspirin())
            .with_ico("statin", IcoTriple::new("statin", "placebo", "LDL"));
        let graph = EvidenceGraph::with_config(
            MemoryEvidenceStore::new(),
            ai,
            EvidenceConfig::default().with_search_limit(1),
        );

        graph
            .ingest_all(["aspirin trial", "statin trial"])
            .await
            .unwrap();
        let verification = graph.verify_outcome("new aspirin trial").await.unwrap();

        assert_eq!(verification.related.len(), 1);
        assert_eq!(verification.related[0].record.ico.intervention, "Aspirin");
    }

    #[tokio::test]
    async fn test_verify_outcome_with_empty_store() {
        let graph = EvidenceGraph::new(MemoryEvidenceStore::new(), MockAI::new());

        let verification = graph.verify_outcome("anything").await.unwrap();

        assert!(verification.related.is_empty());
        assert_eq!(
            verification.conclusion,
            SignificantChange::NoSignificantDifference
        );
    }
}
