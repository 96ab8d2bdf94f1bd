//! Clinical-trial evidence types: ICO triples, references, stored records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Intervention, Comparator, Outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IcoTriple {
    /// Medical intervention described
    pub intervention: String,

    /// Comparator in the study
    pub comparator: String,

    /// Outcome of the intervention
    pub outcome: String,
}

impl IcoTriple {
    pub fn new(
        intervention: impl Into<String>,
        comparator: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            intervention: intervention.into(),
            comparator: comparator.into(),
            outcome: outcome.into(),
        }
    }

    /// Text that gets embedded for similarity search.
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.intervention, self.comparator, self.outcome)
    }

    /// Key used to merge records for the same intervention.
    pub fn intervention_key(&self) -> String {
        normalize_intervention(&self.intervention)
    }
}

impl fmt::Display for IcoTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Intervention: {}; Comparator: {}; Outcome: {}",
            self.intervention, self.comparator, self.outcome
        )
    }
}

/// Collapse whitespace and lowercase, so name variants merge.
pub fn normalize_intervention(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A citation or evidence passage attached to an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub text: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Relations an intervention node carries in the evidence graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    /// Intervention → Comparator
    ComparedWith,
    /// Intervention → Outcome
    LeadsTo,
    /// Intervention → Reference
    CitedIn,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::ComparedWith => "COMPARED_WITH",
            Relation::LeadsTo => "LEADS_TO",
            Relation::CitedIn => "CITED_IN",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparator/outcome pair reported for an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub comparator: String,
    pub outcome: String,
}

/// One intervention node with every comparator, outcome and reference
/// ingested for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,

    /// Triple from the document that created the node
    pub ico: IcoTriple,

    pub embedding: Vec<f32>,

    /// Distinct comparator/outcome pairs, in ingestion order
    #[serde(default)]
    pub comparisons: Vec<Comparison>,

    /// Distinct references, ids `ref0..refN` in ingestion order
    pub references: Vec<Reference>,

    /// Time of the latest merge
    pub ingested_at: DateTime<Utc>,
}

impl EvidenceRecord {
    pub fn new(ico: IcoTriple, embedding: Vec<f32>, references: Vec<Reference>) -> Self {
        let comparisons = vec![Comparison {
            comparator: ico.comparator.clone(),
            outcome: ico.outcome.clone(),
        }];

        let mut record = Self {
            id: Uuid::now_v7(),
            ico,
            embedding,
            comparisons,
            references: Vec::new(),
            ingested_at: Utc::now(),
        };
        for reference in references {
            record.add_reference(reference.text);
        }
        record
    }

    /// Fold another record for the same intervention into this one.
    ///
    /// Comparisons and references accumulate; nothing already stored is
    /// replaced. The node keeps its id, triple and embedding.
    pub fn merge(&mut self, other: EvidenceRecord) {
        for comparison in other.comparisons {
            if !self.comparisons.contains(&comparison) {
                self.comparisons.push(comparison);
            }
        }
        for reference in other.references {
            self.add_reference(reference.text);
        }
        self.ingested_at = self.ingested_at.max(other.ingested_at);
    }

    /// Add a reference unless one with the same text exists. Returns its id.
    pub fn add_reference(&mut self, text: impl Into<String>) -> &str {
        let text = text.into();
        let position = match self.references.iter().position(|r| r.text == text) {
            Some(position) => position,
            None => {
                let id = format!("ref{}", self.references.len());
                self.references.push(Reference::new(id, text));
                self.references.len() - 1
            }
        };
        &self.references[position].id
    }

    /// Distinct edges as `(relation, target)` pairs.
    pub fn relations(&self) -> Vec<(Relation, String)> {
        let mut edges: Vec<(Relation, String)> = Vec::new();
        let mut push = |edge: (Relation, String)| {
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        };

        for comparison in &self.comparisons {
            push((Relation::ComparedWith, comparison.comparator.clone()));
            push((Relation::LeadsTo, comparison.outcome.clone()));
        }
        for reference in &self.references {
            push((Relation::CitedIn, reference.id.clone()));
        }
        edges
    }
}

/// A stored record with its similarity to a query embedding.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: EvidenceRecord,
    pub score: f32,
}

/// Conclusion about an outcome relative to the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignificantChange {
    SignificantIncrease,
    SignificantDecrease,
    NoSignificantDifference,
}

impl SignificantChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignificantChange::SignificantIncrease => "significant_increase",
            SignificantChange::SignificantDecrease => "significant_decrease",
            SignificantChange::NoSignificantDifference => "no_significant_difference",
        }
    }
}

impl fmt::Display for SignificantChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignificantChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "significant_increase" | "significantly_increased" => {
                Ok(SignificantChange::SignificantIncrease)
            }
            "significant_decrease" | "significantly_decreased" => {
                Ok(SignificantChange::SignificantDecrease)
            }
            "no_significant_difference" | "no_difference" => {
                Ok(SignificantChange::NoSignificantDifference)
            }
            _ => Err(format!("unknown outcome conclusion: {}", s)),
        }
    }
}

/// Outcome of checking a new document against stored evidence.
#[derive(Debug, Clone)]
pub struct OutcomeVerification {
    pub ico: IcoTriple,
    pub related: Vec<ScoredRecord>,
    pub conclusion: SignificantChange,
}
