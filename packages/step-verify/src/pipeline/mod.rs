//! Verification and evidence pipelines.
//!
//! - Segmentation of a rationale into steps
//! - Step-by-step verification against a classifier
//! - Bounded backtracking over regenerated answers
//! - Conversational question answering on top of the above
//! - Evidence graph ingest and outcome verification

pub mod backtrack;
pub mod evidence;
pub mod prompts;
pub mod qa;
pub mod segment;
pub mod verify;

pub use backtrack::Backtracker;
pub use evidence::{EvidenceAI, EvidenceGraph};
pub use prompts::{
    format_conversational_prompt, format_generate_prompt, format_outcome_prompt,
    format_retry_feedback, format_step_verification_prompt, format_understand_prompt,
    strip_termination,
};
pub use qa::{QaOutcome, VerifiedQa};
pub use segment::{rationale_to_steps, split_segments, Segment};
pub use verify::ChainVerifier;
