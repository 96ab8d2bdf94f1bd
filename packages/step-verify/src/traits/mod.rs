//! Core trait abstractions for the step-verify library.
//!
//! Each model capability gets its own narrow trait so the verification loop
//! depends on nothing but [`classifier::StepClassifier`], and adapters for a
//! given provider implement only what they support.

pub mod classifier;
pub mod conversation;
pub mod evidence;
pub mod generator;
pub mod store;
