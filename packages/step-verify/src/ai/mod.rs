//! Model adapters for the step-verify traits.
//!
//! Users can use these directly or implement the traits themselves.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{LlmAdapter, DEFAULT_EMBEDDING_MODEL};
