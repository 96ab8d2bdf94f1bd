//! Evidence store implementations.

pub mod memory;

pub use memory::MemoryEvidenceStore;
