//! Data types for step verification and evidence extraction.

pub mod config;
pub mod evidence;
pub mod step;
pub mod understanding;
pub mod verdict;
