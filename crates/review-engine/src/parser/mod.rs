//! Diff parsing.

mod unified;

pub use unified::UnifiedDiffParser;
