//! Collaborator traits the engine is instrumented with.

mod diff_parser;
mod history;

pub use diff_parser::DiffParser;
pub use history::{HistoryWriter, MemoryHistory};
