//! Error types shared across the engine.

use thiserror::Error;

/// Errors that can occur during diff parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to parse diff: {0}")]
    ParseFailed(String),
    #[error("Invalid diff format")]
    InvalidFormat,
}

/// Errors produced while loading a file's diff.
///
/// `Clone` because one in-flight load is shared by every caller waiting on
/// the same content hash.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The load was superseded by a switch to another file.
    #[error("Load cancelled")]
    Cancelled,

    #[error("Failed to fetch file content: {0}")]
    Fetch(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The blocking parse task panicked or was aborted.
    #[error("Parse task failed: {0}")]
    Join(String),
}

impl LoadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

/// Errors that can occur when decoding a deep link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeepLinkError {
    #[error("Deep link has no file")]
    MissingFile,

    #[error("Malformed deep link parameter: {0}")]
    Malformed(String),

    #[error("Duplicate deep link parameter: {0}")]
    Duplicate(String),

    #[error("Unknown deep link parameter: {0}")]
    UnknownKey(String),

    #[error("Invalid line reference: {0}")]
    InvalidLine(String),

    #[error("Invalid comment id: {0}")]
    InvalidComment(String),

    #[error("Invalid pending comment id: {0}")]
    InvalidPending(String),

    #[error("Only one of L, comment or pending may be given")]
    ConflictingFocus,
}
