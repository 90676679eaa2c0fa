//! Syntax highlighting for diff content.

mod highlighter;

pub use highlighter::DiffHighlighter;
