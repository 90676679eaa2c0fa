//! Trait for turning per-file patches into parsed diffs.

use crate::error::ParseError;
use crate::model::{DiffLine, ParsedDiff};

/// Parses a file's patch into hunks and skip blocks.
///
/// Implementations are pure: the loader calls them on a blocking thread and
/// drops the result if the load was superseded in the meantime.
///
/// # Example
///
/// ```ignore
/// let parser = UnifiedDiffParser::new();
/// let diff = parser.parse(&patch, "src/lib.rs", None, None, Some(&new_content))?;
/// println!("{} skip blocks", diff.skip_blocks().count());
/// ```
pub trait DiffParser: Send + Sync {
    /// Parse a unified patch.
    ///
    /// # Arguments
    /// * `patch` - The per-file unified patch (hunks only, as code hosts return it)
    /// * `filename` - Current path of the file, used to pick a syntax
    /// * `previous_filename` - Path before a rename
    /// * `old_content` - Full old content, when known
    /// * `new_content` - Full new content, when known; enables the trailing skip block
    fn parse(
        &self,
        patch: &str,
        filename: &str,
        previous_filename: Option<&str>,
        old_content: Option<&str>,
        new_content: Option<&str>,
    ) -> Result<ParsedDiff, ParseError>;

    /// Highlight `count` lines of `content` starting at 1-based `start_line`,
    /// returned as context lines numbered from `start_line` on both sides.
    fn highlight_range(
        &self,
        content: &str,
        filename: &str,
        start_line: u32,
        count: u32,
    ) -> Vec<DiffLine>;
}
