//! Diff cache and loader.

mod cache;
mod diff_loader;

pub use cache::{DiffCache, SharedDiffCache};
pub use diff_loader::{DiffLoader, LoaderConfig};

use crate::model::ParsedDiff;
use crate::navigation::{ExpandedSkips, NavigableIndex};
use std::sync::Arc;

/// A parsed diff ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDiff {
    pub diff: ParsedDiff,
    /// Navigable items with every skip block collapsed.
    pub navigable: Arc<NavigableIndex>,
    /// Full new content, kept for skip block expansion.
    pub new_content: Option<Arc<str>>,
}

impl LoadedDiff {
    pub fn new(diff: ParsedDiff, new_content: Option<Arc<str>>) -> Self {
        let navigable = Arc::new(NavigableIndex::build(&diff, &ExpandedSkips::new()));
        Self {
            diff,
            navigable,
            new_content,
        }
    }

    pub fn empty() -> Self {
        Self::new(ParsedDiff::default(), None)
    }
}
