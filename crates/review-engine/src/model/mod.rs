//! Data models for a review session.

mod comment;
mod diff;
mod file_tree;

pub use comment::{Comment, DiffSide, LineRef, PendingComment, ReviewEvent};
pub use diff::{DiffLine, DiffSegment, Hunk, LineKind, ParsedDiff, Rgb, Segment, SkipBlock};
pub use file_tree::{sort_as_tree, tree_order, FileEntry, FileStatus};

/// Identity of a review session, also the prefix of its storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl SessionKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// `{owner}-{repo}-{number}`
    pub fn storage_prefix(&self) -> String {
        format!("{}-{}-{}", self.owner, self.repo, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_prefix() {
        let key = SessionKey::new("acme", "widgets", 42);
        assert_eq!(key.storage_prefix(), "acme-widgets-42");
    }
}
