//! Changed files and the tree order they are listed in.

use review_host::{ChangedFile, FileChangeStatus};
use std::cmp::Ordering;

/// A file changed by the pull request. Immutable once the session is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    /// Previous path (if renamed).
    pub previous_path: Option<String>,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    /// Cache key for the parsed diff.
    pub content_hash: String,
    /// Unified patch; `None` for binary or oversized files.
    pub patch: Option<String>,
}

impl FileEntry {
    /// Get the display name for the file (handles renames).
    pub fn display_name(&self) -> String {
        match &self.previous_path {
            Some(old) if old != &self.path => format!("{} → {}", old, self.path),
            _ => self.path.clone(),
        }
    }
}

impl From<ChangedFile> for FileEntry {
    fn from(file: ChangedFile) -> Self {
        Self {
            status: file.status.into(),
            path: file.filename,
            previous_path: file.previous_filename,
            additions: file.additions,
            deletions: file.deletions,
            content_hash: file.sha,
            patch: file.patch,
        }
    }
}

/// File status in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Changed,
}

impl FileStatus {
    /// Get a single-character representation.
    pub fn as_char(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Removed => 'D',
            FileStatus::Modified => 'M',
            FileStatus::Renamed => 'R',
            FileStatus::Changed => 'C',
        }
    }
}

impl From<FileChangeStatus> for FileStatus {
    fn from(status: FileChangeStatus) -> Self {
        match status {
            FileChangeStatus::Added | FileChangeStatus::Copied => FileStatus::Added,
            FileChangeStatus::Removed => FileStatus::Removed,
            FileChangeStatus::Modified => FileStatus::Modified,
            FileChangeStatus::Renamed => FileStatus::Renamed,
            FileChangeStatus::Changed | FileChangeStatus::Unchanged => FileStatus::Changed,
        }
    }
}

/// Compare two paths in file-tree order: at the first differing component a
/// directory sorts before a file, otherwise names compare alphabetically.
pub fn tree_order(a: &str, b: &str) -> Ordering {
    let mut left = a.split('/').peekable();
    let mut right = b.split('/').peekable();
    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => {
                let l_is_dir = left.peek().is_some();
                let r_is_dir = right.peek().is_some();
                let order = r_is_dir.cmp(&l_is_dir).then_with(|| l.cmp(r));
                if order != Ordering::Equal {
                    return order;
                }
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

/// Order files the way a directory tree lists them.
pub fn sort_as_tree(mut files: Vec<FileEntry>) -> Vec<FileEntry> {
    files.sort_by(|a, b| tree_order(&a.path, &b.path));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            previous_path: None,
            status: FileStatus::Modified,
            additions: 1,
            deletions: 0,
            content_hash: format!("sha-{path}"),
            patch: None,
        }
    }

    #[test]
    fn test_sort_directories_first() {
        let files = vec![
            entry("README.md"),
            entry("src/main.rs"),
            entry("Cargo.toml"),
            entry("src/model/diff.rs"),
            entry("src/lib.rs"),
        ];

        let paths: Vec<String> = sort_as_tree(files).into_iter().map(|f| f.path).collect();

        assert_eq!(
            paths,
            vec![
                "src/model/diff.rs",
                "src/lib.rs",
                "src/main.rs",
                "Cargo.toml",
                "README.md",
            ]
        );
    }

    #[test]
    fn test_tree_order_nested_directories() {
        assert_eq!(tree_order("a/b/c.rs", "a/z.rs"), Ordering::Less);
        assert_eq!(tree_order("a/z.rs", "a/b/c.rs"), Ordering::Greater);
        assert_eq!(tree_order("b/x.rs", "c.rs"), Ordering::Less);
        assert_eq!(tree_order("a.rs", "a.rs"), Ordering::Equal);
    }

    #[test]
    fn test_display_name_rename() {
        let mut file = entry("src/new.rs");
        assert_eq!(file.display_name(), "src/new.rs");

        file.previous_path = Some("src/old.rs".to_string());
        assert_eq!(file.display_name(), "src/old.rs → src/new.rs");
    }

    #[test]
    fn test_status_from_host() {
        assert_eq!(FileStatus::from(FileChangeStatus::Copied), FileStatus::Added);
        assert_eq!(FileStatus::from(FileChangeStatus::Unchanged), FileStatus::Changed);
        assert_eq!(FileStatus::Removed.as_char(), 'D');
    }
}
