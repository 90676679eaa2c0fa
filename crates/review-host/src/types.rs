//! Code-host data transfer objects
//!
//! These types represent the data exchanged with the code host.
//! They are intentionally separate from the review engine's domain models
//! to keep this crate pure and reusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pull request as reported by the code host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 123)
    pub number: u64,

    /// PR title
    pub title: String,

    /// PR body/description
    #[serde(default)]
    pub body: Option<String>,

    /// Author's username
    pub author: String,

    /// HEAD commit SHA
    pub head_sha: String,

    /// BASE commit SHA
    pub base_sha: String,

    /// HEAD branch name (e.g., "feature/foo")
    #[serde(default)]
    pub head_branch: String,

    /// Base branch name (e.g., "main")
    #[serde(default)]
    pub base_branch: String,
}

/// Change status of a file in a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

/// A file changed by a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path after the change
    pub filename: String,

    /// Path before a rename
    #[serde(default)]
    pub previous_filename: Option<String>,

    pub status: FileChangeStatus,

    #[serde(default)]
    pub additions: u32,

    #[serde(default)]
    pub deletions: u32,

    #[serde(default)]
    pub changes: u32,

    /// Blob SHA of the new content, used as content hash
    pub sha: String,

    /// Unified patch (absent for binary or oversized files)
    #[serde(default)]
    pub patch: Option<String>,
}

/// Which side of the diff a comment is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentSide {
    /// Old file (deletions side)
    Left,
    /// New file (additions side)
    Right,
}

impl CommentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSide::Left => "LEFT",
            CommentSide::Right => "RIGHT",
        }
    }
}

/// A review comment on a pull request
///
/// Represents a comment on a specific line (or line range) in a PR diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    /// Comment ID
    pub id: u64,
    /// File path the comment is on
    pub path: String,
    /// Line number the comment ends on (None when outdated)
    #[serde(default)]
    pub line: Option<u32>,
    /// First line of a multi-line comment
    #[serde(default)]
    pub start_line: Option<u32>,
    /// Which side of the diff; replies usually omit it
    #[serde(default)]
    pub side: Option<CommentSide>,
    /// Comment body text
    pub body: String,
    /// Author's username
    pub author: String,
    /// When the comment was created
    pub created_at: DateTime<Utc>,
    /// Parent comment for replies
    #[serde(default)]
    pub in_reply_to_id: Option<u64>,
    /// Review this comment belongs to
    #[serde(default)]
    pub pull_request_review_id: Option<u64>,
}

/// A review thread with its resolution state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewThread {
    /// Opaque thread identifier
    pub id: String,
    pub is_resolved: bool,
    /// Comment IDs in the thread, root first
    pub comment_ids: Vec<u64>,
}

/// A comment to be created on the code host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReviewComment {
    pub path: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    pub side: CommentSide,
    pub body: String,
}

/// A server-side pending (unsubmitted) review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReview {
    pub id: u64,
    /// Server IDs of the review comments, in the order they were sent
    pub comment_ids: Vec<u64>,
}

/// Review event type for PR reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    /// Approve the PR
    Approve,
    /// Request changes
    RequestChanges,
    /// Comment only (no approval/rejection)
    #[default]
    Comment,
}

impl ReviewEvent {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewEvent::Approve => "APPROVE",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
            ReviewEvent::Comment => "COMMENT",
        }
    }

    /// Cycle to the next option (Comment → Approve → RequestChanges → Comment)
    pub fn next(&self) -> Self {
        match self {
            ReviewEvent::Comment => ReviewEvent::Approve,
            ReviewEvent::Approve => ReviewEvent::RequestChanges,
            ReviewEvent::RequestChanges => ReviewEvent::Comment,
        }
    }
}
