//! Comment-related data structures for PR reviews.

use chrono::{DateTime, Utc};
use review_host::{CommentSide, NewReviewComment, ReviewComment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use review_host::ReviewEvent;

/// Which side of the diff a line or comment is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// Old file (deletions side).
    Left,
    /// New file (additions side).
    Right,
}

impl DiffSide {
    pub fn opposite(&self) -> Self {
        match self {
            DiffSide::Left => DiffSide::Right,
            DiffSide::Right => DiffSide::Left,
        }
    }
}

impl From<CommentSide> for DiffSide {
    fn from(side: CommentSide) -> Self {
        match side {
            CommentSide::Left => DiffSide::Left,
            CommentSide::Right => DiffSide::Right,
        }
    }
}

impl From<DiffSide> for CommentSide {
    fn from(side: DiffSide) -> Self {
        match side {
            DiffSide::Left => CommentSide::Left,
            DiffSide::Right => CommentSide::Right,
        }
    }
}

/// A line addressed by its number on one side of the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRef {
    pub line: u32,
    pub side: DiffSide,
}

impl LineRef {
    pub fn new(line: u32, side: DiffSide) -> Self {
        Self { line, side }
    }

    pub fn right(line: u32) -> Self {
        Self::new(line, DiffSide::Right)
    }

    pub fn left(line: u32) -> Self {
        Self::new(line, DiffSide::Left)
    }
}

/// A server-confirmed review comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub path: String,
    /// Line the comment ends on; `None` for outdated comments and most replies.
    pub line: Option<u32>,
    pub start_line: Option<u32>,
    pub side: DiffSide,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Parent comment for replies.
    pub in_reply_to: Option<u64>,
}

impl Comment {
    /// The line this comment is anchored to, if it has one of its own.
    pub fn anchor(&self) -> Option<LineRef> {
        self.line.map(|line| LineRef::new(line, self.side))
    }
}

impl From<ReviewComment> for Comment {
    fn from(comment: ReviewComment) -> Self {
        Self {
            id: comment.id,
            path: comment.path,
            line: comment.line,
            start_line: comment.start_line,
            side: comment.side.map(DiffSide::from).unwrap_or(DiffSide::Right),
            body: comment.body,
            author: comment.author,
            created_at: comment.created_at,
            in_reply_to: comment.in_reply_to_id,
        }
    }
}

/// A pending (not yet submitted) review comment.
///
/// Pending comments are persisted locally as JSON, so the serialized shape is
/// part of the storage format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingComment {
    /// Unique identifier for this pending comment.
    pub id: Uuid,
    /// Server comment ID (set after syncing a pending review).
    #[serde(default)]
    pub server_id: Option<u64>,
    /// File path.
    pub path: String,
    /// Line number (in the respective file version).
    pub line: u32,
    /// For multi-line comments: starting line.
    #[serde(default)]
    pub start_line: Option<u32>,
    pub side: DiffSide,
    /// Comment body (markdown).
    pub body: String,
    /// Set when this is a reply that has not been posted yet.
    #[serde(default)]
    pub in_reply_to: Option<u64>,
    /// When the comment was created locally.
    pub created_at: DateTime<Utc>,
}

impl PendingComment {
    /// Create a new pending comment.
    pub fn new(path: impl Into<String>, line: LineRef, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id: None,
            path: path.into(),
            line: line.line,
            start_line: None,
            side: line.side,
            body: body.into(),
            in_reply_to: None,
            created_at: Utc::now(),
        }
    }

    /// Create a multi-line pending comment covering `start..=line`.
    pub fn range(
        path: impl Into<String>,
        start_line: u32,
        line: LineRef,
        body: impl Into<String>,
    ) -> Self {
        let mut comment = Self::new(path, line, body);
        if start_line != line.line {
            comment.start_line = Some(start_line);
        }
        comment
    }

    /// Create a pending reply to a server comment anchored at `line`.
    pub fn reply(
        path: impl Into<String>,
        line: LineRef,
        in_reply_to: u64,
        body: impl Into<String>,
    ) -> Self {
        let mut comment = Self::new(path, line, body);
        comment.in_reply_to = Some(in_reply_to);
        comment
    }

    pub fn anchor(&self) -> LineRef {
        LineRef::new(self.line, self.side)
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some()
    }

    /// Convert into the payload the code host expects.
    pub fn to_new_review_comment(&self) -> NewReviewComment {
        NewReviewComment {
            path: self.path.clone(),
            line: self.line,
            start_line: self.start_line,
            side: self.side.into(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_side_opposite() {
        assert_eq!(DiffSide::Left.opposite(), DiffSide::Right);
    }

    #[test]
    fn test_range_collapses_single_line() {
        let single = PendingComment::range("a.rs", 4, LineRef::right(4), "x");
        assert_eq!(single.start_line, None);

        let range = PendingComment::range("a.rs", 2, LineRef::right(4), "x");
        assert_eq!(range.start_line, Some(2));
        assert_eq!(range.to_new_review_comment().start_line, Some(2));
    }

    #[test]
    fn test_comment_without_side_defaults_right() {
        let comment = Comment::from(ReviewComment {
            id: 1,
            path: "a.rs".to_string(),
            line: Some(3),
            start_line: None,
            side: None,
            body: "hi".to_string(),
            author: "me".to_string(),
            created_at: Utc::now(),
            in_reply_to_id: None,
            pull_request_review_id: None,
        });
        assert_eq!(comment.anchor(), Some(LineRef::right(3)));
    }

    #[test]
    fn test_pending_comment_storage_format() {
        let pending = PendingComment::new("src/a.rs", LineRef::left(7), "typo");
        let json = serde_json::to_string(&pending).unwrap();
        assert!(json.contains("\"side\":\"left\""));

        let restored: PendingComment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pending);
    }
}
