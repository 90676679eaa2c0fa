//! Grouping of comments into threads anchored to lines.
//!
//! Both the row projector and navigation read comments through
//! [`LineAnnotations`], so the order rows are drawn in is the order the
//! cursor walks them.

use crate::model::{Comment, LineRef, PendingComment};
use crate::navigation::LineItem;
use crate::state::Focus;
use log::debug;
use std::collections::HashMap;
use uuid::Uuid;

/// A root comment plus its replies, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub root_id: u64,
    pub comment_ids: Vec<u64>,
    pub anchor: LineRef,
}

/// Something the cursor can rest on below a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentTarget {
    Comment(u64),
    Pending(Uuid),
}

impl CommentTarget {
    pub fn into_focus(self) -> Focus {
        match self {
            CommentTarget::Comment(id) => Focus::Comment(id),
            CommentTarget::Pending(id) => Focus::PendingComment(id),
        }
    }

    pub fn from_focus(focus: &Focus) -> Option<Self> {
        match focus {
            Focus::Comment(id) => Some(CommentTarget::Comment(*id)),
            Focus::PendingComment(id) => Some(CommentTarget::Pending(*id)),
            _ => None,
        }
    }
}

/// Threads and pending comments of one file, keyed by the line they sit on.
#[derive(Debug, Clone, Default)]
pub struct LineAnnotations {
    threads: HashMap<LineRef, Vec<CommentThread>>,
    pending: HashMap<LineRef, Vec<Uuid>>,
    owners: HashMap<CommentTarget, LineRef>,
}

impl LineAnnotations {
    /// Group the comments of `path`.
    ///
    /// Comments are walked in creation order. A comment without a reply
    /// parent starts a new thread keyed by its own id; a reply joins the
    /// thread its parent belongs to. Replies whose parent is unknown are
    /// dropped.
    pub fn build(path: &str, comments: &[Comment], pending: &[PendingComment]) -> Self {
        let mut annotations = Self::default();

        let mut sorted: Vec<&Comment> = comments.iter().filter(|c| c.path == path).collect();
        sorted.sort_by_key(|c| c.created_at);

        // comment id -> (anchor, thread position on that line)
        let mut thread_of: HashMap<u64, (LineRef, usize)> = HashMap::new();

        for comment in sorted {
            match comment.in_reply_to {
                None => {
                    let Some(anchor) = comment.anchor() else {
                        debug!("Comment {} has no line (outdated), not shown", comment.id);
                        continue;
                    };
                    let threads = annotations.threads.entry(anchor).or_default();
                    thread_of.insert(comment.id, (anchor, threads.len()));
                    threads.push(CommentThread {
                        root_id: comment.id,
                        comment_ids: vec![comment.id],
                        anchor,
                    });
                    annotations
                        .owners
                        .insert(CommentTarget::Comment(comment.id), anchor);
                }
                Some(parent) => {
                    let Some(&(anchor, position)) = thread_of.get(&parent) else {
                        debug!(
                            "Dropping orphaned reply {} (parent {} not found)",
                            comment.id, parent
                        );
                        continue;
                    };
                    if let Some(thread) = annotations
                        .threads
                        .get_mut(&anchor)
                        .and_then(|threads| threads.get_mut(position))
                    {
                        thread.comment_ids.push(comment.id);
                    }
                    thread_of.insert(comment.id, (anchor, position));
                    annotations
                        .owners
                        .insert(CommentTarget::Comment(comment.id), anchor);
                }
            }
        }

        for comment in pending.iter().filter(|p| p.path == path) {
            let anchor = comment.anchor();
            annotations.pending.entry(anchor).or_default().push(comment.id);
            annotations
                .owners
                .insert(CommentTarget::Pending(comment.id), anchor);
        }

        annotations
    }

    pub fn threads_at(&self, line: LineRef) -> &[CommentThread] {
        self.threads.get(&line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pending_at(&self, line: LineRef) -> &[Uuid] {
        self.pending.get(&line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Threads below a line, old side first.
    pub fn item_threads(&self, item: &LineItem) -> Vec<&CommentThread> {
        item.refs().flat_map(|r| self.threads_at(r)).collect()
    }

    /// Pending comments below a line, old side first.
    pub fn item_pending(&self, item: &LineItem) -> Vec<Uuid> {
        item.refs()
            .flat_map(|r| self.pending_at(r).iter().copied())
            .collect()
    }

    /// Cursor stops below a line: every thread (root, then replies), then
    /// pending comments.
    pub fn targets_for(&self, item: &LineItem) -> Vec<CommentTarget> {
        let mut targets: Vec<CommentTarget> = self
            .item_threads(item)
            .into_iter()
            .flat_map(|t| t.comment_ids.iter().map(|id| CommentTarget::Comment(*id)))
            .collect();
        targets.extend(self.item_pending(item).into_iter().map(CommentTarget::Pending));
        targets
    }

    /// The line a comment or pending comment is displayed under.
    pub fn owner_of(&self, target: CommentTarget) -> Option<LineRef> {
        self.owners.get(&target).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiffSide, LineKind};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn comment(id: u64, reply_to: Option<u64>, line: Option<u32>, minute: u32) -> Comment {
        Comment {
            id,
            path: "a.ts".to_string(),
            line,
            start_line: None,
            side: DiffSide::Right,
            body: format!("comment {id}"),
            author: "reviewer".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
            in_reply_to: reply_to,
        }
    }

    #[test]
    fn test_thread_grouping() {
        let comments = vec![
            comment(1, None, Some(5), 0),
            comment(2, Some(1), Some(5), 0),
            comment(3, None, Some(5), 0),
        ];

        let annotations = LineAnnotations::build("a.ts", &comments, &[]);
        let threads: Vec<Vec<u64>> = annotations
            .threads_at(LineRef::right(5))
            .iter()
            .map(|t| t.comment_ids.clone())
            .collect();

        assert_eq!(threads, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_replies_ordered_by_creation() {
        let comments = vec![
            comment(4, Some(1), None, 9),
            comment(1, None, Some(5), 1),
            comment(2, Some(1), None, 3),
        ];

        let annotations = LineAnnotations::build("a.ts", &comments, &[]);
        assert_eq!(annotations.threads_at(LineRef::right(5))[0].comment_ids, vec![1, 2, 4]);
        assert_eq!(
            annotations.owner_of(CommentTarget::Comment(4)),
            Some(LineRef::right(5))
        );
    }

    #[test]
    fn test_orphaned_reply_dropped() {
        let comments = vec![comment(1, None, Some(5), 0), comment(2, Some(99), Some(5), 1)];

        let annotations = LineAnnotations::build("a.ts", &comments, &[]);
        assert_eq!(annotations.threads_at(LineRef::right(5)).len(), 1);
        assert_eq!(annotations.owner_of(CommentTarget::Comment(2)), None);
    }

    #[test]
    fn test_other_files_ignored() {
        let mut other = comment(1, None, Some(5), 0);
        other.path = "b.ts".to_string();

        let annotations = LineAnnotations::build("a.ts", &[other], &[]);
        assert!(annotations.threads_at(LineRef::right(5)).is_empty());
    }

    #[test]
    fn test_targets_threads_then_pending() {
        let comments = vec![comment(1, None, Some(5), 0), comment(2, Some(1), None, 1)];
        let pending = PendingComment::new("a.ts", LineRef::right(5), "draft");

        let annotations = LineAnnotations::build("a.ts", &comments, std::slice::from_ref(&pending));
        let item = LineItem {
            kind: LineKind::Insert,
            old_line: None,
            new_line: Some(5),
        };

        assert_eq!(
            annotations.targets_for(&item),
            vec![
                CommentTarget::Comment(1),
                CommentTarget::Comment(2),
                CommentTarget::Pending(pending.id),
            ]
        );
    }
}
