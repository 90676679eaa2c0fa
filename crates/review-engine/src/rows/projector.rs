//! Flattening of the selected file into display rows.

use super::threads::LineAnnotations;
use crate::loader::LoadedDiff;
use crate::model::{Comment, DiffSegment, LineKind, LineRef, PendingComment};
use crate::navigation::{ExpandedSkips, LineItem};
use crate::state::{ComposeTarget, ReviewState};
use review_host::ReviewThread;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Where a line row's content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSource {
    /// `diff.segments[segment]` is a hunk; `line` indexes its lines.
    Hunk { segment: usize, line: usize },
    /// Line `line` of expanded skip block `skip`.
    Expanded { skip: usize, line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Line {
        kind: LineKind,
        old_line: Option<u32>,
        new_line: Option<u32>,
        source: LineSource,
    },
    /// Collapsed skip block.
    Skip { index: usize, count: u32 },
    /// Separator shown above the lines of an expanded skip block.
    SkipSpacer { index: usize, count: u32 },
    Thread {
        root_id: u64,
        comment_ids: Vec<u64>,
        resolved: bool,
        thread_id: Option<String>,
    },
    PendingItem { id: Uuid },
    Compose {
        line: LineRef,
        start_line: Option<u32>,
    },
}

/// Stable identity of a row for keyed reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Line(LineSource),
    Skip(usize),
    SkipSpacer(usize),
    Thread(u64),
    Pending(Uuid),
    Compose,
}

impl Row {
    pub fn key(&self) -> RowKey {
        match self {
            Row::Line { source, .. } => RowKey::Line(*source),
            Row::Skip { index, .. } => RowKey::Skip(*index),
            Row::SkipSpacer { index, .. } => RowKey::SkipSpacer(*index),
            Row::Thread { root_id, .. } => RowKey::Thread(*root_id),
            Row::PendingItem { id } => RowKey::Pending(*id),
            Row::Compose { .. } => RowKey::Compose,
        }
    }

    fn line_item(&self) -> Option<LineItem> {
        match self {
            Row::Line {
                kind,
                old_line,
                new_line,
                ..
            } => Some(LineItem {
                kind: *kind,
                old_line: *old_line,
                new_line: *new_line,
            }),
            _ => None,
        }
    }
}

/// Keys of rows that were added, changed or removed between two projections.
pub fn changed_rows(old: &[Row], new: &[Row]) -> Vec<RowKey> {
    let before: HashMap<RowKey, &Row> = old.iter().map(|r| (r.key(), r)).collect();
    let after: HashSet<RowKey> = new.iter().map(Row::key).collect();

    let mut changed: Vec<RowKey> = new
        .iter()
        .filter(|row| before.get(&row.key()) != Some(row))
        .map(Row::key)
        .collect();
    changed.extend(
        old.iter()
            .map(Row::key)
            .filter(|key| !after.contains(key)),
    );
    changed
}

/// Everything rows are derived from.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub path: &'a str,
    pub diff: &'a LoadedDiff,
    pub comments: &'a [Comment],
    pub threads: &'a [ReviewThread],
    pub pending: &'a [PendingComment],
    pub expanded: &'a ExpandedSkips,
    pub commenting_on: Option<ComposeTarget>,
}

/// Derive the rows of one file.
///
/// Each line is followed by the compose form (when it targets that line),
/// then its comment threads, then its pending comments.
pub fn project_rows(input: &ProjectionInput<'_>) -> Vec<Row> {
    let annotations = LineAnnotations::build(input.path, input.comments, input.pending);
    let resolution: HashMap<u64, (&str, bool)> = input
        .threads
        .iter()
        .filter_map(|t| {
            t.comment_ids
                .first()
                .map(|root| (*root, (t.id.as_str(), t.is_resolved)))
        })
        .collect();

    let mut rows = Vec::new();
    let push_line = |rows: &mut Vec<Row>, row: Row| {
        let item = row.line_item();
        rows.push(row);
        let Some(item) = item else {
            return;
        };
        if let Some(target) = input.commenting_on {
            if item.refs().any(|r| r == target.line) {
                rows.push(Row::Compose {
                    line: target.line,
                    start_line: target.start_line,
                });
            }
        }
        for thread in annotations.item_threads(&item) {
            let (thread_id, resolved) = match resolution.get(&thread.root_id) {
                Some((id, resolved)) => (Some(id.to_string()), *resolved),
                None => (None, false),
            };
            rows.push(Row::Thread {
                root_id: thread.root_id,
                comment_ids: thread.comment_ids.clone(),
                resolved,
                thread_id,
            });
        }
        for id in annotations.item_pending(&item) {
            rows.push(Row::PendingItem { id });
        }
    };

    for (segment_index, segment) in input.diff.diff.segments.iter().enumerate() {
        match segment {
            DiffSegment::Hunk(hunk) => {
                for (line_index, line) in hunk.lines.iter().enumerate() {
                    push_line(
                        &mut rows,
                        Row::Line {
                            kind: line.kind,
                            old_line: line.old_line,
                            new_line: line.new_line,
                            source: LineSource::Hunk {
                                segment: segment_index,
                                line: line_index,
                            },
                        },
                    );
                }
            }
            DiffSegment::Skip(skip) => match input.expanded.get(&skip.index) {
                Some(lines) => {
                    rows.push(Row::SkipSpacer {
                        index: skip.index,
                        count: skip.count,
                    });
                    for (line_index, line) in lines.iter().enumerate() {
                        push_line(
                            &mut rows,
                            Row::Line {
                                kind: line.kind,
                                old_line: line.old_line,
                                new_line: line.new_line,
                                source: LineSource::Expanded {
                                    skip: skip.index,
                                    line: line_index,
                                },
                            },
                        );
                    }
                }
                None => rows.push(Row::Skip {
                    index: skip.index,
                    count: skip.count,
                }),
            },
        }
    }

    rows
}

struct Memo {
    path: String,
    diff: Arc<LoadedDiff>,
    comments: Arc<Vec<Comment>>,
    threads: Arc<Vec<ReviewThread>>,
    pending: Arc<Vec<PendingComment>>,
    expanded: Arc<ExpandedSkips>,
    commenting_on: Option<ComposeTarget>,
    rows: Arc<Vec<Row>>,
}

impl Memo {
    fn matches(&self, path: &str, diff: &Arc<LoadedDiff>, state: &ReviewState) -> bool {
        self.path == path
            && Arc::ptr_eq(&self.diff, diff)
            && Arc::ptr_eq(&self.comments, &state.comments)
            && Arc::ptr_eq(&self.threads, &state.threads)
            && Arc::ptr_eq(&self.pending, &state.pending_comments)
            && Arc::ptr_eq(&self.expanded, &state.expanded_skips)
            && self.commenting_on == state.commenting_on
    }
}

/// Memoized projection over store snapshots.
///
/// Rows are recomputed only when one of the inputs is a different
/// allocation than last time; focus changes reuse the previous rows.
#[derive(Default)]
pub struct RowProjector {
    memo: Option<Memo>,
    recomputed: usize,
}

impl RowProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for the selected file, empty until its diff is loaded.
    pub fn project(&mut self, state: &ReviewState) -> Arc<Vec<Row>> {
        let (Some(path), Some(diff)) = (state.selected_file.as_deref(), state.loaded_diff())
        else {
            return Arc::default();
        };

        if let Some(memo) = &self.memo {
            if memo.matches(path, diff, state) {
                return memo.rows.clone();
            }
        }

        let rows = Arc::new(project_rows(&ProjectionInput {
            path,
            diff,
            comments: &state.comments,
            threads: &state.threads,
            pending: &state.pending_comments,
            expanded: &state.expanded_skips,
            commenting_on: state.commenting_on,
        }));
        self.recomputed += 1;
        self.memo = Some(Memo {
            path: path.to_string(),
            diff: diff.clone(),
            comments: state.comments.clone(),
            threads: state.threads.clone(),
            pending: state.pending_comments.clone(),
            expanded: state.expanded_skips.clone(),
            commenting_on: state.commenting_on,
            rows: rows.clone(),
        });
        rows
    }

    /// How many times rows were actually recomputed.
    pub fn recompute_count(&self) -> usize {
        self.recomputed
    }
}
