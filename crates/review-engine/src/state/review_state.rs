//! The immutable review session snapshot.
//!
//! Large slices live behind `Arc` so a reduction clones only what it
//! touches, and observers can compare slices by pointer.

use super::{ComposeTarget, DiffViewMode, EditTarget, Focus, GotoState};
use crate::deep_link::LinkFocus;
use crate::loader::LoadedDiff;
use crate::model::{Comment, FileEntry, LineRef, PendingComment, ReviewEvent, SessionKey};
use crate::navigation::{ExpandedSkips, NavigableIndex};
use crate::rows::LineAnnotations;
use review_host::{PullRequest, ReviewThread};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Diff of the selected file.
#[derive(Debug, Clone, Default)]
pub enum DiffLoadState {
    #[default]
    Idle,
    Loading {
        path: String,
    },
    Loaded {
        path: String,
        diff: Arc<LoadedDiff>,
    },
    Failed {
        path: String,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct ReviewState {
    pub key: SessionKey,
    pub pull_request: Option<PullRequest>,
    /// True until the session reads finish.
    pub loading: bool,
    /// Read failure; nothing is rendered while set.
    pub session_error: Option<String>,

    /// Changed files in tree display order.
    pub files: Arc<Vec<FileEntry>>,
    pub selected_file: Option<String>,

    pub focus: Focus,
    /// Other end of an inclusive line range; shares the focused line's side.
    pub selection_anchor: Option<LineRef>,
    pub commenting_on: Option<ComposeTarget>,
    pub editing: Option<EditTarget>,
    pub replying_to: Option<u64>,
    /// Goto prompt, when open.
    pub goto: Option<GotoState>,
    /// Link focus applied before the diff loaded; re-resolved once it arrives.
    pub pending_link: Option<LinkFocus>,
    pub diff_view_mode: DiffViewMode,

    pub diff: DiffLoadState,
    /// Navigable items of the selected file, including expanded skip blocks.
    pub navigable: Arc<NavigableIndex>,
    pub expanded_skips: Arc<ExpandedSkips>,

    pub viewed_files: Arc<BTreeSet<String>>,
    pub comments: Arc<Vec<Comment>>,
    pub threads: Arc<Vec<ReviewThread>>,
    pub pending_comments: Arc<Vec<PendingComment>>,
    /// Server-side pending review, once synced.
    pub pending_review_id: Option<u64>,
    pub review_body: String,
    pub review_event: ReviewEvent,

    /// Last failed write, until the next success or dismissal.
    pub write_error: Option<String>,
}

impl ReviewState {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            pull_request: None,
            loading: true,
            session_error: None,
            files: Arc::default(),
            selected_file: None,
            focus: Focus::None,
            selection_anchor: None,
            commenting_on: None,
            editing: None,
            replying_to: None,
            goto: None,
            pending_link: None,
            diff_view_mode: DiffViewMode::default(),
            diff: DiffLoadState::Idle,
            navigable: Arc::default(),
            expanded_skips: Arc::default(),
            viewed_files: Arc::default(),
            comments: Arc::default(),
            threads: Arc::default(),
            pending_comments: Arc::default(),
            pending_review_id: None,
            review_body: String::new(),
            review_event: ReviewEvent::default(),
            write_error: None,
        }
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        let path = self.selected_file.as_deref()?;
        self.file(path)
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// The parsed diff of the selected file, if it has arrived.
    pub fn loaded_diff(&self) -> Option<&Arc<LoadedDiff>> {
        match &self.diff {
            DiffLoadState::Loaded { path, diff } if self.selected_file.as_ref() == Some(path) => {
                Some(diff)
            }
            _ => None,
        }
    }

    pub fn is_viewed(&self, path: &str) -> bool {
        self.viewed_files.contains(path)
    }

    fn selected_position(&self) -> Option<usize> {
        let path = self.selected_file.as_deref()?;
        self.files.iter().position(|f| f.path == path)
    }

    /// The file after the selected one, or the first file when none is
    /// selected.
    pub fn next_file_path(&self) -> Option<&str> {
        let next = self.selected_position().map_or(0, |i| i + 1);
        self.files.get(next).map(|f| f.path.as_str())
    }

    pub fn previous_file_path(&self) -> Option<&str> {
        let previous = self.selected_position()?.checked_sub(1)?;
        self.files.get(previous).map(|f| f.path.as_str())
    }

    /// First unviewed file after the selection, wrapping around.
    pub fn next_unviewed_file_path(&self) -> Option<&str> {
        let start = self.selected_position().map_or(0, |i| i + 1);
        let len = self.files.len();
        (0..len)
            .map(|offset| &self.files[(start + offset) % len])
            .find(|f| !self.is_viewed(&f.path) && Some(&f.path) != self.selected_file.as_ref())
            .map(|f| f.path.as_str())
    }

    /// Inclusive `(start, end)` of the selected range on the focused side.
    pub fn selection_range(&self) -> Option<(LineRef, LineRef)> {
        let focused = self.focus.focused_line()?;
        let anchor = self.selection_anchor.unwrap_or(focused);
        if anchor.side != focused.side {
            return None;
        }
        Some(if anchor.line <= focused.line {
            (anchor, focused)
        } else {
            (focused, anchor)
        })
    }

    /// Comments of the selected file grouped by line.
    pub fn annotations(&self) -> LineAnnotations {
        match self.selected_file.as_deref() {
            Some(path) => LineAnnotations::build(path, &self.comments, &self.pending_comments),
            None => LineAnnotations::default(),
        }
    }

    pub fn comment(&self, id: u64) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn pending_comment(&self, id: uuid::Uuid) -> Option<&PendingComment> {
        self.pending_comments.iter().find(|c| c.id == id)
    }
}
