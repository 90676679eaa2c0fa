//! Review session state and the small value types it is made of.

mod review_state;

pub use review_state::{DiffLoadState, ReviewState};

use crate::model::{DiffSide, LineRef};
use review_config::DiffViewModeSetting;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the cursor rests on. At most one target at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Focus {
    #[default]
    None,
    Line(LineRef),
    SkipBlock(usize),
    Comment(u64),
    PendingComment(Uuid),
}

impl Focus {
    pub fn focused_line(&self) -> Option<LineRef> {
        match self {
            Focus::Line(line) => Some(*line),
            _ => None,
        }
    }

    pub fn focused_skip_block(&self) -> Option<usize> {
        match self {
            Focus::SkipBlock(index) => Some(*index),
            _ => None,
        }
    }

    pub fn focused_comment_id(&self) -> Option<u64> {
        match self {
            Focus::Comment(id) => Some(*id),
            _ => None,
        }
    }

    pub fn focused_pending_comment_id(&self) -> Option<Uuid> {
        match self {
            Focus::PendingComment(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Focus::None)
    }
}

/// Diff layout. Persisted process-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffViewMode {
    #[default]
    Unified,
    Split,
}

impl DiffViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffViewMode::Unified => "unified",
            DiffViewMode::Split => "split",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DiffViewMode::Unified => DiffViewMode::Split,
            DiffViewMode::Split => DiffViewMode::Unified,
        }
    }
}

impl From<DiffViewModeSetting> for DiffViewMode {
    fn from(setting: DiffViewModeSetting) -> Self {
        match setting {
            DiffViewModeSetting::Unified => DiffViewMode::Unified,
            DiffViewModeSetting::Split => DiffViewMode::Split,
        }
    }
}

/// The line (or range) a new comment is being composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeTarget {
    pub line: LineRef,
    /// First line of a multi-line range on the same side.
    pub start_line: Option<u32>,
}

/// A comment whose body is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Comment(u64),
    Pending(Uuid),
}

/// Goto-line prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoState {
    /// Digits typed so far.
    pub input: String,
    pub side: DiffSide,
}

impl Default for GotoState {
    fn default() -> Self {
        Self {
            input: String::new(),
            side: DiffSide::Right,
        }
    }
}
