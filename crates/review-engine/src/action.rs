//! Review Session Actions
//!
//! The closed set of named mutations the store accepts. Controllers translate
//! input and collaborator results into actions and dispatch them; nothing
//! else mutates the session.

use crate::deep_link::LinkFocus;
use crate::loader::LoadedDiff;
use crate::model::{Comment, DiffLine, FileEntry, LineRef, PendingComment, ReviewEvent};
use crate::navigation::NavRequest;
use crate::state::{DiffViewMode, EditTarget};
use review_host::{PullRequest, ReviewThread};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ReviewAction {
    // === Session ===
    /// Initial reads finished. `files` are already in tree order.
    SessionLoaded {
        pull_request: PullRequest,
        files: Vec<FileEntry>,
        comments: Vec<Comment>,
        threads: Vec<ReviewThread>,
    },
    SessionLoadFailed(String),

    // === Files ===
    /// Select a file. `loaded` carries a cache hit so it shows without a
    /// loading state.
    SelectFile {
        path: String,
        loaded: Option<Arc<LoadedDiff>>,
    },
    ToggleViewed(String),

    // === Focus ===
    SetFocusedLine(LineRef),
    /// Start (or drop) a range at the focused line.
    SetSelectionAnchor(Option<LineRef>),
    /// Select `start..=end`; both ends must be on the same side.
    SelectLineRange {
        start: LineRef,
        end: LineRef,
    },
    FocusSkipBlock(usize),
    FocusComment(u64),
    FocusPendingComment(Uuid),
    ClearFocus,
    Navigate(NavRequest),

    // === Commenting ===
    /// Open the compose form on the focused line or range.
    StartCommenting,
    CancelCommenting,
    AddPendingComment(PendingComment),
    UpdatePendingComment {
        id: Uuid,
        body: String,
    },
    RemovePendingComment(Uuid),
    /// A pending comment was posted and replaced by its server comment.
    PendingCommentPublished {
        pending_id: Uuid,
        comment: Comment,
    },

    // === Server comments ===
    SetComments(Vec<Comment>),
    SetThreads(Vec<ReviewThread>),
    CommentPosted(Comment),
    CommentUpdated(Comment),
    CommentDeleted(u64),

    // === Editing / replying ===
    StartEditing(EditTarget),
    StopEditing,
    StartReplying(u64),
    StopReplying,

    // === Threads ===
    ResolveThread(String),
    UnresolveThread(String),

    // === View / goto ===
    SetDiffViewMode(DiffViewMode),
    EnterGotoMode,
    ExitGotoMode,
    GotoInput(char),
    GotoBackspace,
    ToggleGotoSide,
    /// Jump to the closest navigable line and close the prompt.
    CommitGoto,

    // === Review submission ===
    SetReviewBody(String),
    SetReviewEvent(ReviewEvent),
    /// The review was submitted; the listed pending comments went with it.
    ReviewSubmitted {
        submitted: Vec<Uuid>,
    },

    // === Errors ===
    SetWriteError(String),
    DismissError,

    // === Diff lifecycle ===
    DiffLoaded {
        path: String,
        diff: Arc<LoadedDiff>,
    },
    DiffLoadFailed {
        path: String,
        error: String,
    },
    SkipBlockExpanded {
        path: String,
        index: usize,
        lines: Vec<DiffLine>,
    },

    // === Sync / links ===
    PendingReviewSynced {
        review_id: u64,
        /// Local pending id to server comment id.
        server_ids: Vec<(Uuid, u64)>,
    },
    /// Select `path` and apply `focus` as one step.
    ApplyDeepLink {
        path: String,
        focus: LinkFocus,
    },
}

impl ReviewAction {
    pub fn select_file(path: impl Into<String>) -> Self {
        ReviewAction::SelectFile {
            path: path.into(),
            loaded: None,
        }
    }
}
