//! Pure state transitions for [`ReviewAction`]s.
//!
//! `reduce` never mutates its input and never dispatches further actions.
//! Slices that an action does not touch keep their `Arc`, which is what the
//! store uses to decide what to persist.

use crate::action::ReviewAction;
use crate::deep_link::LinkFocus;
use crate::model::{DiffLine, LineRef, PendingComment};
use crate::navigation::{closest_line, navigate, NavContext, NavigableIndex};
use crate::rows::CommentTarget;
use crate::state::{ComposeTarget, DiffLoadState, EditTarget, Focus, GotoState, ReviewState};
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Longest goto input accepted; keeps the number inside `u32`.
const MAX_GOTO_DIGITS: usize = 9;

pub fn reduce(state: &ReviewState, action: &ReviewAction) -> ReviewState {
    let mut next = state.clone();

    match action {
        // === Session ===
        ReviewAction::SessionLoaded {
            pull_request,
            files,
            comments,
            threads,
        } => {
            next.pull_request = Some(pull_request.clone());
            next.files = Arc::new(files.clone());
            next.comments = Arc::new(comments.clone());
            next.threads = Arc::new(threads.clone());
            next.loading = false;
            next.session_error = None;
        }
        ReviewAction::SessionLoadFailed(error) => {
            next.loading = false;
            next.session_error = Some(error.clone());
        }

        // === Files ===
        ReviewAction::SelectFile { path, loaded } => {
            if state.file(path).is_none() {
                debug!("Ignoring selection of unknown file {path}");
                return next;
            }
            select_file(&mut next, path);
            if let Some(diff) = loaded {
                if next.loaded_diff().is_none() {
                    next.diff = DiffLoadState::Loaded {
                        path: path.clone(),
                        diff: diff.clone(),
                    };
                    rebuild_navigable(&mut next);
                }
            }
        }
        ReviewAction::ToggleViewed(path) => {
            if state.file(path).is_some() {
                let mut viewed: BTreeSet<String> = (*state.viewed_files).clone();
                if !viewed.remove(path) {
                    viewed.insert(path.clone());
                }
                next.viewed_files = Arc::new(viewed);
            }
        }

        // === Focus ===
        ReviewAction::SetFocusedLine(line) => {
            next.focus = Focus::Line(*line);
            next.selection_anchor = state.selection_anchor.filter(|a| a.side == line.side);
        }
        ReviewAction::SetSelectionAnchor(anchor) => match (anchor, state.focus) {
            (None, _) => next.selection_anchor = None,
            (Some(anchor), Focus::Line(focused)) => {
                if anchor.side == focused.side {
                    next.selection_anchor = Some(*anchor);
                }
            }
            (Some(anchor), _) => {
                next.focus = Focus::Line(*anchor);
                next.selection_anchor = Some(*anchor);
            }
        },
        ReviewAction::SelectLineRange { start, end } => {
            if start.side == end.side {
                next.focus = Focus::Line(*end);
                next.selection_anchor = Some(*start);
            }
        }
        ReviewAction::FocusSkipBlock(index) => set_focus(&mut next, Focus::SkipBlock(*index)),
        ReviewAction::FocusComment(id) => set_focus(&mut next, Focus::Comment(*id)),
        ReviewAction::FocusPendingComment(id) => {
            set_focus(&mut next, Focus::PendingComment(*id))
        }
        ReviewAction::ClearFocus => set_focus(&mut next, Focus::None),
        ReviewAction::Navigate(request) => {
            let annotations = state.annotations();
            let ctx = NavContext {
                index: &state.navigable,
                annotations: &annotations,
                view_mode: state.diff_view_mode,
            };
            if let Some(outcome) = navigate(&ctx, &state.focus, state.selection_anchor, *request) {
                next.focus = outcome.focus;
                next.selection_anchor = outcome.anchor;
            }
        }

        // === Commenting ===
        ReviewAction::StartCommenting => {
            if let Some((start, end)) = state.selection_range() {
                next.commenting_on = Some(ComposeTarget {
                    line: end,
                    start_line: (start != end).then_some(start.line),
                });
                next.editing = None;
                next.replying_to = None;
            }
        }
        ReviewAction::CancelCommenting => next.commenting_on = None,
        ReviewAction::AddPendingComment(comment) => {
            let mut pending = (*state.pending_comments).clone();
            pending.push(comment.clone());
            next.pending_comments = Arc::new(pending);
            next.commenting_on = None;
            next.replying_to = None;
            set_focus(&mut next, Focus::PendingComment(comment.id));
        }
        ReviewAction::UpdatePendingComment { id, body } => {
            if state.pending_comment(*id).is_some() {
                let pending = state
                    .pending_comments
                    .iter()
                    .map(|c| {
                        if c.id == *id {
                            PendingComment {
                                body: body.clone(),
                                ..c.clone()
                            }
                        } else {
                            c.clone()
                        }
                    })
                    .collect();
                next.pending_comments = Arc::new(pending);
            }
            if state.editing == Some(EditTarget::Pending(*id)) {
                next.editing = None;
            }
        }
        ReviewAction::RemovePendingComment(id) => {
            if let Some(removed) = state.pending_comment(*id).cloned() {
                next.pending_comments = Arc::new(without_pending(&state.pending_comments, &[*id]));
                if state.editing == Some(EditTarget::Pending(*id)) {
                    next.editing = None;
                }
                return_focus_to(&mut next, &removed.path, removed.anchor());
            }
        }
        ReviewAction::PendingCommentPublished {
            pending_id,
            comment,
        } => {
            next.pending_comments =
                Arc::new(without_pending(&state.pending_comments, &[*pending_id]));
            if state.comment(comment.id).is_none() {
                let mut comments = (*state.comments).clone();
                comments.push(comment.clone());
                next.comments = Arc::new(comments);
            }
            if state.focus == Focus::PendingComment(*pending_id) {
                next.focus = Focus::Comment(comment.id);
            }
            if state.editing == Some(EditTarget::Pending(*pending_id)) {
                next.editing = None;
            }
            next.write_error = None;
        }

        // === Server comments ===
        ReviewAction::SetComments(comments) => {
            next.comments = Arc::new(comments.clone());
            if let Focus::Comment(id) = state.focus {
                if !comments.iter().any(|c| c.id == id) {
                    next.focus = Focus::None;
                    if let Some(removed) = state.comment(id) {
                        let owner = state.annotations().owner_of(CommentTarget::Comment(id));
                        if let Some(line) = owner.or_else(|| removed.anchor()) {
                            return_focus_to(&mut next, &removed.path, line);
                        }
                    }
                }
            }
            if let Some(EditTarget::Comment(id)) = state.editing {
                if !comments.iter().any(|c| c.id == id) {
                    next.editing = None;
                }
            }
        }
        ReviewAction::SetThreads(threads) => next.threads = Arc::new(threads.clone()),
        ReviewAction::CommentPosted(comment) => {
            let mut comments = (*state.comments).clone();
            comments.retain(|c| c.id != comment.id);
            comments.push(comment.clone());
            next.comments = Arc::new(comments);
            next.replying_to = None;
            next.write_error = None;
        }
        ReviewAction::CommentUpdated(comment) => {
            let comments = state
                .comments
                .iter()
                .map(|c| if c.id == comment.id { comment.clone() } else { c.clone() })
                .collect();
            next.comments = Arc::new(comments);
            if state.editing == Some(EditTarget::Comment(comment.id)) {
                next.editing = None;
            }
            next.write_error = None;
        }
        ReviewAction::CommentDeleted(id) => {
            if let Some(removed) = state.comment(*id).cloned() {
                let owner = state.annotations().owner_of(CommentTarget::Comment(*id));
                let mut comments = (*state.comments).clone();
                comments.retain(|c| c.id != *id);
                next.comments = Arc::new(comments);
                if state.editing == Some(EditTarget::Comment(*id)) {
                    next.editing = None;
                }
                if state.replying_to == Some(*id) {
                    next.replying_to = None;
                }
                match owner.or_else(|| removed.anchor()) {
                    Some(line) => return_focus_to(&mut next, &removed.path, line),
                    None if state.focus == Focus::Comment(*id) => next.focus = Focus::None,
                    None => {}
                }
            }
            next.write_error = None;
        }

        // === Editing / replying ===
        ReviewAction::StartEditing(target) => {
            next.editing = Some(*target);
            next.commenting_on = None;
            next.replying_to = None;
        }
        ReviewAction::StopEditing => next.editing = None,
        ReviewAction::StartReplying(id) => {
            if state.comment(*id).is_some() {
                next.replying_to = Some(*id);
                next.commenting_on = None;
                next.editing = None;
            }
        }
        ReviewAction::StopReplying => next.replying_to = None,

        // === Threads ===
        ReviewAction::ResolveThread(thread_id) => set_resolved(&mut next, thread_id, true),
        ReviewAction::UnresolveThread(thread_id) => set_resolved(&mut next, thread_id, false),

        // === View / goto ===
        ReviewAction::SetDiffViewMode(mode) => next.diff_view_mode = *mode,
        ReviewAction::EnterGotoMode => next.goto = Some(GotoState::default()),
        ReviewAction::ExitGotoMode => next.goto = None,
        ReviewAction::GotoInput(c) => {
            if let Some(goto) = next.goto.as_mut() {
                if c.is_ascii_digit() && goto.input.len() < MAX_GOTO_DIGITS {
                    goto.input.push(*c);
                }
            }
        }
        ReviewAction::GotoBackspace => {
            if let Some(goto) = next.goto.as_mut() {
                goto.input.pop();
            }
        }
        ReviewAction::ToggleGotoSide => {
            if let Some(goto) = next.goto.as_mut() {
                goto.side = goto.side.opposite();
            }
        }
        ReviewAction::CommitGoto => {
            if let Some(goto) = next.goto.take() {
                let target = goto
                    .input
                    .parse::<u32>()
                    .ok()
                    .and_then(|n| closest_line(&state.navigable, n, goto.side));
                if let Some(line) = target {
                    set_focus(&mut next, Focus::Line(line));
                }
            }
        }

        // === Review submission ===
        ReviewAction::SetReviewBody(body) => next.review_body = body.clone(),
        ReviewAction::SetReviewEvent(event) => next.review_event = *event,
        ReviewAction::ReviewSubmitted { submitted } => {
            next.pending_comments = Arc::new(without_pending(&state.pending_comments, submitted));
            if let Focus::PendingComment(id) = state.focus {
                if submitted.contains(&id) {
                    next.focus = Focus::None;
                    if let Some(pending) = state.pending_comment(id) {
                        return_focus_to(&mut next, &pending.path, pending.anchor());
                    }
                }
            }
            if let Some(EditTarget::Pending(id)) = state.editing {
                if submitted.contains(&id) {
                    next.editing = None;
                }
            }
            next.review_body = String::new();
            next.review_event = Default::default();
            next.pending_review_id = None;
            next.write_error = None;
        }

        // === Errors ===
        ReviewAction::SetWriteError(error) => next.write_error = Some(error.clone()),
        ReviewAction::DismissError => next.write_error = None,

        // === Diff lifecycle ===
        ReviewAction::DiffLoaded { path, diff } => {
            if state.selected_file.as_ref() != Some(path) {
                debug!("Discarding diff for {path}, no longer selected");
                return next;
            }
            next.diff = DiffLoadState::Loaded {
                path: path.clone(),
                diff: diff.clone(),
            };
            rebuild_navigable(&mut next);
            settle_pending_link(&mut next);
        }
        ReviewAction::DiffLoadFailed { path, error } => {
            if state.selected_file.as_ref() == Some(path) {
                next.pending_link = None;
                next.diff = DiffLoadState::Failed {
                    path: path.clone(),
                    error: error.clone(),
                };
            }
        }
        ReviewAction::SkipBlockExpanded { path, index, lines } => {
            if state.selected_file.as_ref() != Some(path) || state.loaded_diff().is_none() {
                debug!("Discarding expansion of skip block {index} in {path}");
                return next;
            }
            let mut expanded = (*state.expanded_skips).clone();
            expanded.insert(*index, Arc::new(lines.clone()));
            next.expanded_skips = Arc::new(expanded);
            rebuild_navigable(&mut next);
            if state.focus == Focus::SkipBlock(*index) {
                next.focus = lines
                    .first()
                    .and_then(canonical_ref)
                    .map_or(Focus::None, Focus::Line);
            }
        }

        // === Sync / links ===
        ReviewAction::PendingReviewSynced {
            review_id,
            server_ids,
        } => {
            next.pending_review_id = Some(*review_id);
            let pending = state
                .pending_comments
                .iter()
                .map(|c| {
                    let server_id = server_ids
                        .iter()
                        .find(|(local, _)| *local == c.id)
                        .map(|(_, server)| *server);
                    match server_id {
                        Some(server_id) => PendingComment {
                            server_id: Some(server_id),
                            ..c.clone()
                        },
                        None => c.clone(),
                    }
                })
                .collect();
            next.pending_comments = Arc::new(pending);
            next.write_error = None;
        }
        ReviewAction::ApplyDeepLink { path, focus } => {
            if state.file(path).is_none() {
                return next;
            }
            select_file(&mut next, path);
            let (resolved, anchor) = focus.resolve(&next.navigable);
            next.focus = resolved;
            next.selection_anchor = anchor;
            if next.loaded_diff().is_none() {
                next.pending_link = Some(*focus);
            }
        }
    }

    next
}

/// Select `path`, dropping every per-file transient. Switching to another
/// file also drops its loaded diff and expanded skip blocks.
fn select_file(state: &mut ReviewState, path: &str) {
    state.focus = Focus::None;
    state.selection_anchor = None;
    state.commenting_on = None;
    state.editing = None;
    state.replying_to = None;
    state.goto = None;
    state.pending_link = None;

    if state.selected_file.as_deref() != Some(path) {
        state.selected_file = Some(path.to_string());
        state.expanded_skips = Arc::default();
        state.navigable = Arc::default();
        state.diff = DiffLoadState::Loading {
            path: path.to_string(),
        };
    }
}

fn set_focus(state: &mut ReviewState, focus: Focus) {
    state.focus = focus;
    state.selection_anchor = None;
}

/// Re-resolve a link applied while the diff was loading, unless focus has
/// moved since.
fn settle_pending_link(state: &mut ReviewState) {
    let Some(link) = state.pending_link.take() else {
        return;
    };
    if link.resolve(&NavigableIndex::default()) != (state.focus, state.selection_anchor) {
        return;
    }
    let (focus, anchor) = link.resolve(&state.navigable);
    state.focus = focus;
    state.selection_anchor = anchor;
}

/// Move focus to `line` if it belongs to the selected file.
fn return_focus_to(state: &mut ReviewState, path: &str, line: LineRef) {
    if state.selected_file.as_deref() == Some(path) {
        set_focus(state, Focus::Line(line));
    }
}

fn rebuild_navigable(state: &mut ReviewState) {
    let Some(loaded) = state.loaded_diff() else {
        state.navigable = Arc::default();
        return;
    };
    state.navigable = if state.expanded_skips.is_empty() {
        loaded.navigable.clone()
    } else {
        Arc::new(NavigableIndex::build(&loaded.diff, &state.expanded_skips))
    };
}

fn without_pending(pending: &[PendingComment], ids: &[uuid::Uuid]) -> Vec<PendingComment> {
    pending
        .iter()
        .filter(|c| !ids.contains(&c.id))
        .cloned()
        .collect()
}

fn set_resolved(state: &mut ReviewState, thread_id: &str, resolved: bool) {
    if !state.threads.iter().any(|t| t.id == thread_id) {
        return;
    }
    let threads = state
        .threads
        .iter()
        .map(|t| {
            let mut t = t.clone();
            if t.id == thread_id {
                t.is_resolved = resolved;
            }
            t
        })
        .collect();
    state.threads = Arc::new(threads);
}

fn canonical_ref(line: &DiffLine) -> Option<LineRef> {
    let side = line.kind.canonical_side();
    line.number_on(side).map(|n| LineRef::new(n, side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadedDiff;
    use crate::model::{
        Comment, DiffSegment, DiffSide, FileEntry, FileStatus, Hunk, ParsedDiff, SessionKey,
        SkipBlock,
    };
    use crate::navigation::{Direction, ExpandedSkips, NavRequest};
    use crate::state::DiffViewMode;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use review_host::{PullRequest, ReviewThread};

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            previous_path: None,
            status: FileStatus::Modified,
            additions: 2,
            deletions: 1,
            content_hash: format!("sha-{path}"),
            patch: None,
        }
    }

    // Lines 8..=12 on both sides with a change at 10, then a skip block
    fn loaded_diff() -> Arc<LoadedDiff> {
        let mut hunk = Hunk::new(8, 5, 8, 5);
        hunk.lines.push(DiffLine::context("a", 8, 8));
        hunk.lines.push(DiffLine::context("b", 9, 9));
        hunk.lines.push(DiffLine::delete("c", 10));
        hunk.lines.push(DiffLine::insert("C", 10));
        hunk.lines.push(DiffLine::context("d", 11, 11));
        hunk.lines.push(DiffLine::context("e", 12, 12));
        let diff = ParsedDiff::new(vec![
            DiffSegment::Hunk(hunk),
            DiffSegment::Skip(SkipBlock {
                index: 0,
                old_start: 13,
                new_start: 13,
                count: 3,
            }),
        ]);
        let navigable = Arc::new(NavigableIndex::build(&diff, &ExpandedSkips::new()));
        Arc::new(LoadedDiff {
            diff,
            navigable,
            new_content: None,
        })
    }

    fn loaded_state() -> ReviewState {
        let state = ReviewState::new(SessionKey::new("o", "r", 1));
        let state = reduce(
            &state,
            &ReviewAction::SessionLoaded {
                pull_request: PullRequest {
                    number: 1,
                    title: "t".to_string(),
                    body: None,
                    author: "a".to_string(),
                    head_sha: "head".to_string(),
                    base_sha: "base".to_string(),
                    head_branch: "feature".to_string(),
                    base_branch: "main".to_string(),
                },
                files: vec![entry("a.ts"), entry("b.ts")],
                comments: vec![],
                threads: vec![ReviewThread {
                    id: "t1".to_string(),
                    is_resolved: false,
                    comment_ids: vec![1],
                }],
            },
        );
        reduce(
            &state,
            &ReviewAction::SelectFile {
                path: "a.ts".to_string(),
                loaded: Some(loaded_diff()),
            },
        )
    }

    fn comment(id: u64, line: u32) -> Comment {
        Comment {
            id,
            path: "a.ts".to_string(),
            line: Some(line),
            start_line: None,
            side: DiffSide::Right,
            body: "looks off".to_string(),
            author: "reviewer".to_string(),
            created_at: Utc::now(),
            in_reply_to: None,
        }
    }

    #[test]
    fn test_select_file_resets_transients() {
        let mut state = loaded_state();
        state.focus = Focus::Line(LineRef::right(9));
        state.selection_anchor = Some(LineRef::right(8));
        state.commenting_on = Some(ComposeTarget {
            line: LineRef::right(9),
            start_line: None,
        });
        state.goto = Some(GotoState::default());
        state.replying_to = Some(1);

        let next = reduce(&state, &ReviewAction::select_file("b.ts"));

        assert_eq!(next.selected_file.as_deref(), Some("b.ts"));
        assert_eq!(next.focus, Focus::None);
        assert_eq!(next.selection_anchor, None);
        assert_eq!(next.commenting_on, None);
        assert_eq!(next.goto, None);
        assert_eq!(next.replying_to, None);
        assert!(matches!(next.diff, DiffLoadState::Loading { .. }));
        assert!(next.navigable.is_empty());
    }

    #[test]
    fn test_select_same_file_keeps_diff() {
        let mut state = loaded_state();
        state.focus = Focus::Line(LineRef::right(9));

        let next = reduce(&state, &ReviewAction::select_file("a.ts"));

        assert_eq!(next.focus, Focus::None);
        assert!(next.loaded_diff().is_some());
        assert_eq!(next.navigable.len(), state.navigable.len());
    }

    #[test]
    fn test_select_unknown_file_is_noop() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::select_file("missing.ts"));
        assert_eq!(next.selected_file.as_deref(), Some("a.ts"));
    }

    #[test]
    fn test_toggle_viewed() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::ToggleViewed("a.ts".to_string()));
        assert!(next.is_viewed("a.ts"));
        let next = reduce(&next, &ReviewAction::ToggleViewed("a.ts".to_string()));
        assert!(!next.is_viewed("a.ts"));
    }

    #[test]
    fn test_focused_line_drops_anchor_on_side_change() {
        let mut state = loaded_state();
        state.focus = Focus::Line(LineRef::right(9));
        state.selection_anchor = Some(LineRef::right(8));

        let same_side = reduce(&state, &ReviewAction::SetFocusedLine(LineRef::right(11)));
        assert_eq!(same_side.selection_anchor, Some(LineRef::right(8)));

        let other_side = reduce(&state, &ReviewAction::SetFocusedLine(LineRef::left(10)));
        assert_eq!(other_side.selection_anchor, None);
    }

    #[test]
    fn test_selection_anchor_requires_same_side() {
        let mut state = loaded_state();
        state.focus = Focus::Line(LineRef::right(9));

        let next = reduce(&state, &ReviewAction::SetSelectionAnchor(Some(LineRef::left(8))));
        assert_eq!(next.selection_anchor, None);

        let next = reduce(&state, &ReviewAction::SetSelectionAnchor(Some(LineRef::right(8))));
        assert_eq!(next.selection_anchor, Some(LineRef::right(8)));
    }

    #[test]
    fn test_add_then_remove_pending_focuses_line() {
        let state = loaded_state();
        let pending = PendingComment::new("a.ts", LineRef::right(10), "nit");

        let added = reduce(&state, &ReviewAction::AddPendingComment(pending.clone()));
        assert_eq!(added.focus, Focus::PendingComment(pending.id));
        assert_eq!(added.pending_comments.len(), 1);

        let removed = reduce(&added, &ReviewAction::RemovePendingComment(pending.id));
        assert_eq!(removed.focus, Focus::Line(LineRef::right(10)));
        assert!(removed.pending_comments.is_empty());
    }

    #[test]
    fn test_start_commenting_on_range() {
        let mut state = loaded_state();
        state.focus = Focus::Line(LineRef::right(9));
        state.selection_anchor = Some(LineRef::right(11));

        let next = reduce(&state, &ReviewAction::StartCommenting);
        assert_eq!(
            next.commenting_on,
            Some(ComposeTarget {
                line: LineRef::right(11),
                start_line: Some(9),
            })
        );
    }

    #[test]
    fn test_start_commenting_without_line_is_noop() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::StartCommenting);
        assert_eq!(next.commenting_on, None);
    }

    #[test]
    fn test_comment_deleted_returns_focus_to_line() {
        let mut state = loaded_state();
        state.comments = Arc::new(vec![comment(1, 11)]);
        state.focus = Focus::Comment(1);

        let next = reduce(&state, &ReviewAction::CommentDeleted(1));
        assert!(next.comments.is_empty());
        assert_eq!(next.focus, Focus::Line(LineRef::right(11)));
    }

    #[test]
    fn test_pending_published_moves_focus_to_comment() {
        let state = loaded_state();
        let pending = PendingComment::new("a.ts", LineRef::right(9), "hm");
        let state = reduce(&state, &ReviewAction::AddPendingComment(pending.clone()));

        let next = reduce(
            &state,
            &ReviewAction::PendingCommentPublished {
                pending_id: pending.id,
                comment: comment(42, 9),
            },
        );
        assert!(next.pending_comments.is_empty());
        assert_eq!(next.focus, Focus::Comment(42));
        assert_eq!(next.comments.len(), 1);
    }

    #[test]
    fn test_resolve_thread() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::ResolveThread("t1".to_string()));
        assert!(next.threads[0].is_resolved);
        let next = reduce(&next, &ReviewAction::UnresolveThread("t1".to_string()));
        assert!(!next.threads[0].is_resolved);
    }

    #[test]
    fn test_goto_closest_line() {
        let state = loaded_state();
        let mut next = reduce(&state, &ReviewAction::EnterGotoMode);
        for c in "1x5".chars() {
            next = reduce(&next, &ReviewAction::GotoInput(c));
        }
        assert_eq!(next.goto.as_ref().map(|g| g.input.as_str()), Some("15"));

        let next = reduce(&next, &ReviewAction::CommitGoto);
        assert_eq!(next.goto, None);
        assert_eq!(next.focus, Focus::Line(LineRef::right(12)));
    }

    #[test]
    fn test_goto_left_side() {
        let state = loaded_state();
        let mut next = reduce(&state, &ReviewAction::EnterGotoMode);
        next = reduce(&next, &ReviewAction::ToggleGotoSide);
        next = reduce(&next, &ReviewAction::GotoInput('1'));
        next = reduce(&next, &ReviewAction::GotoInput('0'));
        let next = reduce(&next, &ReviewAction::CommitGoto);
        assert_eq!(next.focus, Focus::Line(LineRef::left(10)));
    }

    #[test]
    fn test_stale_diff_discarded() {
        let state = loaded_state();
        let state = reduce(&state, &ReviewAction::select_file("b.ts"));

        let next = reduce(
            &state,
            &ReviewAction::DiffLoaded {
                path: "a.ts".to_string(),
                diff: loaded_diff(),
            },
        );
        assert!(matches!(next.diff, DiffLoadState::Loading { ref path } if path == "b.ts"));
    }

    #[test]
    fn test_skip_expansion_moves_focus_to_first_revealed_line() {
        let mut state = loaded_state();
        state.focus = Focus::SkipBlock(0);

        let next = reduce(
            &state,
            &ReviewAction::SkipBlockExpanded {
                path: "a.ts".to_string(),
                index: 0,
                lines: vec![
                    DiffLine::context("f", 13, 13),
                    DiffLine::context("g", 14, 14),
                    DiffLine::context("h", 15, 15),
                ],
            },
        );
        assert_eq!(next.focus, Focus::Line(LineRef::right(13)));
        assert_eq!(next.navigable.position_of_skip(0), None);
        assert!(next.navigable.contains_line(LineRef::right(15)));
    }

    #[test]
    fn test_navigate_down_from_nothing() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::Navigate(NavRequest::step(Direction::Down)));
        assert_eq!(next.focus, Focus::Line(LineRef::right(8)));
    }

    #[test]
    fn test_apply_deep_link_range() {
        let state = loaded_state();
        let next = reduce(
            &state,
            &ReviewAction::ApplyDeepLink {
                path: "a.ts".to_string(),
                focus: LinkFocus::Range(9, 11),
            },
        );
        assert_eq!(next.focus, Focus::Line(LineRef::right(11)));
        assert_eq!(next.selection_anchor, Some(LineRef::right(9)));
    }

    #[test]
    fn test_review_submitted_clears_draft() {
        let state = loaded_state();
        let pending = PendingComment::new("a.ts", LineRef::right(9), "x");
        let state = reduce(&state, &ReviewAction::AddPendingComment(pending.clone()));
        let state = reduce(&state, &ReviewAction::SetReviewBody("lgtm".to_string()));

        let next = reduce(
            &state,
            &ReviewAction::ReviewSubmitted {
                submitted: vec![pending.id],
            },
        );
        assert!(next.pending_comments.is_empty());
        assert_eq!(next.review_body, "");
        assert_eq!(next.focus, Focus::Line(LineRef::right(9)));
    }

    // 9 is context, 10 and 11 were deleted
    fn deletion_diff() -> Arc<LoadedDiff> {
        let mut hunk = Hunk::new(9, 3, 9, 1);
        hunk.lines.push(DiffLine::context("a", 9, 9));
        hunk.lines.push(DiffLine::delete("b", 10));
        hunk.lines.push(DiffLine::delete("c", 11));
        let diff = ParsedDiff::new(vec![DiffSegment::Hunk(hunk)]);
        let navigable = Arc::new(NavigableIndex::build(&diff, &ExpandedSkips::new()));
        Arc::new(LoadedDiff {
            diff,
            navigable,
            new_content: None,
        })
    }

    #[test]
    fn test_link_applied_before_load_resolves_on_load() {
        let link = ReviewAction::ApplyDeepLink {
            path: "b.ts".to_string(),
            focus: LinkFocus::Line(10),
        };
        let loaded = ReviewAction::DiffLoaded {
            path: "b.ts".to_string(),
            diff: deletion_diff(),
        };

        let before_load = reduce(&loaded_state(), &link);
        assert!(before_load.pending_link.is_some());
        let link_then_load = reduce(&before_load, &loaded);
        assert_eq!(link_then_load.focus, Focus::Line(LineRef::left(10)));
        assert_eq!(link_then_load.pending_link, None);

        let load_then_link = reduce(
            &reduce(&reduce(&loaded_state(), &ReviewAction::select_file("b.ts")), &loaded),
            &link,
        );
        assert_eq!(load_then_link.focus, link_then_load.focus);

        let down = reduce(
            &link_then_load,
            &ReviewAction::Navigate(NavRequest::step(Direction::Down)),
        );
        assert_eq!(down.focus, Focus::Line(LineRef::left(11)));
    }

    #[test]
    fn test_pending_link_dropped_when_focus_moves_first() {
        let state = reduce(
            &loaded_state(),
            &ReviewAction::ApplyDeepLink {
                path: "b.ts".to_string(),
                focus: LinkFocus::Line(10),
            },
        );
        let state = reduce(&state, &ReviewAction::ClearFocus);

        let next = reduce(
            &state,
            &ReviewAction::DiffLoaded {
                path: "b.ts".to_string(),
                diff: deletion_diff(),
            },
        );
        assert_eq!(next.focus, Focus::None);
        assert_eq!(next.pending_link, None);
    }

    #[test]
    fn test_refresh_without_focused_comment_returns_to_line() {
        let mut state = loaded_state();
        state.comments = Arc::new(vec![comment(1, 11), comment(2, 9)]);
        state.focus = Focus::Comment(1);

        let next = reduce(&state, &ReviewAction::SetComments(vec![comment(2, 9)]));
        assert_eq!(next.comments.len(), 1);
        assert_eq!(next.focus, Focus::Line(LineRef::right(11)));
    }

    #[test]
    fn test_untouched_slices_keep_pointer() {
        let state = loaded_state();
        let next = reduce(&state, &ReviewAction::SetDiffViewMode(DiffViewMode::Split));
        assert!(Arc::ptr_eq(&state.viewed_files, &next.viewed_files));
        assert!(Arc::ptr_eq(&state.pending_comments, &next.pending_comments));
    }

    fn arb_line() -> impl Strategy<Value = LineRef> {
        (6u32..16, any::<bool>()).prop_map(|(line, left)| {
            if left {
                LineRef::left(line)
            } else {
                LineRef::right(line)
            }
        })
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    fn arb_action() -> impl Strategy<Value = ReviewAction> {
        prop_oneof![
            prop_oneof![Just("a.ts"), Just("b.ts"), Just("c.ts")]
                .prop_map(|p| ReviewAction::select_file(p)),
            arb_line().prop_map(ReviewAction::SetFocusedLine),
            proptest::option::of(arb_line()).prop_map(ReviewAction::SetSelectionAnchor),
            (arb_line(), arb_line())
                .prop_map(|(start, end)| ReviewAction::SelectLineRange { start, end }),
            (0usize..2).prop_map(ReviewAction::FocusSkipBlock),
            (0u64..3).prop_map(ReviewAction::FocusComment),
            Just(ReviewAction::ClearFocus),
            (arb_direction(), 1usize..4, any::<bool>()).prop_map(|(direction, jump, extend)| {
                ReviewAction::Navigate(NavRequest {
                    direction,
                    jump,
                    extend,
                })
            }),
            arb_line().prop_map(|line| {
                ReviewAction::AddPendingComment(PendingComment::new("a.ts", line, "p"))
            }),
            Just(ReviewAction::StartCommenting),
            Just(ReviewAction::EnterGotoMode),
            (0u32..20).prop_map(|n| ReviewAction::GotoInput(char::from_digit(n % 10, 10).unwrap_or('0'))),
            Just(ReviewAction::CommitGoto),
            Just(ReviewAction::SetDiffViewMode(DiffViewMode::Split)),
            Just(ReviewAction::DiffLoaded {
                path: "a.ts".to_string(),
                diff: loaded_diff(),
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_anchor_only_with_same_side_line(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = loaded_state();
            for action in &actions {
                state = reduce(&state, action);
                if let Some(anchor) = state.selection_anchor {
                    let focused = state.focus.focused_line();
                    prop_assert!(focused.is_some(), "anchor without focused line after {:?}", action);
                    prop_assert_eq!(focused.map(|f| f.side), Some(anchor.side));
                }
            }
        }

        #[test]
        fn prop_select_file_always_resets(actions in proptest::collection::vec(arb_action(), 0..30), target in prop_oneof![Just("a.ts"), Just("b.ts")]) {
            let mut state = loaded_state();
            for action in &actions {
                state = reduce(&state, action);
            }
            let state = reduce(&state, &ReviewAction::select_file(target));
            prop_assert_eq!(state.selected_file.as_deref(), Some(target));
            prop_assert_eq!(state.focus, Focus::None);
            prop_assert_eq!(state.selection_anchor, None);
            prop_assert_eq!(state.commenting_on, None);
            prop_assert_eq!(state.goto, None);
        }
    }
}
