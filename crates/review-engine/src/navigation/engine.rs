//! Next-focus computation for directional movement.
//!
//! Pure functions over the navigable index and the line annotations of the
//! selected file. `None` means the move is a no-op.

use super::index::{NavigableIndex, NavigableItem};
use crate::model::{DiffSide, LineKind, LineRef};
use crate::rows::{CommentTarget, LineAnnotations};
use crate::state::{DiffViewMode, Focus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavRequest {
    pub direction: Direction,
    /// Number of items to move; values below one count as one.
    pub jump: usize,
    /// Extend the line range instead of moving the cursor alone.
    pub extend: bool,
}

impl NavRequest {
    pub fn step(direction: Direction) -> Self {
        Self {
            direction,
            jump: 1,
            extend: false,
        }
    }

    pub fn page(direction: Direction, jump: usize) -> Self {
        Self {
            direction,
            jump,
            extend: false,
        }
    }

    pub fn extend(direction: Direction) -> Self {
        Self {
            direction,
            jump: 1,
            extend: true,
        }
    }
}

/// Where the cursor ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOutcome {
    pub focus: Focus,
    pub anchor: Option<LineRef>,
}

impl NavOutcome {
    fn moved(focus: Focus) -> Self {
        Self {
            focus,
            anchor: None,
        }
    }
}

/// Everything navigation reads besides the current focus.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub index: &'a NavigableIndex,
    pub annotations: &'a LineAnnotations,
    pub view_mode: DiffViewMode,
}

enum Position {
    Item(usize),
    Comment { item: usize, target: CommentTarget },
}

/// Compute the next focus for `request`.
pub fn navigate(
    ctx: &NavContext<'_>,
    focus: &Focus,
    anchor: Option<LineRef>,
    request: NavRequest,
) -> Option<NavOutcome> {
    match request.direction {
        Direction::Left | Direction::Right => switch_side(ctx, focus, request.direction),
        Direction::Up | Direction::Down if request.extend => {
            extend_selection(ctx, focus, anchor, request)
        }
        Direction::Up | Direction::Down => step(ctx, focus, request),
    }
}

fn targets_at(ctx: &NavContext<'_>, position: usize) -> Vec<CommentTarget> {
    ctx.index
        .line_at(position)
        .map(|item| ctx.annotations.targets_for(item))
        .unwrap_or_default()
}

fn current_position(ctx: &NavContext<'_>, focus: &Focus) -> Option<Position> {
    match focus {
        Focus::None => None,
        Focus::Line(line) => ctx.index.position_of_line(*line).map(Position::Item),
        Focus::SkipBlock(index) => ctx.index.position_of_skip(*index).map(Position::Item),
        Focus::Comment(_) | Focus::PendingComment(_) => {
            let target = CommentTarget::from_focus(focus)?;
            let owner = ctx.annotations.owner_of(target)?;
            let item = ctx.index.position_of_line(owner)?;
            Some(Position::Comment { item, target })
        }
    }
}

fn step(ctx: &NavContext<'_>, focus: &Focus, request: NavRequest) -> Option<NavOutcome> {
    let last = ctx.index.len().checked_sub(1)?;
    let down = request.direction == Direction::Down;
    let jump = request.jump.max(1);
    let preferred = match (ctx.view_mode, focus) {
        (DiffViewMode::Split, Focus::Line(line)) => Some(line.side),
        _ => None,
    };
    let focus_at = |position: usize| ctx.index.focus_at(position, preferred).map(NavOutcome::moved);

    let Some(current) = current_position(ctx, focus) else {
        return focus_at(if down { 0 } else { last });
    };

    let (item, within) = match current {
        Position::Item(item) => (item, None),
        Position::Comment { item, target } => {
            let targets = targets_at(ctx, item);
            let within = targets.iter().position(|t| *t == target)?;
            (item, Some((targets, within)))
        }
    };

    if jump > 1 {
        let next = if down {
            (item + jump).min(last)
        } else {
            item.saturating_sub(jump)
        };
        if next == item && within.is_none() {
            return None;
        }
        return focus_at(next);
    }

    match (down, within) {
        // Down from a line enters its first comment before moving on
        (true, None) => {
            if let Some(first) = targets_at(ctx, item).first() {
                return Some(NavOutcome::moved(first.into_focus()));
            }
            if item == last {
                return None;
            }
            focus_at(item + 1)
        }
        (true, Some((targets, i))) => {
            if let Some(next) = targets.get(i + 1) {
                return Some(NavOutcome::moved(next.into_focus()));
            }
            if item == last {
                return None;
            }
            focus_at(item + 1)
        }
        // Up onto a line lands on its last comment first
        (false, None) => {
            let target = item.checked_sub(1)?;
            if let Some(last_comment) = targets_at(ctx, target).last() {
                return Some(NavOutcome::moved(last_comment.into_focus()));
            }
            focus_at(target)
        }
        (false, Some((targets, i))) => match i.checked_sub(1) {
            Some(previous) => targets
                .get(previous)
                .map(|t| NavOutcome::moved(t.into_focus())),
            None => focus_at(item),
        },
    }
}

/// Grow or shrink the line range. The range stays on the anchor's side and
/// does not cross skip blocks.
fn extend_selection(
    ctx: &NavContext<'_>,
    focus: &Focus,
    anchor: Option<LineRef>,
    request: NavRequest,
) -> Option<NavOutcome> {
    let Focus::Line(current) = focus else {
        return None;
    };
    let side = anchor.map(|a| a.side).unwrap_or(current.side);
    if side != current.side {
        return None;
    }
    let start = ctx.index.position_of_line(*current)?;
    let down = request.direction == Direction::Down;

    let mut cursor = start;
    let mut landed = start;
    let mut moved = 0;
    while moved < request.jump.max(1) {
        let next = if down {
            cursor + 1
        } else {
            match cursor.checked_sub(1) {
                Some(next) => next,
                None => break,
            }
        };
        match ctx.index.get(next) {
            Some(NavigableItem::Line(item)) => {
                cursor = next;
                if item.number_on(side).is_some() {
                    landed = next;
                    moved += 1;
                }
            }
            _ => break,
        }
    }

    if landed == start {
        return None;
    }
    let line = ctx.index.line_at(landed)?.ref_on(side)?;
    Some(NavOutcome {
        focus: Focus::Line(line),
        anchor: Some(anchor.unwrap_or(*current)),
    })
}

/// Re-focus the same context line on the other column of the split view.
fn switch_side(ctx: &NavContext<'_>, focus: &Focus, direction: Direction) -> Option<NavOutcome> {
    if ctx.view_mode != DiffViewMode::Split {
        return None;
    }
    let Focus::Line(current) = focus else {
        return None;
    };
    let target_side = match direction {
        Direction::Left => DiffSide::Left,
        _ => DiffSide::Right,
    };
    if current.side == target_side {
        return None;
    }
    let item = ctx.index.line_at(ctx.index.position_of_line(*current)?)?;
    if item.kind != LineKind::Context {
        return None;
    }
    item.ref_on(target_side)
        .map(|line| NavOutcome::moved(Focus::Line(line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, DiffLine, DiffSegment, Hunk, ParsedDiff, PendingComment, SkipBlock};
    use crate::navigation::ExpandedSkips;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    // Skip(0) | ctx 1/1 | del 2 | ins 2 | ctx 3/3
    fn index() -> NavigableIndex {
        let mut hunk = Hunk::new(1, 3, 1, 3);
        hunk.lines.push(DiffLine::context("a", 1, 1));
        hunk.lines.push(DiffLine::delete("b", 2));
        hunk.lines.push(DiffLine::insert("B", 2));
        hunk.lines.push(DiffLine::context("c", 3, 3));
        let skip = SkipBlock {
            index: 0,
            old_start: 4,
            new_start: 4,
            count: 10,
        };
        NavigableIndex::build(
            &ParsedDiff::new(vec![DiffSegment::Hunk(hunk), DiffSegment::Skip(skip)]),
            &ExpandedSkips::new(),
        )
    }

    fn comment(id: u64, reply_to: Option<u64>, line: u32) -> Comment {
        Comment {
            id,
            path: "a.rs".to_string(),
            line: Some(line),
            start_line: None,
            side: DiffSide::Right,
            body: String::new(),
            author: "r".to_string(),
            created_at: Utc::now(),
            in_reply_to: reply_to,
        }
    }

    fn nav(
        index: &NavigableIndex,
        annotations: &LineAnnotations,
        mode: DiffViewMode,
        focus: Focus,
        anchor: Option<LineRef>,
        request: NavRequest,
    ) -> Option<NavOutcome> {
        let ctx = NavContext {
            index,
            annotations,
            view_mode: mode,
        };
        navigate(&ctx, &focus, anchor, request)
    }

    fn down(index: &NavigableIndex, annotations: &LineAnnotations, focus: Focus) -> Option<Focus> {
        nav(
            index,
            annotations,
            DiffViewMode::Unified,
            focus,
            None,
            NavRequest::step(Direction::Down),
        )
        .map(|o| o.focus)
    }

    fn up(index: &NavigableIndex, annotations: &LineAnnotations, focus: Focus) -> Option<Focus> {
        nav(
            index,
            annotations,
            DiffViewMode::Unified,
            focus,
            None,
            NavRequest::step(Direction::Up),
        )
        .map(|o| o.focus)
    }

    #[test]
    fn test_down_walks_every_item_then_stops() {
        let index = index();
        let annotations = LineAnnotations::default();

        let mut focus = down(&index, &annotations, Focus::None).unwrap();
        assert_eq!(focus, Focus::Line(LineRef::right(1)));

        let mut seen = vec![focus];
        for _ in 0..index.len() - 1 {
            focus = down(&index, &annotations, focus).unwrap();
            seen.push(focus);
        }

        assert_eq!(
            seen,
            vec![
                Focus::Line(LineRef::right(1)),
                Focus::Line(LineRef::left(2)),
                Focus::Line(LineRef::right(2)),
                Focus::Line(LineRef::right(3)),
                Focus::SkipBlock(0),
            ]
        );
        assert_eq!(down(&index, &annotations, focus), None);
    }

    #[test]
    fn test_up_from_nothing_goes_to_last_and_stops_at_first() {
        let index = index();
        let annotations = LineAnnotations::default();

        assert_eq!(up(&index, &annotations, Focus::None), Some(Focus::SkipBlock(0)));
        assert_eq!(up(&index, &annotations, Focus::Line(LineRef::right(1))), None);
    }

    #[test]
    fn test_down_enters_comments_first() {
        let index = index();
        let pending = PendingComment::new("a.rs", LineRef::right(2), "draft");
        let annotations = LineAnnotations::build(
            "a.rs",
            &[comment(10, None, 2), comment(11, Some(10), 2)],
            std::slice::from_ref(&pending),
        );

        let mut focus = Focus::Line(LineRef::right(2));
        focus = down(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::Comment(10));
        focus = down(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::Comment(11));
        focus = down(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::PendingComment(pending.id));
        focus = down(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::Line(LineRef::right(3)));
    }

    #[test]
    fn test_up_enters_last_comment_of_target_line() {
        let index = index();
        let annotations = LineAnnotations::build(
            "a.rs",
            &[comment(10, None, 2), comment(11, Some(10), 2)],
            &[],
        );

        let mut focus = up(&index, &annotations, Focus::Line(LineRef::right(3))).unwrap();
        assert_eq!(focus, Focus::Comment(11));
        focus = up(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::Comment(10));
        // Up from the first comment returns to the line itself
        focus = up(&index, &annotations, focus).unwrap();
        assert_eq!(focus, Focus::Line(LineRef::right(2)));
    }

    #[test]
    fn test_page_jump_clamps() {
        let index = index();
        let annotations = LineAnnotations::default();

        let outcome = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            Focus::Line(LineRef::right(1)),
            None,
            NavRequest::page(Direction::Down, 20),
        );
        assert_eq!(outcome.map(|o| o.focus), Some(Focus::SkipBlock(0)));

        let outcome = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            Focus::SkipBlock(0),
            None,
            NavRequest::page(Direction::Down, 20),
        );
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_extend_stays_on_side() {
        let index = index();
        let annotations = LineAnnotations::default();

        // Right side: 1 -> 2 (skipping the deleted line) -> 3, then the skip block stops it
        let first = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            Focus::Line(LineRef::right(1)),
            None,
            NavRequest::extend(Direction::Down),
        )
        .unwrap();
        assert_eq!(first.focus, Focus::Line(LineRef::right(2)));
        assert_eq!(first.anchor, Some(LineRef::right(1)));

        let second = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            first.focus,
            first.anchor,
            NavRequest::extend(Direction::Down),
        )
        .unwrap();
        assert_eq!(second.focus, Focus::Line(LineRef::right(3)));
        assert_eq!(second.anchor, Some(LineRef::right(1)));

        let blocked = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            second.focus,
            second.anchor,
            NavRequest::extend(Direction::Down),
        );
        assert_eq!(blocked, None);
    }

    #[test]
    fn test_normal_move_clears_anchor() {
        let index = index();
        let annotations = LineAnnotations::default();

        let outcome = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            Focus::Line(LineRef::right(2)),
            Some(LineRef::right(1)),
            NavRequest::step(Direction::Down),
        )
        .unwrap();
        assert_eq!(outcome.anchor, None);
    }

    #[test]
    fn test_side_switch_only_in_split_on_context() {
        let index = index();
        let annotations = LineAnnotations::default();

        let unified = nav(
            &index,
            &annotations,
            DiffViewMode::Unified,
            Focus::Line(LineRef::right(1)),
            None,
            NavRequest::step(Direction::Left),
        );
        assert_eq!(unified, None);

        let split = nav(
            &index,
            &annotations,
            DiffViewMode::Split,
            Focus::Line(LineRef::right(1)),
            None,
            NavRequest::step(Direction::Left),
        );
        assert_eq!(split.map(|o| o.focus), Some(Focus::Line(LineRef::left(1))));

        let insert_line = nav(
            &index,
            &annotations,
            DiffViewMode::Split,
            Focus::Line(LineRef::right(2)),
            None,
            NavRequest::step(Direction::Left),
        );
        assert_eq!(insert_line, None);
    }

    #[test]
    fn test_split_view_keeps_column_when_moving() {
        let index = index();
        let annotations = LineAnnotations::default();

        let outcome = nav(
            &index,
            &annotations,
            DiffViewMode::Split,
            Focus::Line(LineRef::left(1)),
            None,
            NavRequest::step(Direction::Down),
        );
        assert_eq!(outcome.map(|o| o.focus), Some(Focus::Line(LineRef::left(2))));
    }
}
