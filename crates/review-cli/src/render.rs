//! Plain-text rendering of a review snapshot.

use review_engine::rows::LineSource;
use review_engine::state::DiffLoadState;
use review_engine::{DiffSide, Focus, LineRef, ReviewState, Row};
use std::fmt::Write;

const INDENT: &str = "              ";

fn line_focused(focus: &Focus, old_line: Option<u32>, new_line: Option<u32>) -> bool {
    match focus {
        Focus::Line(LineRef {
            line,
            side: DiffSide::Left,
        }) => old_line == Some(*line),
        Focus::Line(LineRef {
            line,
            side: DiffSide::Right,
        }) => new_line == Some(*line),
        _ => false,
    }
}

fn line_selected(state: &ReviewState, old_line: Option<u32>, new_line: Option<u32>) -> bool {
    let Some((start, end)) = state.selection_range() else {
        return false;
    };
    let number = match start.side {
        DiffSide::Left => old_line,
        DiffSide::Right => new_line,
    };
    number.is_some_and(|n| (start.line..=end.line).contains(&n))
}

fn line_content<'a>(state: &'a ReviewState, source: LineSource) -> &'a str {
    let content = match source {
        LineSource::Hunk { segment, line } => state
            .loaded_diff()
            .and_then(|d| d.diff.line_at(segment, line))
            .map(|l| l.content.as_str()),
        LineSource::Expanded { skip, line } => state
            .expanded_skips
            .get(&skip)
            .and_then(|lines| lines.get(line))
            .map(|l| l.content.as_str()),
    };
    content.unwrap_or_default()
}

fn number(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

fn marker(focused: bool, selected: bool) -> char {
    match (focused, selected) {
        (true, _) => '>',
        (false, true) => '|',
        (false, false) => ' ',
    }
}

/// Render the file list and the rows of the selected file.
pub fn render(state: &ReviewState, rows: &[Row]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}/{}#{} [{}]",
        state.key.owner,
        state.key.repo,
        state.key.number,
        state.diff_view_mode.as_str()
    );
    if let Some(error) = &state.session_error {
        let _ = writeln!(out, "error: {error}");
        return out;
    }

    for file in state.files.iter() {
        let selected = state.selected_file.as_deref() == Some(file.path.as_str());
        let _ = writeln!(
            out,
            "{} {} {} {}",
            if selected { '*' } else { ' ' },
            if state.is_viewed(&file.path) { 'v' } else { ' ' },
            file.status.as_char(),
            file.display_name()
        );
    }
    out.push('\n');

    match &state.diff {
        DiffLoadState::Idle => return out,
        DiffLoadState::Loading { path } => {
            let _ = writeln!(out, "loading {path}...");
            return out;
        }
        DiffLoadState::Failed { path, error } => {
            let _ = writeln!(out, "failed to load {path}: {error}");
            return out;
        }
        DiffLoadState::Loaded { .. } => {}
    }

    for row in rows {
        render_row(&mut out, state, row);
    }
    if let Some(error) = &state.write_error {
        let _ = writeln!(out, "\nerror: {error}");
    }
    out
}

fn render_row(out: &mut String, state: &ReviewState, row: &Row) {
    match row {
        Row::Line {
            kind,
            old_line,
            new_line,
            source,
        } => {
            let focused = line_focused(&state.focus, *old_line, *new_line);
            let selected = line_selected(state, *old_line, *new_line);
            let _ = writeln!(
                out,
                "{} {:>5} {:>5} {}{}",
                marker(focused, selected),
                number(*old_line),
                number(*new_line),
                kind.prefix(),
                line_content(state, *source)
            );
        }
        Row::Skip { index, count } => {
            let focused = state.focus == Focus::SkipBlock(*index);
            let _ = writeln!(
                out,
                "{} {:^11} ... {} hidden lines",
                marker(focused, false),
                "",
                count
            );
        }
        Row::SkipSpacer { count, .. } => {
            let _ = writeln!(out, "  {:^11} --- {} lines shown ---", "", count);
        }
        Row::Thread {
            comment_ids,
            resolved,
            ..
        } => {
            if *resolved {
                let _ = writeln!(out, "{INDENT}[resolved]");
            }
            for id in comment_ids {
                let Some(comment) = state.comment(*id) else {
                    continue;
                };
                let focused = state.focus == Focus::Comment(*id);
                let _ = writeln!(
                    out,
                    "{}{}@{}: {}",
                    marker(focused, false),
                    &INDENT[1..],
                    comment.author,
                    comment.body
                );
            }
        }
        Row::PendingItem { id } => {
            if let Some(pending) = state.pending_comment(*id) {
                let focused = state.focus == Focus::PendingComment(*id);
                let _ = writeln!(
                    out,
                    "{}{}[pending] {}",
                    marker(focused, false),
                    &INDENT[1..],
                    pending.body
                );
            }
        }
        Row::Compose { line, start_line } => {
            let range = match start_line {
                Some(start) => format!("{}-{}", start, line.line),
                None => line.line.to_string(),
            };
            let _ = writeln!(out, "{INDENT}[commenting on line {range}]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_focus_matches_side() {
        let focus = Focus::Line(LineRef::left(4));
        assert!(line_focused(&focus, Some(4), Some(6)));
        assert!(!line_focused(&focus, Some(6), Some(4)));
        assert!(!line_focused(&Focus::None, Some(4), Some(4)));
    }

    #[test]
    fn test_marker_prefers_focus() {
        assert_eq!(marker(true, true), '>');
        assert_eq!(marker(false, true), '|');
        assert_eq!(marker(false, false), ' ');
    }
}
