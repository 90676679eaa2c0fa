//! Parse per-file unified patches (as returned by GitHub API).

use crate::error::ParseError;
use crate::highlight::DiffHighlighter;
use crate::model::{DiffLine, DiffSegment, Hunk, LineKind, ParsedDiff, SkipBlock};
use crate::traits::DiffParser;
use std::sync::Mutex;
use unidiff::{Hunk as UnidiffHunk, Line as UnidiffLine, PatchSet};

/// Default [`DiffParser`] built on `unidiff` and `syntect`.
#[derive(Debug, Default)]
pub struct UnifiedDiffParser {
    highlighter: Mutex<DiffHighlighter>,
}

impl UnifiedDiffParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that highlights with the named syntect theme.
    pub fn with_theme(theme_name: &str) -> Self {
        Self {
            highlighter: Mutex::new(DiffHighlighter::with_theme_name(theme_name)),
        }
    }

    fn highlighter(&self) -> std::sync::MutexGuard<'_, DiffHighlighter> {
        self.highlighter.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiffParser for UnifiedDiffParser {
    fn parse(
        &self,
        patch: &str,
        filename: &str,
        previous_filename: Option<&str>,
        old_content: Option<&str>,
        new_content: Option<&str>,
    ) -> Result<ParsedDiff, ParseError> {
        if patch.trim().is_empty() {
            return Ok(ParsedDiff::default());
        }

        let text = with_file_headers(patch, filename, previous_filename);
        let mut patch_set = PatchSet::new();
        patch_set
            .parse(&text)
            .map_err(|e| ParseError::ParseFailed(e.to_string()))?;

        let file = patch_set
            .files()
            .into_iter()
            .next()
            .ok_or(ParseError::InvalidFormat)?;

        let mut highlighter = self.highlighter();
        let hunks: Vec<Hunk> = file
            .hunks()
            .into_iter()
            .map(|hunk| parse_hunk(hunk, filename, &mut highlighter))
            .collect();

        let trailing = match (new_content, old_content) {
            (Some(content), _) => Some(TrailingLines::New(line_count(content))),
            (None, Some(content)) => Some(TrailingLines::Old(line_count(content))),
            (None, None) => None,
        };

        Ok(ParsedDiff::new(with_skip_blocks(hunks, trailing)))
    }

    fn highlight_range(
        &self,
        content: &str,
        filename: &str,
        start_line: u32,
        count: u32,
    ) -> Vec<DiffLine> {
        let first = start_line.max(1);
        let mut highlighter = self.highlighter();
        content
            .lines()
            .skip((first - 1) as usize)
            .take(count as usize)
            .zip(first..)
            .map(|(text, number)| {
                let mut line = DiffLine::context(text, number, number);
                line.segments = highlighter.highlight_line(filename, text);
                line
            })
            .collect()
    }
}

/// Code hosts return hunks without the `---`/`+++` header `unidiff` needs.
fn with_file_headers(patch: &str, filename: &str, previous_filename: Option<&str>) -> String {
    let mut text = if patch.starts_with("diff --git") || patch.starts_with("--- ") {
        patch.to_string()
    } else {
        format!(
            "--- a/{}\n+++ b/{}\n{}",
            previous_filename.unwrap_or(filename),
            filename,
            patch
        )
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn parse_hunk(hunk: &UnidiffHunk, filename: &str, highlighter: &mut DiffHighlighter) -> Hunk {
    let mut parsed = Hunk::new(
        hunk.source_start as u32,
        hunk.source_length as u32,
        hunk.target_start as u32,
        hunk.target_length as u32,
    );

    // Extract function context from section header if available
    let header = hunk.section_header.trim();
    if !header.is_empty() {
        parsed.header = format!("{} {}", parsed.header, header);
    }

    for line in hunk.lines() {
        if let Some(mut diff_line) = parse_line(line) {
            diff_line.segments = highlighter.highlight_line(filename, &diff_line.content);
            parsed.lines.push(diff_line);
        }
    }

    parsed
}

fn parse_line(line: &UnidiffLine) -> Option<DiffLine> {
    let content = line.value.trim_end_matches(['\n', '\r']).to_string();
    let source_line = line.source_line_no.map(|n| n as u32);
    let target_line = line.target_line_no.map(|n| n as u32);

    let kind = match line.line_type.as_str() {
        "+" => LineKind::Insert,
        "-" => LineKind::Delete,
        " " => LineKind::Context,
        // "\ No newline at end of file" carries no line of its own
        _ => return None,
    };

    Some(DiffLine {
        kind,
        content,
        old_line: source_line,
        new_line: target_line,
        segments: Vec::new(),
    })
}

/// Total length of the file on one side, used for the block after the last hunk.
enum TrailingLines {
    New(u32),
    Old(u32),
}

fn line_count(content: &str) -> u32 {
    content.lines().count() as u32
}

/// Interleave hunks with skip blocks covering the unchanged gaps.
fn with_skip_blocks(hunks: Vec<Hunk>, trailing: Option<TrailingLines>) -> Vec<DiffSegment> {
    let mut segments = Vec::with_capacity(hunks.len() * 2 + 1);
    let mut prev_old = 0;
    let mut prev_new = 0;
    let mut index = 0;

    for hunk in hunks {
        let gap = if hunk.new_count > 0 {
            hunk.new_start.saturating_sub(prev_new + 1)
        } else {
            hunk.old_start.saturating_sub(prev_old + 1)
        };
        if gap > 0 {
            segments.push(DiffSegment::Skip(SkipBlock {
                index,
                old_start: prev_old + 1,
                new_start: prev_new + 1,
                count: gap,
            }));
            index += 1;
        }
        prev_old = hunk.old_end();
        prev_new = hunk.new_end();
        segments.push(DiffSegment::Hunk(hunk));
    }

    let remaining = match trailing {
        Some(TrailingLines::New(total)) => total.saturating_sub(prev_new),
        Some(TrailingLines::Old(total)) => total.saturating_sub(prev_old),
        None => 0,
    };
    if remaining > 0 && !segments.is_empty() {
        segments.push(DiffSegment::Skip(SkipBlock {
            index,
            old_start: prev_old + 1,
            new_start: prev_new + 1,
            count: remaining,
        }));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_HUNKS: &str = "@@ -3,3 +3,4 @@ fn main()\n a\n b\n+c\n d\n@@ -10,2 +11,2 @@\n x\n-y\n+z\n";

    fn parse(patch: &str, new_content: Option<&str>) -> ParsedDiff {
        UnifiedDiffParser::new()
            .parse(patch, "src/main.rs", None, None, new_content)
            .unwrap()
    }

    #[test]
    fn test_parse_hunk_without_file_headers() {
        let diff = parse("@@ -1,3 +1,3 @@\n a\n-b\n+c\n d", None);

        let hunks: Vec<&Hunk> = diff.hunks().collect();
        assert_eq!(hunks.len(), 1);
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 4);

        assert_eq!(lines[0].kind, LineKind::Context);
        assert_eq!((lines[0].old_line, lines[0].new_line), (Some(1), Some(1)));
        assert_eq!(lines[1].kind, LineKind::Delete);
        assert_eq!((lines[1].old_line, lines[1].new_line), (Some(2), None));
        assert_eq!(lines[2].kind, LineKind::Insert);
        assert_eq!((lines[2].old_line, lines[2].new_line), (None, Some(2)));
        assert_eq!(lines[2].content, "c");
        assert!(!lines[2].segments.is_empty());
    }

    #[test]
    fn test_skip_blocks_between_hunks() {
        let diff = parse(TWO_HUNKS, None);

        let skips: Vec<SkipBlock> = diff.skip_blocks().copied().collect();
        assert_eq!(
            skips,
            vec![
                SkipBlock {
                    index: 0,
                    old_start: 1,
                    new_start: 1,
                    count: 2,
                },
                SkipBlock {
                    index: 1,
                    old_start: 6,
                    new_start: 7,
                    count: 4,
                },
            ]
        );
        assert!(matches!(diff.segments[0], DiffSegment::Skip(_)));
        assert!(matches!(diff.segments[1], DiffSegment::Hunk(_)));
        assert!(diff.hunks().next().unwrap().header.contains("fn main()"));
    }

    #[test]
    fn test_trailing_skip_block_needs_content() {
        let content: String = (1..=20).map(|n| format!("line {n}\n")).collect();
        let diff = parse(TWO_HUNKS, Some(&content));

        let last = diff.skip_blocks().last().copied().unwrap();
        assert_eq!(last.index, 2);
        assert_eq!(last.new_start, 13);
        assert_eq!(last.old_start, 12);
        assert_eq!(last.count, 8);

        assert_eq!(parse(TWO_HUNKS, None).skip_blocks().count(), 2);
    }

    #[test]
    fn test_full_git_diff_is_accepted() {
        let patch = "diff --git a/new_file.rs b/new_file.rs\nnew file mode 100644\nindex 0000000..abc1234\n--- /dev/null\n+++ b/new_file.rs\n@@ -0,0 +1,3 @@\n+fn f() {\n+    // new code\n+}\n";
        let diff = parse(patch, None);

        assert_eq!(diff.additions(), 3);
        assert_eq!(diff.skip_blocks().count(), 0);
    }

    #[test]
    fn test_empty_patch() {
        let diff = parse("", Some("a\nb\n"));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_highlight_range() {
        let content = "one\ntwo\nthree\nfour\n";
        let lines = UnifiedDiffParser::new().highlight_range(content, "notes.txt", 2, 2);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "two");
        assert_eq!((lines[0].old_line, lines[0].new_line), (Some(2), Some(2)));
        assert_eq!(lines[1].content, "three");
        assert_eq!(lines[1].kind, LineKind::Context);
    }

    #[test]
    fn test_file_headers_use_previous_name() {
        let text = with_file_headers("@@ -1 +1 @@\n-a\n+b", "new.rs", Some("old.rs"));
        assert!(text.starts_with("--- a/old.rs\n+++ b/new.rs\n@@"));
        assert!(text.ends_with('\n'));
    }
}
