//! Per-line syntax highlighting with syntect.
//!
//! Lines are highlighted independently, so constructs spanning several lines
//! (block comments, raw strings) are coloured as if each line stood alone.

use crate::model::{Rgb, Segment};
use log::warn;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const DEFAULT_THEME: &str = "base16-ocean.dark";
const DEFAULT_CAPACITY: usize = 5000;

/// `(syntax index, line content)`; identical lines of one language share an entry.
type LineKey = (usize, String);

pub struct DiffHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
    /// Resolved syntax per lowercased file extension.
    by_extension: HashMap<String, usize>,
    lines: HashMap<LineKey, Vec<Segment>>,
    /// Insertion order of `lines`, oldest first.
    order: VecDeque<LineKey>,
    capacity: usize,
}

impl std::fmt::Debug for DiffHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffHighlighter")
            .field("cached_lines", &self.lines.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for DiffHighlighter {
    fn default() -> Self {
        Self::with_theme_name(DEFAULT_THEME)
    }
}

impl DiffHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the named syntect theme, or the default one when it is unknown.
    pub fn with_theme_name(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes.remove(theme_name).unwrap_or_else(|| {
            warn!("Unknown syntax theme '{}', using {}", theme_name, DEFAULT_THEME);
            themes.remove(DEFAULT_THEME).unwrap_or_default()
        });

        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
            by_extension: HashMap::new(),
            lines: HashMap::new(),
            order: VecDeque::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Bound the number of cached lines (at least one).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn cached_lines(&self) -> usize {
        self.lines.len()
    }

    /// Highlight one line of the file at `path`.
    pub fn highlight_line(&mut self, path: &str, content: &str) -> Vec<Segment> {
        let syntax = self.syntax_for(path);
        let key = (syntax, content.to_string());
        if let Some(segments) = self.lines.get(&key) {
            return segments.clone();
        }

        let segments = self.highlight_uncached(syntax, content);
        while self.lines.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.lines.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.lines.insert(key, segments.clone());
        segments
    }

    fn syntax_for(&mut self, path: &str) -> usize {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if let Some(&index) = self.by_extension.get(&extension) {
            return index;
        }

        let syntax = self
            .syntaxes
            .find_syntax_by_extension(&extension)
            .or_else(|| self.syntaxes.find_syntax_for_file(path).ok().flatten())
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let index = self
            .syntaxes
            .syntaxes()
            .iter()
            .position(|s| s.name == syntax.name)
            .unwrap_or_default();

        self.by_extension.insert(extension, index);
        index
    }

    fn syntax(&self, index: usize) -> &SyntaxReference {
        self.syntaxes
            .syntaxes()
            .get(index)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    fn highlight_uncached(&self, syntax: usize, content: &str) -> Vec<Segment> {
        let mut lines = HighlightLines::new(self.syntax(syntax), &self.theme);
        match lines.highlight_line(content, &self.syntaxes) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(style, text)| to_segment(style, text))
                .collect(),
            Err(e) => {
                warn!("Highlighting failed, showing plain text: {}", e);
                vec![Segment::plain(content)]
            }
        }
    }
}

fn to_segment(style: Style, text: &str) -> Segment {
    let fg = style.foreground;
    Segment {
        text: text.to_string(),
        fg: Some(Rgb(fg.r, fg.g, fg.b)),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(segments: &[Segment]) -> String {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_segments_cover_the_line() {
        let mut highlighter = DiffHighlighter::new();
        let segments = highlighter.highlight_line("src/main.rs", "fn main() {}");

        assert_eq!(text(&segments), "fn main() {}");
        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.fg.is_some()));
    }

    #[test]
    fn test_same_language_shares_cache_entries() {
        let mut highlighter = DiffHighlighter::new();

        highlighter.highlight_line("a.rs", "let x = 1;");
        highlighter.highlight_line("b/c.rs", "let x = 1;");
        assert_eq!(highlighter.cached_lines(), 1);

        highlighter.highlight_line("a.rs", "let y = 2;");
        assert_eq!(highlighter.cached_lines(), 2);
    }

    #[test]
    fn test_oldest_lines_evicted_first() {
        let mut highlighter = DiffHighlighter::new().with_capacity(3);
        for i in 0..5 {
            highlighter.highlight_line("a.rs", &format!("let v{i} = {i};"));
        }

        assert_eq!(highlighter.cached_lines(), 3);
        let rust = highlighter.syntax_for("a.rs");
        assert!(!highlighter.lines.contains_key(&(rust, "let v0 = 0;".to_string())));
        assert!(highlighter.lines.contains_key(&(rust, "let v4 = 4;".to_string())));
    }

    #[test]
    fn test_unknown_theme_and_extension_fall_back() {
        let mut highlighter = DiffHighlighter::with_theme_name("no-such-theme");
        let segments = highlighter.highlight_line("notes.unknown-ext", "some content");
        assert_eq!(text(&segments), "some content");
    }
}
