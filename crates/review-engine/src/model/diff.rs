//! Diff data structures representing one file's changes.

use super::DiffSide;

/// A parsed file diff: hunks interleaved with collapsed skip blocks, in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    pub segments: Vec<DiffSegment>,
}

impl ParsedDiff {
    pub fn new(segments: Vec<DiffSegment>) -> Self {
        Self { segments }
    }

    /// Look up a skip block by its index.
    pub fn skip_block(&self, index: usize) -> Option<&SkipBlock> {
        self.segments.iter().find_map(|segment| match segment {
            DiffSegment::Skip(skip) if skip.index == index => Some(skip),
            _ => None,
        })
    }

    /// Iterate over all skip blocks.
    pub fn skip_blocks(&self) -> impl Iterator<Item = &SkipBlock> {
        self.segments.iter().filter_map(|segment| match segment {
            DiffSegment::Skip(skip) => Some(skip),
            DiffSegment::Hunk(_) => None,
        })
    }

    /// Iterate over all hunks.
    pub fn hunks(&self) -> impl Iterator<Item = &Hunk> {
        self.segments.iter().filter_map(|segment| match segment {
            DiffSegment::Hunk(hunk) => Some(hunk),
            DiffSegment::Skip(_) => None,
        })
    }

    /// Look up a hunk line by (segment index, line index).
    pub fn line_at(&self, segment: usize, line: usize) -> Option<&DiffLine> {
        match self.segments.get(segment)? {
            DiffSegment::Hunk(hunk) => hunk.lines.get(line),
            DiffSegment::Skip(_) => None,
        }
    }

    /// Number of inserted lines.
    pub fn additions(&self) -> usize {
        self.hunks()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Insert)
            .count()
    }

    /// Number of deleted lines.
    pub fn deletions(&self) -> usize {
        self.hunks()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Delete)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// One entry of a parsed diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSegment {
    Hunk(Hunk),
    Skip(SkipBlock),
}

/// A contiguous region of changes (hunk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Header line (e.g., "@@ -10,5 +10,7 @@ fn example()").
    pub header: String,
    /// Old file starting line.
    pub old_start: u32,
    /// Number of lines in old version.
    pub old_count: u32,
    /// New file starting line.
    pub new_start: u32,
    /// Number of lines in new version.
    pub new_count: u32,
    /// Lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Create a new hunk with the given header info.
    pub fn new(old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> Self {
        Self {
            header: format!(
                "@@ -{},{} +{},{} @@",
                old_start, old_count, new_start, new_count
            ),
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        }
    }

    /// Last old-side line covered by this hunk (the line before it when empty).
    pub fn old_end(&self) -> u32 {
        if self.old_count == 0 {
            self.old_start
        } else {
            self.old_start + self.old_count - 1
        }
    }

    /// Last new-side line covered by this hunk (the line before it when empty).
    pub fn new_end(&self) -> u32 {
        if self.new_count == 0 {
            self.new_start
        } else {
            self.new_start + self.new_count - 1
        }
    }
}

/// A collapsed run of unchanged lines between (or around) hunks.
///
/// The revealed lines of an expanded block live in the session state, not
/// here, so a cached diff stays immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipBlock {
    /// Position among the skip blocks of the diff (0-based, document order).
    pub index: usize,
    /// First elided line in the old file.
    pub old_start: u32,
    /// First elided line in the new file.
    pub new_start: u32,
    /// Number of elided lines.
    pub count: u32,
}

/// A single line in the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Line type.
    pub kind: LineKind,
    /// Line content (without leading +/-/ ).
    pub content: String,
    /// Line number in old file (for Context and Delete).
    pub old_line: Option<u32>,
    /// Line number in new file (for Context and Insert).
    pub new_line: Option<u32>,
    /// Pre-rendered, syntax-highlighted content.
    pub segments: Vec<Segment>,
}

impl DiffLine {
    /// Create a new context line.
    pub fn context(content: impl Into<String>, old_line: u32, new_line: u32) -> Self {
        Self::build(LineKind::Context, content, Some(old_line), Some(new_line))
    }

    /// Create a new insert line.
    pub fn insert(content: impl Into<String>, new_line: u32) -> Self {
        Self::build(LineKind::Insert, content, None, Some(new_line))
    }

    /// Create a new delete line.
    pub fn delete(content: impl Into<String>, old_line: u32) -> Self {
        Self::build(LineKind::Delete, content, Some(old_line), None)
    }

    fn build(
        kind: LineKind,
        content: impl Into<String>,
        old_line: Option<u32>,
        new_line: Option<u32>,
    ) -> Self {
        let content = content.into();
        Self {
            kind,
            segments: vec![Segment::plain(content.clone())],
            content,
            old_line,
            new_line,
        }
    }

    /// Line number on the given side, if the line exists there.
    pub fn number_on(&self, side: DiffSide) -> Option<u32> {
        match side {
            DiffSide::Left => self.old_line,
            DiffSide::Right => self.new_line,
        }
    }
}

/// Line type in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Unchanged line (for context).
    Context,
    /// Added line (+).
    Insert,
    /// Removed line (-).
    Delete,
}

impl LineKind {
    /// Get the prefix character for this line type.
    pub fn prefix(&self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Insert => '+',
            LineKind::Delete => '-',
        }
    }

    /// The side a line of this kind is addressed by when no side is chosen
    /// explicitly.
    pub fn canonical_side(&self) -> DiffSide {
        match self {
            LineKind::Delete => DiffSide::Left,
            LineKind::Context | LineKind::Insert => DiffSide::Right,
        }
    }
}

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A syntax-highlighted span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The text content.
    pub text: String,
    /// Foreground color.
    pub fg: Option<Rgb>,
    /// Bold style.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline style.
    pub underline: bool,
}

impl Segment {
    /// Create a plain span with no styling.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: None,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}
