//! Encoding of the review position as a URL fragment.
//!
//! Grammar: `file=<percent-encoded path>` optionally followed by exactly one
//! of `L=<n>`, `L=<n>-<m>`, `comment=<id>` or `pending=<uuid>`. Parameters
//! may come in any order.

use crate::error::DeepLinkError;
use crate::model::LineRef;
use crate::navigation::NavigableIndex;
use crate::state::{Focus, ReviewState};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

/// Path characters left readable in links.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The focus part of a link. Lines carry no side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkFocus {
    #[default]
    None,
    Line(u32),
    /// `(anchor, focus)`; the focused end is the second one.
    Range(u32, u32),
    Comment(u64),
    Pending(Uuid),
}

impl LinkFocus {
    /// Translate into a focus and selection anchor for the file whose
    /// navigable items are `index`.
    ///
    /// A line number is placed on the new side when the file has it there,
    /// otherwise on the old side when it has it there. Lines not in the
    /// index (including while the diff is still loading) land on the new
    /// side.
    pub fn resolve(&self, index: &NavigableIndex) -> (Focus, Option<LineRef>) {
        match *self {
            LinkFocus::None => (Focus::None, None),
            LinkFocus::Line(line) => (Focus::Line(resolve_line(index, line)), None),
            LinkFocus::Range(anchor, focus) => {
                let focused = resolve_line(index, focus);
                (
                    Focus::Line(focused),
                    Some(LineRef::new(anchor, focused.side)),
                )
            }
            LinkFocus::Comment(id) => (Focus::Comment(id), None),
            LinkFocus::Pending(id) => (Focus::PendingComment(id), None),
        }
    }
}

fn resolve_line(index: &NavigableIndex, line: u32) -> LineRef {
    let right = LineRef::right(line);
    let left = LineRef::left(line);
    if !index.contains_line(right) && index.contains_line(left) {
        left
    } else {
        right
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub path: String,
    pub focus: LinkFocus,
}

impl DeepLink {
    pub fn new(path: impl Into<String>, focus: LinkFocus) -> Self {
        Self {
            path: path.into(),
            focus,
        }
    }

    /// The link for the current position, or `None` with no file selected.
    pub fn from_state(state: &ReviewState) -> Option<Self> {
        let path = state.selected_file.clone()?;
        let focus = match state.focus {
            Focus::None | Focus::SkipBlock(_) => LinkFocus::None,
            Focus::Line(line) => match state.selection_anchor {
                Some(anchor) if anchor != line => LinkFocus::Range(anchor.line, line.line),
                _ => LinkFocus::Line(line.line),
            },
            Focus::Comment(id) => LinkFocus::Comment(id),
            Focus::PendingComment(id) => LinkFocus::Pending(id),
        };
        Some(Self { path, focus })
    }

    pub fn encode(&self) -> String {
        let mut out = format!("file={}", utf8_percent_encode(&self.path, PATH_ENCODE_SET));
        match self.focus {
            LinkFocus::None => {}
            LinkFocus::Line(line) => out.push_str(&format!("&L={line}")),
            LinkFocus::Range(anchor, focus) => out.push_str(&format!("&L={anchor}-{focus}")),
            LinkFocus::Comment(id) => out.push_str(&format!("&comment={id}")),
            LinkFocus::Pending(id) => out.push_str(&format!("&pending={id}")),
        }
        out
    }

    /// Parse a fragment, with or without its leading `#`.
    pub fn parse(input: &str) -> Result<Self, DeepLinkError> {
        let input = input.strip_prefix('#').unwrap_or(input);
        let mut path: Option<String> = None;
        let mut focus: Option<LinkFocus> = None;

        for pair in input.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| DeepLinkError::Malformed(pair.to_string()))?;

            match key {
                "file" => {
                    if path.is_some() {
                        return Err(DeepLinkError::Duplicate(key.to_string()));
                    }
                    let decoded = percent_decode_str(value)
                        .decode_utf8()
                        .map_err(|_| DeepLinkError::Malformed(pair.to_string()))?;
                    path = Some(decoded.into_owned());
                }
                "L" | "comment" | "pending" => {
                    if focus.is_some() {
                        return Err(DeepLinkError::ConflictingFocus);
                    }
                    focus = Some(parse_focus(key, value)?);
                }
                _ => return Err(DeepLinkError::UnknownKey(key.to_string())),
            }
        }

        let path = path
            .filter(|p| !p.is_empty())
            .ok_or(DeepLinkError::MissingFile)?;
        Ok(Self {
            path,
            focus: focus.unwrap_or_default(),
        })
    }
}

fn parse_focus(key: &str, value: &str) -> Result<LinkFocus, DeepLinkError> {
    match key {
        "L" => {
            let line = |s: &str| {
                s.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| DeepLinkError::InvalidLine(value.to_string()))
            };
            match value.split_once('-') {
                Some((anchor, focus)) => Ok(LinkFocus::Range(line(anchor)?, line(focus)?)),
                None => Ok(LinkFocus::Line(line(value)?)),
            }
        }
        "comment" => value
            .parse::<u64>()
            .map(LinkFocus::Comment)
            .map_err(|_| DeepLinkError::InvalidComment(value.to_string())),
        _ => Uuid::parse_str(value)
            .map(LinkFocus::Pending)
            .map_err(|_| DeepLinkError::InvalidPending(value.to_string())),
    }
}
