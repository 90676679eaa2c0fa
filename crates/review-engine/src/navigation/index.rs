//! Navigable items of a file: one per diff line, one per collapsed skip block.

use crate::model::{DiffLine, DiffSegment, DiffSide, LineKind, LineRef, ParsedDiff};
use crate::state::Focus;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Revealed lines of expanded skip blocks, keyed by skip block index.
pub type ExpandedSkips = BTreeMap<usize, Arc<Vec<DiffLine>>>;

/// A diff line as seen by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub kind: LineKind,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

impl LineItem {
    fn from_line(line: &DiffLine) -> Self {
        Self {
            kind: line.kind,
            old_line: line.old_line,
            new_line: line.new_line,
        }
    }

    pub fn number_on(&self, side: DiffSide) -> Option<u32> {
        match side {
            DiffSide::Left => self.old_line,
            DiffSide::Right => self.new_line,
        }
    }

    pub fn ref_on(&self, side: DiffSide) -> Option<LineRef> {
        self.number_on(side).map(|line| LineRef::new(line, side))
    }

    /// The reference used when no side is preferred.
    pub fn canonical_ref(&self) -> Option<LineRef> {
        self.ref_on(self.kind.canonical_side())
    }

    /// Every reference addressing this line, old side first.
    pub fn refs(&self) -> impl Iterator<Item = LineRef> {
        self.ref_on(DiffSide::Left)
            .into_iter()
            .chain(self.ref_on(DiffSide::Right))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigableItem {
    Line(LineItem),
    Skip { index: usize, count: u32 },
}

/// Ordered navigable items plus O(1) lookups from a focus to its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigableIndex {
    items: Vec<NavigableItem>,
    line_positions: HashMap<LineRef, usize>,
    skip_positions: HashMap<usize, usize>,
}

impl NavigableIndex {
    /// Build the index in document order. Expanded skip blocks contribute
    /// their revealed lines instead of a single skip entry.
    pub fn build(diff: &ParsedDiff, expanded: &ExpandedSkips) -> Self {
        let mut index = Self::default();
        for segment in &diff.segments {
            match segment {
                DiffSegment::Hunk(hunk) => {
                    for line in &hunk.lines {
                        index.push_line(LineItem::from_line(line));
                    }
                }
                DiffSegment::Skip(skip) => match expanded.get(&skip.index) {
                    Some(lines) => {
                        for line in lines.iter() {
                            index.push_line(LineItem::from_line(line));
                        }
                    }
                    None => {
                        index.skip_positions.insert(skip.index, index.items.len());
                        index.items.push(NavigableItem::Skip {
                            index: skip.index,
                            count: skip.count,
                        });
                    }
                },
            }
        }
        index
    }

    fn push_line(&mut self, item: LineItem) {
        let position = self.items.len();
        for line_ref in item.refs() {
            self.line_positions.entry(line_ref).or_insert(position);
        }
        self.items.push(NavigableItem::Line(item));
    }

    pub fn items(&self) -> &[NavigableItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&NavigableItem> {
        self.items.get(position)
    }

    pub fn line_at(&self, position: usize) -> Option<&LineItem> {
        match self.items.get(position)? {
            NavigableItem::Line(item) => Some(item),
            NavigableItem::Skip { .. } => None,
        }
    }

    pub fn position_of_line(&self, line: LineRef) -> Option<usize> {
        self.line_positions.get(&line).copied()
    }

    pub fn position_of_skip(&self, index: usize) -> Option<usize> {
        self.skip_positions.get(&index).copied()
    }

    pub fn contains_line(&self, line: LineRef) -> bool {
        self.line_positions.contains_key(&line)
    }

    /// Focus for the item at `position`, on `preferred` side when the line
    /// exists there.
    pub fn focus_at(&self, position: usize, preferred: Option<DiffSide>) -> Option<Focus> {
        match self.items.get(position)? {
            NavigableItem::Skip { index, .. } => Some(Focus::SkipBlock(*index)),
            NavigableItem::Line(item) => preferred
                .and_then(|side| item.ref_on(side))
                .or_else(|| item.canonical_ref())
                .map(Focus::Line),
        }
    }
}

/// Find the navigable line on `side` whose number is closest to `target`.
/// Ties go to the first occurrence in document order.
pub fn closest_line(index: &NavigableIndex, target: u32, side: DiffSide) -> Option<LineRef> {
    let mut best: Option<(u32, LineRef)> = None;
    for item in index.items() {
        let NavigableItem::Line(line) = item else {
            continue;
        };
        let Some(number) = line.number_on(side) else {
            continue;
        };
        let distance = number.abs_diff(target);
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, LineRef::new(number, side)));
        }
    }
    best.map(|(_, line)| line)
}
