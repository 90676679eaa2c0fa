//! Keyboard navigation over the selected file.

mod engine;
mod index;

pub use engine::{navigate, Direction, NavContext, NavOutcome, NavRequest};
pub use index::{closest_line, ExpandedSkips, LineItem, NavigableIndex, NavigableItem};
