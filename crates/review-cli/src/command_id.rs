//! Command identifiers
//!
//! Commands are the semantic actions a key can trigger. Keys map to
//! commands through the keymap; commands map to store actions or session
//! calls in the replay driver.

use serde::{Deserialize, Serialize};

/// The enum is serialized as snake_case (e.g., `NavigateDown` -> `"navigate_down"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandId {
    // === Cursor ===
    NavigateDown,
    NavigateUp,
    PageDown,
    PageUp,
    /// Switch to the left column in split view
    NavigateLeft,
    /// Switch to the right column in split view
    NavigateRight,
    ExtendSelectionDown,
    ExtendSelectionUp,
    ClearFocus,

    // === Files ===
    FileNext,
    FilePrevious,
    FileNextUnviewed,
    FileToggleViewed,

    // === Diff ===
    ToggleDiffViewMode,
    ExpandSkipBlock,
    /// Start the goto-line prompt; digits that follow are the target
    GotoLine,

    // === Comments ===
    StartCommenting,

    // === History ===
    HistoryBack,
    HistoryForward,
}

impl CommandId {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            CommandId::NavigateDown => "Move down",
            CommandId::NavigateUp => "Move up",
            CommandId::PageDown => "Jump down a page",
            CommandId::PageUp => "Jump up a page",
            CommandId::NavigateLeft => "Switch to the old side",
            CommandId::NavigateRight => "Switch to the new side",
            CommandId::ExtendSelectionDown => "Extend selection down",
            CommandId::ExtendSelectionUp => "Extend selection up",
            CommandId::ClearFocus => "Clear the cursor",
            CommandId::FileNext => "Next file",
            CommandId::FilePrevious => "Previous file",
            CommandId::FileNextUnviewed => "Next unviewed file",
            CommandId::FileToggleViewed => "Toggle file viewed",
            CommandId::ToggleDiffViewMode => "Toggle unified/split view",
            CommandId::ExpandSkipBlock => "Expand hidden lines",
            CommandId::GotoLine => "Go to line",
            CommandId::StartCommenting => "Comment on selection",
            CommandId::HistoryBack => "Back",
            CommandId::HistoryForward => "Forward",
        }
    }
}
