//! Keybindings
//!
//! Maps single key presses to commands. Keys are case-sensitive, so `j` and
//! `J` can be bound to different commands.

use crate::command_id::CommandId;
use serde::{Deserialize, Serialize};

/// A single keybinding that maps a key to a command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: char,
    pub command: CommandId,
}

impl KeyBinding {
    pub fn new(key: char, command: CommandId) -> Self {
        Self { key, command }
    }
}

/// Collection of bindings. The first binding for a key wins.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    pub fn command_for(&self, key: char) -> Option<CommandId> {
        self.bindings
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.command)
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }
}

/// Get the default keymap
pub fn default_keymap() -> Keymap {
    use CommandId::*;

    let bindings = vec![
        // Cursor
        KeyBinding::new('j', NavigateDown),
        KeyBinding::new('k', NavigateUp),
        KeyBinding::new('J', PageDown),
        KeyBinding::new('K', PageUp),
        KeyBinding::new('h', NavigateLeft),
        KeyBinding::new('l', NavigateRight),
        KeyBinding::new('V', ExtendSelectionDown),
        KeyBinding::new('U', ExtendSelectionUp),
        KeyBinding::new('q', ClearFocus),
        // Files
        KeyBinding::new('n', FileNext),
        KeyBinding::new('p', FilePrevious),
        KeyBinding::new('N', FileNextUnviewed),
        KeyBinding::new('x', FileToggleViewed),
        // Diff
        KeyBinding::new('v', ToggleDiffViewMode),
        KeyBinding::new('e', ExpandSkipBlock),
        KeyBinding::new('g', GotoLine),
        // Comments
        KeyBinding::new('c', StartCommenting),
        // History
        KeyBinding::new('[', HistoryBack),
        KeyBinding::new(']', HistoryForward),
    ];

    Keymap::new(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_case_sensitive() {
        let keymap = default_keymap();
        assert_eq!(keymap.command_for('j'), Some(CommandId::NavigateDown));
        assert_eq!(keymap.command_for('J'), Some(CommandId::PageDown));
        assert_eq!(keymap.command_for('z'), None);
    }

    #[test]
    fn test_default_keys_are_unique() {
        let keymap = default_keymap();
        let keys: HashSet<char> = keymap.bindings().iter().map(|b| b.key).collect();
        assert_eq!(keys.len(), keymap.bindings().len());
    }

    #[test]
    fn test_first_binding_wins() {
        let keymap = Keymap::new(vec![
            KeyBinding::new('a', CommandId::FileNext),
            KeyBinding::new('a', CommandId::FilePrevious),
        ]);
        assert_eq!(keymap.command_for('a'), Some(CommandId::FileNext));
    }

    #[test]
    fn test_command_id_serializes_snake_case() {
        let json = serde_json::to_string(&CommandId::FileNextUnviewed).unwrap();
        assert_eq!(json, "\"file_next_unviewed\"");
    }
}
