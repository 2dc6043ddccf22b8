use crate::ui::types::Direction;
use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

/// Represents all possible actions in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the cursor in the focused pane.
    Move(Direction),
    FocusNext,
    FocusPrevious,
    /// Select the highlighted candidate, or edit the focused cell.
    Select,
    /// Clear the focused selector and everything below it.
    ClearSelection,
    AddRow,
    DeleteRow,
    SetNull,
    Save,
    Reset,
    Quit,
}

/// Defines the key configuration for different actions. Every entry can be
/// overridden from `[keymap]`; omitted keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyConfig {
    pub left_key: char,       // Default: 'h'
    pub right_key: char,      // Default: 'l'
    pub up_key: char,         // Default: 'k'
    pub down_key: char,       // Default: 'j'
    pub add_row_key: char,    // Default: 'o'
    pub delete_row_key: char, // Default: 'd'
    pub set_null_key: char,   // Default: 'x'
    pub save_key: char,       // Default: 's'
    pub reset_key: char,      // Default: 'r'
    pub quit_key: char,       // Default: 'q'
}

impl Default for KeyConfig {
    /// Vim-style movement, single letters for table actions.
    fn default() -> Self {
        Self {
            left_key: 'h',
            right_key: 'l',
            up_key: 'k',
            down_key: 'j',
            add_row_key: 'o',
            delete_row_key: 'd',
            set_null_key: 'x',
            save_key: 's',
            reset_key: 'r',
            quit_key: 'q',
        }
    }
}

impl KeyConfig {
    /// Maps a key event to an `Action` based on the current key configuration.
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        if modifiers.contains(KeyModifiers::CONTROL) {
            return match code {
                KeyCode::Char('c') => Some(Action::Quit),
                _ => None,
            };
        }

        match code {
            KeyCode::Tab => Some(Action::FocusNext),
            KeyCode::BackTab => Some(Action::FocusPrevious),
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Backspace | KeyCode::Delete => Some(Action::ClearSelection),
            KeyCode::Left => Some(Action::Move(Direction::Left)),
            KeyCode::Right => Some(Action::Move(Direction::Right)),
            KeyCode::Up => Some(Action::Move(Direction::Up)),
            KeyCode::Down => Some(Action::Move(Direction::Down)),
            KeyCode::Char(c) => match c {
                c if c == self.left_key => Some(Action::Move(Direction::Left)),
                c if c == self.right_key => Some(Action::Move(Direction::Right)),
                c if c == self.up_key => Some(Action::Move(Direction::Up)),
                c if c == self.down_key => Some(Action::Move(Direction::Down)),
                c if c == self.add_row_key => Some(Action::AddRow),
                c if c == self.delete_row_key => Some(Action::DeleteRow),
                c if c == self.set_null_key => Some(Action::SetNull),
                c if c == self.save_key => Some(Action::Save),
                c if c == self.reset_key => Some(Action::Reset),
                c if c == self.quit_key => Some(Action::Quit),
                _ => None,
            },
            _ => None,
        }
    }

    /// One-line key legend for the footer.
    pub fn hints(&self) -> String {
        format!(
            "Tab:focus  Enter:select/edit  {}:add  {}:delete  {}:null  {}:save  {}:reset  {}:quit",
            self.add_row_key,
            self.delete_row_key,
            self.set_null_key,
            self.save_key,
            self.reset_key,
            self.quit_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_map_to_table_actions() {
        let keys = KeyConfig::default();
        let none = KeyModifiers::NONE;
        assert_eq!(keys.get_action(KeyCode::Char('o'), none), Some(Action::AddRow));
        assert_eq!(keys.get_action(KeyCode::Char('d'), none), Some(Action::DeleteRow));
        assert_eq!(keys.get_action(KeyCode::Char('s'), none), Some(Action::Save));
        assert_eq!(
            keys.get_action(KeyCode::Char('j'), none),
            Some(Action::Move(Direction::Down))
        );
        assert_eq!(keys.get_action(KeyCode::BackTab, KeyModifiers::SHIFT), Some(Action::FocusPrevious));
        assert_eq!(keys.get_action(KeyCode::Char('z'), none), None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let keys = KeyConfig::default();
        assert_eq!(
            keys.get_action(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Action::Quit)
        );
        assert_eq!(keys.get_action(KeyCode::Char('s'), KeyModifiers::CONTROL), None);
    }

    #[test]
    fn partial_keymap_keeps_other_defaults() {
        let keys: KeyConfig = toml::from_str("save_key = 'w'").unwrap();
        assert_eq!(keys.save_key, 'w');
        assert_eq!(keys.quit_key, 'q');
        assert_eq!(
            keys.get_action(KeyCode::Char('w'), KeyModifiers::NONE),
            Some(Action::Save)
        );
    }
}
