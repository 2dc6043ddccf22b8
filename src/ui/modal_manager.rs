use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use std::fmt;

use crate::app::{App, PendingAction};
use crate::database::CellValue;

/// What a modal asks the application to do once it closes.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalAction {
    /// The user accepted a prompt guarding this action.
    Confirm(PendingAction),
    /// New value for one grid cell.
    CommitCell {
        row: usize,
        column: usize,
        value: CellValue,
    },
}

/// Result of modal input handling
#[derive(Debug, Clone, PartialEq)]
pub enum ModalResult {
    /// Modal should be closed
    Closed,
    /// Modal handled input, continue processing
    Continue,
    /// Modal wants to perform an action and close
    Action(ModalAction),
}

/// Trait that all modals must implement
pub trait Modal: fmt::Debug {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App);

    fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> ModalResult;

    fn get_title(&self) -> &str;

    /// Preferred size (width, height) as percentages of the screen
    fn get_size(&self) -> (u16, u16) {
        (60, 30)
    }
}

/// Manages a stack of modals with LIFO behavior
#[derive(Default)]
pub struct ModalManager {
    stack: Vec<Box<dyn Modal>>,
}

impl ModalManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modal: Box<dyn Modal>) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Box<dyn Modal>> {
        self.stack.pop()
    }

    pub fn has_modals(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn get_active_title(&self) -> Option<String> {
        self.stack.last().map(|m| m.get_title().to_string())
    }

    /// Routes a key to the top modal and pops it when it is done.
    pub fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Option<ModalResult> {
        let result = self.stack.last_mut()?.handle_input(key, modifiers);
        if result != ModalResult::Continue {
            self.pop();
        }
        Some(result)
    }

    pub fn render_all(&self, frame: &mut Frame, app: &App) {
        for modal in &self.stack {
            let (width, height) = modal.get_size();
            let area = centered_rect(width, height, frame.area());
            modal.render(frame, area, app);
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    use ratatui::layout::{Constraint, Direction, Layout};

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
