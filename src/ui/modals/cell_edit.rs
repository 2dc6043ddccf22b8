use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::database::CellValue;
use crate::ui::modal_manager::{Modal, ModalAction, ModalResult};

/// Single-line prompt for one grid cell. Enter commits the text, Ctrl-N
/// commits NULL. The database coerces the value on save.
#[derive(Debug)]
pub struct CellEditModal {
    title: String,
    row: usize,
    column: usize,
    data_type: String,
    content: String,
    /// Cursor position in chars
    cursor: usize,
}

impl CellEditModal {
    pub fn new(
        row: usize,
        column: usize,
        column_name: &str,
        data_type: &str,
        current: &CellValue,
    ) -> Self {
        let content = current.clone().unwrap_or_default();
        Self {
            title: format!("Edit {} (row {})", column_name, row + 1),
            row,
            column,
            data_type: data_type.to_string(),
            cursor: content.chars().count(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn display_text_with_cursor(&self) -> String {
        let (before, after) = self.content.split_at(self.byte_index());
        format!("{}|{}", before, after)
    }
}

impl Modal for CellEditModal {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.config.theme;
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent_color()))
            .style(
                Style::default()
                    .fg(theme.text_color())
                    .bg(theme.surface1_color()),
            );
        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner_area);

        frame.render_widget(
            Paragraph::new(format!("Type: {}", self.data_type))
                .style(Style::default().fg(theme.subtext0_color())),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(self.display_text_with_cursor())
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(theme.text_color())),
            chunks[1],
        );
        frame.render_widget(
            Paragraph::new("Enter: apply   Ctrl-N: NULL   Esc: cancel")
                .style(Style::default().fg(theme.subtext1_color())),
            chunks[2],
        );
    }

    fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> ModalResult {
        match key {
            KeyCode::Esc => return ModalResult::Closed,
            KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => {
                return ModalResult::Action(ModalAction::CommitCell {
                    row: self.row,
                    column: self.column,
                    value: None,
                })
            }
            KeyCode::Enter => {
                return ModalResult::Action(ModalAction::CommitCell {
                    row: self.row,
                    column: self.column,
                    value: Some(self.content.clone()),
                })
            }
            KeyCode::Char(c) => {
                let at = self.byte_index();
                self.content.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index();
                    self.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.chars().count() {
                    let at = self.byte_index();
                    self.content.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.content.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.chars().count(),
            _ => {}
        }
        ModalResult::Continue
    }

    fn get_title(&self) -> &str {
        &self.title
    }

    fn get_size(&self) -> (u16, u16) {
        (50, 25)
    }
}
