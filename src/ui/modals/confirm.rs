use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, PendingAction};
use crate::ui::modal_manager::{Modal, ModalAction, ModalResult};

/// Yes/no prompt guarding an action that discards or overwrites data.
#[derive(Debug)]
pub struct ConfirmModal {
    title: String,
    lines: Vec<String>,
    action: PendingAction,
}

impl ConfirmModal {
    pub fn new(title: impl Into<String>, lines: Vec<String>, action: PendingAction) -> Self {
        Self {
            title: title.into(),
            lines,
            action,
        }
    }
}

impl Modal for ConfirmModal {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.config.theme;
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.warning_color()))
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
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner_area);

        let body: Vec<Line> = self.lines.iter().map(|l| Line::from(l.as_str())).collect();
        frame.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(theme.text_color())),
            chunks[0],
        );

        frame.render_widget(
            Paragraph::new("Enter/y: confirm   Esc/n: cancel").style(
                Style::default()
                    .fg(theme.accent_color())
                    .add_modifier(Modifier::BOLD),
            ),
            chunks[1],
        );
    }

    fn handle_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> ModalResult {
        match key {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                ModalResult::Action(ModalAction::Confirm(self.action.clone()))
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => ModalResult::Closed,
            _ => ModalResult::Continue,
        }
    }

    fn get_title(&self) -> &str {
        &self.title
    }

    fn get_size(&self) -> (u16, u16) {
        (60, 30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_returns_the_guarded_action() {
        let mut modal = ConfirmModal::new("Reset", vec![], PendingAction::Reset);
        assert_eq!(
            modal.handle_input(KeyCode::Char('y'), KeyModifiers::NONE),
            ModalResult::Action(ModalAction::Confirm(PendingAction::Reset))
        );
        assert_eq!(
            modal.handle_input(KeyCode::Char('n'), KeyModifiers::NONE),
            ModalResult::Closed
        );
        assert_eq!(
            modal.handle_input(KeyCode::Char('q'), KeyModifiers::NONE),
            ModalResult::Continue
        );
    }
}
