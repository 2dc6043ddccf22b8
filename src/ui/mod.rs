use std::time::Duration;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use ratatui::layout::Direction as LayoutDirection;

use crate::app::App;
use crate::notice::NoticeLevel;

pub mod modal_manager;
pub mod modals;
pub mod panes;
pub mod types;

pub use types::Pane;

/// How long non-error notices stay on the notice line.
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Renders the entire UI of the application.
pub fn render(frame: &mut Frame, app: &App) {
    frame.render_widget(
        Block::default().style(Style::default().bg(app.config.theme.base_color())),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(1),    // Selectors and grid
            Constraint::Length(1), // Notice line
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_status_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_notice_line(frame, app, chunks[2]);
    render_key_hints(frame, app, chunks[3]);

    app.modal_manager.render_all(frame, app);
}

/// Connection, role, open table and a marker for unsaved edits.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.config.theme;
    let target = app
        .editor
        .target()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "no table".to_string());

    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.connection_name),
            Style::default()
                .fg(theme.accent_color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| role {} | {}", app.session.current_role(), target)),
    ];
    if app.editor.is_dirty() {
        spans.push(Span::styled(
            " [modified]",
            Style::default().fg(theme.changed_color()),
        ));
    }
    if let Some(title) = app.modal_manager.get_active_title() {
        spans.push(Span::raw(format!(" | {}", title)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(
            Style::default()
                .fg(theme.text_color())
                .bg(theme.surface0_color()),
        ),
        area,
    );
}

/// Selectors on the left, the table grid on the right.
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let horizontal_chunks = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(area);

    panes::selectors::render(frame, app, horizontal_chunks[0]);
    panes::grid::render(frame, app, horizontal_chunks[1]);
}

fn render_notice_line(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.config.theme;
    let Some(notice) = app.notices.current(NOTICE_TTL) else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => theme.text_color(),
        NoticeLevel::Success => theme.success_color(),
        NoticeLevel::Warning => theme.warning_color(),
        NoticeLevel::Error => theme.error_color(),
    };
    frame.render_widget(
        Paragraph::new(notice.message.as_str()).style(Style::default().fg(color)),
        area,
    );
}

fn render_key_hints(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(
        Paragraph::new(app.config.keymap.hints())
            .style(Style::default().fg(app.config.theme.subtext1_color())),
        area,
    );
}

/// Cuts `text` to `max_width` chars, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return text.chars().take(max_width).collect();
    }
    let mut cut: String = text.chars().take(max_width - 1).collect();
    cut.push('…');
    cut
}
