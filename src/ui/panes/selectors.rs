use crate::app::App;
use crate::selection::Level;
use crate::ui::types::Pane;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// The four cascading selectors, stacked top to bottom.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
        ])
        .split(area);

    for (level, chunk) in Level::ALL.iter().zip(chunks.iter()) {
        render_selector(frame, app, *level, *chunk);
    }
}

fn render_selector(frame: &mut Frame, app: &App, level: Level, area: Rect) {
    let theme = &app.config.theme;
    let focused = app.active_pane == Pane::Selector(level);
    let selected = app.selection.state().get(level);
    let candidates = app.selection.candidates().get(level);
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = candidates
        .iter()
        .map(|name| {
            let is_selected = selected == Some(name.as_str());
            let marker = if is_selected { "● " } else { "  " };
            let style = if is_selected {
                Style::default()
                    .fg(theme.accent_color())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_color())
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    crate::ui::truncate_to_width(name, width.saturating_sub(2)),
                    style,
                ),
            ]))
        })
        .collect();

    let title = match selected {
        Some(value) => format!("{}: {}", level.label(), value),
        None if candidates.is_empty() => format!("{} (none)", level.label()),
        None => level.label().to_string(),
    };

    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.surface0_color()));
    if focused {
        block = block.border_style(Style::default().fg(theme.accent_color()));
    }

    let highlight = if focused {
        Style::default()
            .fg(theme.base_color())
            .bg(theme.accent_color())
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };

    let mut state = ListState::default();
    if !candidates.is_empty() {
        state.select(Some(app.selector_cursors[level.index()]));
    }

    frame.render_stateful_widget(
        List::new(items)
            .block(block)
            .highlight_style(highlight)
            .style(Style::default().bg(theme.surface0_color())),
        area,
        &mut state,
    );
}
