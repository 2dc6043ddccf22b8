use crate::app::App;
use crate::ui::types::Pane;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const NULL_TEXT: &str = "NULL";

/// The open table's buffer, with the cursor cell highlighted and edited cells
/// marked.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.config.theme;
    let focused = app.active_pane == Pane::Grid;

    let Some(buffer) = app.editor.buffer() else {
        let mut block = Block::default()
            .title("Table")
            .borders(Borders::ALL)
            .style(Style::default().bg(theme.surface0_color()));
        if focused {
            block = block.border_style(Style::default().fg(theme.accent_color()));
        }
        frame.render_widget(
            Paragraph::new("Select a role, database, schema and table to edit it.")
                .block(block)
                .style(Style::default().fg(theme.subtext0_color())),
            area,
        );
        return;
    };

    let title = format!(
        "{} ({} rows){}",
        buffer.target(),
        buffer.row_count(),
        if app.editor.is_dirty() { " [modified]" } else { "" }
    );
    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .title_style(
            Style::default()
                .fg(theme.header_fg_color())
                .bg(theme.header_bg_color()),
        );
    if focused {
        block = block.border_style(Style::default().fg(theme.accent_color()));
    }

    let columns = buffer.columns();
    if columns.is_empty() {
        frame.render_widget(
            Paragraph::new("Table has no columns.")
                .block(block)
                .style(Style::default().fg(theme.text_color())),
            area,
        );
        return;
    }

    let line_num_width = buffer.row_count().to_string().len().max(3) as u16;
    let spacing: u16 = 1;
    let table_inner = block.inner(area);
    let first_col_w = line_num_width + 1;

    let data_cols = columns.len() as u16;
    let total_spacing = spacing.saturating_mul(data_cols.saturating_sub(1));
    let remaining_w = table_inner
        .width
        .saturating_sub(first_col_w)
        .saturating_sub(total_spacing);
    let base = (remaining_w / data_cols).max(4);
    let mut widths: Vec<Constraint> = Vec::with_capacity(1 + columns.len());
    widths.push(Constraint::Length(first_col_w));
    widths.extend(std::iter::repeat(Constraint::Length(base)).take(columns.len()));

    let header_style = Style::default()
        .fg(theme.accent_color())
        .add_modifier(Modifier::BOLD);
    let mut header_cells = vec![Cell::from("#").style(header_style)];
    header_cells.extend(columns.iter().map(|c| {
        let marker = if c.is_nullable { "" } else { "*" };
        Cell::from(format!("{}{}", c.name, marker)).style(header_style)
    }));
    let header_row = Row::new(header_cells);

    let visible_capacity = table_inner.height.saturating_sub(1) as usize;
    let total_rows = buffer.row_count();
    let max_start = total_rows.saturating_sub(visible_capacity);
    let (cursor_col, cursor_row) = app.cursor_position;
    let cursor_row = cursor_row.min(total_rows.saturating_sub(1));
    let start_row = if visible_capacity == 0 {
        0
    } else {
        cursor_row
            .saturating_sub(visible_capacity / 2)
            .min(max_start)
    };

    let rows: Vec<Row> = buffer
        .rows()
        .iter()
        .enumerate()
        .skip(start_row)
        .take(visible_capacity)
        .map(|(row_idx, row)| {
            let row_bg = if row_idx % 2 == 0 {
                theme.row_even_bg_color()
            } else {
                theme.row_odd_bg_color()
            };

            let mut row_cells = vec![Cell::from(format!(
                "{:>width$}",
                row_idx + 1,
                width = line_num_width as usize
            ))
            .style(Style::default().fg(theme.subtext0_color()).bg(row_bg))];

            row_cells.extend((0..columns.len()).map(|col_idx| {
                let value = row.get(col_idx).and_then(|v| v.as_deref());
                let is_cursor = focused && row_idx == cursor_row && col_idx == cursor_col;

                let fg = if value.is_none() {
                    theme.null_color()
                } else if app.editor.is_cell_changed(row_idx, col_idx) {
                    theme.changed_color()
                } else {
                    theme.text_color()
                };
                let mut style = Style::default().fg(fg).bg(row_bg);
                if is_cursor {
                    style = Style::default()
                        .fg(theme.base_color())
                        .bg(theme.accent_color());
                }

                let text = crate::ui::truncate_to_width(value.unwrap_or(NULL_TEXT), base as usize);
                Cell::from(text).style(style)
            }));

            Row::new(row_cells)
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(block)
        .column_spacing(spacing)
        .style(Style::default().bg(theme.surface0_color()));

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use crate::app::App;
    use crate::catalog::CatalogFilter;
    use crate::config::Config;
    use crate::database::fake::FakeConnection;
    use crate::selection::Level;
    use crate::session::SessionContext;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn renders_rows_and_null_cells() {
        let fake = FakeConnection::analytics();
        let session = SessionContext::attach(Box::new(fake.clone()), CatalogFilter::default())
            .await
            .unwrap();
        let mut app = App::new(Config::default(), "test".to_string(), session).await;
        app.select(Level::Database, Some("ANALYTICS".into())).await;
        app.select(Level::Schema, Some("PUBLIC".into())).await;
        app.select(Level::Table, Some("ORDERS".into())).await;

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("ANALYTICS.PUBLIC.ORDERS (3 rows)"));
        assert!(text.contains("lamp"));
        assert!(text.contains("NULL"));
        assert!(text.contains("Role: ACCOUNTADMIN"));
    }
}
