use crossterm::event::{KeyEvent, KeyEventKind};

use crate::config::Config;
use crate::database::CellValue;
use crate::editor::TableEditor;
use crate::input::Action;
use crate::logging;
use crate::notice::Notices;
use crate::selection::{Level, SelectionController};
use crate::session::SessionContext;
use crate::ui::modal_manager::{ModalAction, ModalManager, ModalResult};
use crate::ui::modals::{CellEditModal, ConfirmModal};
use crate::ui::types::{Direction, Pane};

/// An action held back until the user confirms it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Select { level: Level, value: Option<String> },
    Save,
    Reset,
    Quit,
}

/// The main application struct.
pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub connection_name: String,
    pub session: SessionContext,
    pub selection: SelectionController,
    pub editor: TableEditor,
    pub notices: Notices,
    pub modal_manager: ModalManager,
    pub active_pane: Pane,
    /// Highlighted entry of each selector, indexed by `Level::index`
    pub selector_cursors: [usize; 4],
    /// (column, row) of the grid cursor
    pub cursor_position: (usize, usize),
}

impl App {
    /// Loads the first role and database lists through the session.
    pub async fn new(config: Config, connection_name: String, mut session: SessionContext) -> Self {
        let mut notices = Notices::default();
        let selection = SelectionController::initialize(&mut session, &mut notices).await;

        let mut app = Self {
            should_quit: false,
            config,
            connection_name,
            session,
            selection,
            editor: TableEditor::new(),
            notices,
            modal_manager: ModalManager::new(),
            active_pane: Pane::default(),
            selector_cursors: [0; 4],
            cursor_position: (0, 0),
        };
        app.sync_selector_cursors();
        app
    }

    /// Hands the session back for shutdown.
    pub fn into_session(self) -> SessionContext {
        self.session
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.modal_manager.has_modals() {
            if let Some(ModalResult::Action(action)) =
                self.modal_manager.handle_input(key.code, key.modifiers)
            {
                self.apply_modal_action(action).await;
            }
            return;
        }

        if let Some(action) = self.config.keymap.get_action(key.code, key.modifiers) {
            self.dispatch(action).await;
        }
    }

    pub async fn dispatch(&mut self, action: Action) {
        match action {
            Action::Move(direction) => self.move_cursor(direction),
            Action::FocusNext => self.active_pane = self.active_pane.next(),
            Action::FocusPrevious => self.active_pane = self.active_pane.previous(),
            Action::Select => match self.active_pane {
                Pane::Selector(level) => {
                    let value = self.highlighted(level);
                    if value.is_some() {
                        self.select(level, value).await;
                    }
                }
                Pane::Grid => self.open_cell_editor(),
            },
            Action::ClearSelection => {
                if let Pane::Selector(level) = self.active_pane {
                    self.select(level, None).await;
                }
            }
            // Row edits need the grid cursor.
            Action::AddRow | Action::DeleteRow | Action::SetNull
                if self.active_pane != Pane::Grid => {}
            Action::AddRow => self.add_row(),
            Action::DeleteRow => self.delete_row(),
            Action::SetNull => {
                let (column, row) = self.cursor_position;
                self.set_cell(row, column, None);
            }
            Action::Save => self.request_save(),
            Action::Reset => self.request_reset().await,
            Action::Quit => self.request_quit(),
        }
    }

    async fn apply_modal_action(&mut self, action: ModalAction) {
        match action {
            ModalAction::Confirm(pending) => self.perform(pending).await,
            ModalAction::CommitCell { row, column, value } => self.set_cell(row, column, value),
        }
    }

    async fn perform(&mut self, action: PendingAction) {
        match action {
            PendingAction::Select { level, value } => self.apply_selection(level, value).await,
            PendingAction::Save => self.save().await,
            PendingAction::Reset => self.reset().await,
            PendingAction::Quit => self.quit(),
        }
    }

    /// Runs now, or asks first when it would discard unsaved edits.
    fn guard(&mut self, title: &str, action: PendingAction) -> Option<PendingAction> {
        if !self.editor.is_dirty() {
            return Some(action);
        }
        let target = self
            .editor
            .target()
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.modal_manager.push(Box::new(ConfirmModal::new(
            title,
            vec![
                format!("{} has unsaved edits.", target),
                "Continue and discard them?".to_string(),
            ],
            action,
        )));
        None
    }

    // Selection

    fn highlighted(&self, level: Level) -> Option<String> {
        self.selection
            .candidates()
            .get(level)
            .get(self.selector_cursors[level.index()])
            .cloned()
    }

    /// Changes one selector level. Asks first when the open table has edits.
    pub async fn select(&mut self, level: Level, value: Option<String>) {
        let title = format!("Change {}", level.label().to_lowercase());
        if let Some(action) = self.guard(&title, PendingAction::Select { level, value }) {
            self.perform(action).await;
        }
    }

    async fn apply_selection(&mut self, level: Level, value: Option<String>) {
        let result = self
            .selection
            .select(&mut self.session, level, value, &mut self.notices)
            .await;
        if let Err(err) = result {
            self.notices.error(err.to_string());
            return;
        }

        self.sync_selector_cursors();
        match self.selection.state().table_ref() {
            Some(target) => {
                let label = target.to_string();
                match self.editor.load(self.session.connection(), target).await {
                    Ok(()) => {
                        self.cursor_position = (0, 0);
                        self.active_pane = Pane::Grid;
                        let rows = self.editor.buffer().map_or(0, |b| b.row_count());
                        self.notices.info(format!("Loaded {} rows from {}", rows, label));
                    }
                    Err(err) => self
                        .notices
                        .error(format!("Error loading {}: {}", label, err)),
                }
            }
            None => {
                self.editor.close();
                self.cursor_position = (0, 0);
            }
        }
    }

    /// Points each selector cursor at its selected value, or the top entry.
    fn sync_selector_cursors(&mut self) {
        for level in Level::ALL {
            let candidates = self.selection.candidates().get(level);
            let cursor = self
                .selection
                .state()
                .get(level)
                .and_then(|value| candidates.iter().position(|c| c == value))
                .unwrap_or(0);
            self.selector_cursors[level.index()] = cursor;
        }
    }

    // Grid

    fn move_cursor(&mut self, direction: Direction) {
        match self.active_pane {
            Pane::Selector(level) => {
                let len = self.selection.candidates().get(level).len();
                let cursor = &mut self.selector_cursors[level.index()];
                match direction {
                    Direction::Up => *cursor = cursor.saturating_sub(1),
                    Direction::Down => *cursor = (*cursor + 1).min(len.saturating_sub(1)),
                    Direction::Left => self.active_pane = self.active_pane.previous(),
                    Direction::Right => self.active_pane = self.active_pane.next(),
                }
            }
            Pane::Grid => {
                let Some(buffer) = self.editor.buffer() else {
                    return;
                };
                let columns = buffer.columns().len();
                let rows = buffer.row_count();
                let (column, row) = &mut self.cursor_position;
                match direction {
                    Direction::Left => *column = column.saturating_sub(1),
                    Direction::Right => *column = (*column + 1).min(columns.saturating_sub(1)),
                    Direction::Up => *row = row.saturating_sub(1),
                    Direction::Down => *row = (*row + 1).min(rows.saturating_sub(1)),
                }
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let (columns, rows) = self
            .editor
            .buffer()
            .map_or((0, 0), |b| (b.columns().len(), b.row_count()));
        self.cursor_position.0 = self.cursor_position.0.min(columns.saturating_sub(1));
        self.cursor_position.1 = self.cursor_position.1.min(rows.saturating_sub(1));
    }

    fn open_cell_editor(&mut self) {
        let (column, row) = self.cursor_position;
        let Some(buffer) = self.editor.buffer() else {
            self.notices.warn("No table loaded");
            return;
        };
        let Some(info) = buffer.columns().get(column) else {
            return;
        };
        if row >= buffer.row_count() {
            return;
        }
        if info.is_generated {
            let message = format!("{} is computed by the database and cannot be edited", info.name);
            self.notices.warn(message);
            return;
        }
        let current = buffer.cell(row, column).cloned().flatten();
        let modal = CellEditModal::new(row, column, &info.name, &info.data_type, &current);
        self.modal_manager.push(Box::new(modal));
    }

    fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        let Some(buffer) = self.editor.buffer_mut() else {
            self.notices.warn("No table loaded");
            return;
        };
        if let Err(err) = buffer.edit_at(row, column, value) {
            self.notices.error(err.to_string());
        }
    }

    fn add_row(&mut self) {
        let Some(buffer) = self.editor.buffer_mut() else {
            self.notices.warn("No table loaded");
            return;
        };
        let row = buffer.add_row();
        self.cursor_position = (0, row);
        self.active_pane = Pane::Grid;
    }

    fn delete_row(&mut self) {
        let row = self.cursor_position.1;
        let Some(buffer) = self.editor.buffer_mut() else {
            self.notices.warn("No table loaded");
            return;
        };
        match buffer.delete_row(row) {
            Ok(_) => self.clamp_cursor(),
            Err(err) => self.notices.error(err.to_string()),
        }
    }

    // Persistence

    /// Saving always asks, and the prompt spells out what a failure leaves behind.
    fn request_save(&mut self) {
        let Some(buffer) = self.editor.buffer() else {
            self.notices.warn("No table loaded");
            return;
        };
        let options = self.config.editor.save_options();
        let lines = vec![
            format!(
                "Replace every row of {} with the {} rows in the editor?",
                buffer.target(),
                buffer.row_count()
            ),
            options.strategy.warning().to_string(),
        ];
        self.modal_manager
            .push(Box::new(ConfirmModal::new("Save table", lines, PendingAction::Save)));
    }

    async fn save(&mut self) {
        let options = self.config.editor.save_options();
        match self.editor.save(self.session.connection(), options).await {
            Ok(Some(report)) => {
                let target = self
                    .editor
                    .target()
                    .map(|t| t.to_string())
                    .unwrap_or_default();
                self.notices
                    .success(format!("Saved {} rows to {}", report.rows_written, target));
            }
            Ok(None) => {}
            Err(err) => self.notices.error(err.to_string()),
        }
    }

    async fn request_reset(&mut self) {
        if self.editor.target().is_none() {
            self.notices.warn("No table loaded");
            return;
        }
        if let Some(action) = self.guard("Reset table", PendingAction::Reset) {
            self.perform(action).await;
        }
    }

    async fn reset(&mut self) {
        match self.editor.reset(self.session.connection()).await {
            Ok(()) => {
                self.clamp_cursor();
                self.notices.info("Reloaded table, edits discarded");
            }
            Err(err) => self.notices.error(format!("Error reloading table: {}", err)),
        }
    }

    fn request_quit(&mut self) {
        if self.guard("Quit", PendingAction::Quit).is_some() {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        logging::info("Quit requested");
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use crate::catalog::CatalogFilter;
    use crate::database::fake::FakeConnection;
    use crate::database::{ColumnInfo, TableRef};
    use crate::notice::NoticeLevel;

    fn orders() -> TableRef {
        TableRef::new("ANALYTICS", "PUBLIC", "ORDERS")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app_with(fake: &FakeConnection) -> App {
        let session = SessionContext::attach(Box::new(fake.clone()), CatalogFilter::default())
            .await
            .unwrap();
        App::new(Config::default(), "test".to_string(), session).await
    }

    async fn open_orders(app: &mut App) {
        app.select(Level::Database, Some("ANALYTICS".into())).await;
        app.select(Level::Schema, Some("PUBLIC".into())).await;
        app.select(Level::Table, Some("ORDERS".into())).await;
    }

    fn last_error(app: &App) -> Option<String> {
        app.notices.errors().last().map(|n| n.message.clone())
    }

    #[tokio::test]
    async fn startup_seeds_role_and_databases() {
        let fake = FakeConnection::analytics();
        let app = app_with(&fake).await;

        assert_eq!(app.selection.state().role.as_deref(), Some("ACCOUNTADMIN"));
        assert_eq!(app.selection.candidates().databases, vec!["ANALYTICS"]);
        assert_eq!(app.selector_cursors[Level::Role.index()], 0);
    }

    #[tokio::test]
    async fn selecting_a_table_loads_it_into_the_grid() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;

        assert_eq!(app.editor.target(), Some(&orders()));
        assert_eq!(app.active_pane, Pane::Grid);
        assert_eq!(app.notices.latest().unwrap().level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn keyboard_walks_down_the_selectors() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;

        app.handle_key(key(KeyCode::Tab)).await;
        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Tab)).await;
        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Tab)).await;
        app.handle_key(key(KeyCode::Enter)).await;

        assert_eq!(app.editor.target(), Some(&orders()));
    }

    #[tokio::test]
    async fn dirty_buffer_asks_before_switching_tables() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.dispatch(Action::SetNull).await;
        assert!(app.editor.is_dirty());

        app.select(Level::Schema, Some("STAGING".into())).await;
        assert!(app.modal_manager.has_modals());
        assert_eq!(app.selection.state().schema.as_deref(), Some("PUBLIC"));

        app.handle_key(key(KeyCode::Esc)).await;
        assert!(!app.modal_manager.has_modals());
        assert_eq!(app.editor.target(), Some(&orders()));

        app.select(Level::Schema, Some("STAGING".into())).await;
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.selection.state().schema.as_deref(), Some("STAGING"));
        assert_eq!(app.selection.candidates().tables, vec!["RAW_ORDERS"]);
        assert!(!app.editor.is_open());
    }

    #[tokio::test]
    async fn save_needs_confirmation_and_writes_the_buffer() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.dispatch(Action::DeleteRow).await;

        app.dispatch(Action::Save).await;
        assert_eq!(fake.state().rows(&orders()).len(), 3);
        assert_eq!(app.modal_manager.get_active_title().as_deref(), Some("Save table"));

        app.handle_key(key(KeyCode::Char('y'))).await;
        assert_eq!(fake.state().rows(&orders()).len(), 2);
        assert!(!app.editor.is_dirty());
        assert_eq!(app.notices.latest().unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn failed_save_is_reported_with_the_table_state() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.dispatch(Action::AddRow).await;
        let row = app.cursor_position.1;
        app.set_cell(row, 1, None);

        app.dispatch(Action::Save).await;
        app.handle_key(key(KeyCode::Enter)).await;

        let message = last_error(&app).unwrap();
        assert!(message.contains("EMPTY"), "{}", message);
        assert!(app.editor.is_dirty());
    }

    #[tokio::test]
    async fn cell_edit_modal_commits_into_the_buffer() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.dispatch(Action::Move(Direction::Right)).await;

        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Char('!'))).await;
        app.handle_key(key(KeyCode::Enter)).await;

        let buffer = app.editor.buffer().unwrap();
        assert_eq!(buffer.cell(0, 1), Some(&Some("lamp!".to_string())));
        assert!(app.editor.is_cell_changed(0, 1));
    }

    #[tokio::test]
    async fn failed_role_switch_keeps_the_role() {
        let fake = FakeConnection::analytics();
        fake.state().forbidden_roles.insert("ANALYST".to_string());
        let mut app = app_with(&fake).await;

        app.select(Level::Role, Some("ANALYST".into())).await;

        assert_eq!(app.session.current_role(), "ACCOUNTADMIN");
        assert_eq!(app.selection.state().role.as_deref(), Some("ACCOUNTADMIN"));
        assert!(last_error(&app).unwrap().contains("switching role"));
    }

    #[tokio::test]
    async fn quit_asks_only_when_dirty() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.dispatch(Action::AddRow).await;

        app.dispatch(Action::Quit).await;
        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Enter)).await;
        assert!(app.should_quit);

        let mut clean = app_with(&fake).await;
        clean.dispatch(Action::Quit).await;
        assert!(clean.should_quit);
    }

    #[tokio::test]
    async fn row_edits_need_grid_focus() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.active_pane = Pane::Selector(Level::Table);

        app.handle_key(key(KeyCode::Char('d'))).await;
        app.dispatch(Action::AddRow).await;
        app.dispatch(Action::SetNull).await;

        assert_eq!(app.editor.buffer().unwrap().row_count(), 3);
        assert!(!app.editor.is_dirty());
        assert_eq!(app.active_pane, Pane::Selector(Level::Table));
    }

    #[tokio::test]
    async fn generated_cells_do_not_open_the_editor() {
        let fake = FakeConnection::analytics();
        fake.state()
            .data
            .get_mut(&orders())
            .unwrap()
            .0
            .push(ColumnInfo::new("TOTAL", "NUMBER", true).generated());
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.cursor_position = (3, 0);

        app.handle_key(key(KeyCode::Enter)).await;
        app.dispatch(Action::SetNull).await;

        assert!(!app.modal_manager.has_modals());
        assert!(!app.editor.is_dirty());
        assert!(last_error(&app).unwrap().contains("TOTAL"));
    }

    #[tokio::test]
    async fn ctrl_n_in_the_cell_editor_stores_null() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        open_orders(&mut app).await;
        app.cursor_position = (2, 1);

        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL))
            .await;

        assert_eq!(app.editor.buffer().unwrap().cell(1, 2), Some(&None));
        assert!(app.editor.is_cell_changed(1, 2));
    }

    #[tokio::test]
    async fn grid_actions_without_a_table_warn() {
        let fake = FakeConnection::analytics();
        let mut app = app_with(&fake).await;
        app.dispatch(Action::AddRow).await;
        app.dispatch(Action::Save).await;

        assert!(!app.modal_manager.has_modals());
        assert_eq!(app.notices.latest().unwrap().level, NoticeLevel::Warning);
    }
}
