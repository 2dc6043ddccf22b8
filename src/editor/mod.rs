pub mod buffer;
pub mod writer;

pub use buffer::{EditError, TableBuffer};
pub use writer::{SaveError, SaveOptions, SaveReport, SaveStrategy};

use crate::database::{DatabaseConnection, DatabaseResult, TableRef};
use crate::logging;

/// Holds the open table, if any, and the rows as they were last loaded or saved.
#[derive(Debug, Default)]
pub struct TableEditor {
    buffer: Option<TableBuffer>,
    saved: Option<TableBuffer>,
}

impl TableEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every row of `target`. On failure the open buffer is kept.
    pub async fn load(&mut self, conn: &dyn DatabaseConnection, target: TableRef) -> DatabaseResult<()> {
        logging::debug(&format!("Loading {}", target));
        let columns = conn.get_columns(&target).await?;
        let result = conn.fetch_table_data(&target).await?;
        let buffer = TableBuffer::from_result(target, columns, result);
        logging::info(&format!(
            "Loaded {} rows from {}",
            buffer.row_count(),
            buffer.target()
        ));
        self.saved = Some(buffer.clone());
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Discards edits by loading the open table again.
    pub async fn reset(&mut self, conn: &dyn DatabaseConnection) -> DatabaseResult<()> {
        match self.target().cloned() {
            Some(target) => self.load(conn, target).await,
            None => Ok(()),
        }
    }

    pub async fn save(
        &mut self,
        conn: &dyn DatabaseConnection,
        options: SaveOptions,
    ) -> Result<Option<SaveReport>, SaveError> {
        let Some(buffer) = &self.buffer else {
            return Ok(None);
        };
        let report = writer::save(conn, buffer, options).await?;
        self.saved = Some(buffer.clone());
        Ok(Some(report))
    }

    pub fn close(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            logging::debug(&format!("Closing {}", buffer.target()));
        }
        self.saved = None;
    }

    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// True when the buffer differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.buffer != self.saved
    }

    pub fn target(&self) -> Option<&TableRef> {
        self.buffer.as_ref().map(|b| b.target())
    }

    pub fn buffer(&self) -> Option<&TableBuffer> {
        self.buffer.as_ref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut TableBuffer> {
        self.buffer.as_mut()
    }

    /// Whether a cell differs from the last loaded or saved rows.
    pub fn is_cell_changed(&self, row: usize, column: usize) -> bool {
        match (&self.buffer, &self.saved) {
            (Some(buffer), Some(saved)) => buffer.cell(row, column) != saved.cell(row, column),
            _ => false,
        }
    }
}
