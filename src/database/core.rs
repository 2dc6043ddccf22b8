use async_trait::async_trait;
use std::fmt;

use super::error::DatabaseResult;

/// A single cell; `None` is SQL NULL.
pub type CellValue = Option<String>;

/// Storage class a cell was read with. Cells are edited as text, so this is
/// what lets a backend write an unedited value back in its original form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellKind {
    #[default]
    Text,
    Integer,
    Real,
    Blob,
}

impl CellKind {
    /// Kind for a cell of a freshly added row.
    pub fn for_declared_type(data_type: &str) -> Self {
        if data_type.to_ascii_uppercase().contains("BLOB") {
            CellKind::Blob
        } else {
            CellKind::Text
        }
    }

    /// Native SQL literal for `value`, or `None` when the text no longer fits
    /// this kind and has to be written as a string.
    pub fn native_literal(&self, value: &str) -> Option<String> {
        match self {
            CellKind::Text => None,
            CellKind::Integer => value.trim().parse::<i64>().ok().map(|n| n.to_string()),
            CellKind::Real => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| format!("{:?}", n)),
            CellKind::Blob => {
                let digits = value.strip_prefix("0x")?;
                hex::decode(digits).ok()?;
                Some(format!("X'{}'", digits))
            }
        }
    }
}

/// Fully qualified coordinates of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    /// Computed by the database; shown but never written
    pub is_generated: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable,
            is_generated: false,
        }
    }

    pub fn generated(mut self) -> Self {
        self.is_generated = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Per-cell storage classes; empty when the backend reads everything as text
    pub kinds: Vec<Vec<CellKind>>,
    pub affected_rows: u64,
}

/// Rows bound for one `INSERT`, already narrowed to the writable columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Lines up cell by cell with `rows`
    pub kinds: Vec<Vec<CellKind>>,
}

impl RowBatch {
    pub fn kind(&self, row: usize, column: usize) -> CellKind {
        self.kinds
            .get(row)
            .and_then(|kinds| kinds.get(column))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The session the editor works through. Values travel as text; backends that
/// know a cell's storage class report it so the cell can be written back as it
/// was read.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Connect to the database
    async fn connect(&mut self) -> DatabaseResult<()>;

    /// Disconnect from the database
    async fn disconnect(&mut self) -> DatabaseResult<()>;

    /// Role the session currently acts as
    async fn current_role(&self) -> DatabaseResult<String>;

    /// Switch the session to another role
    async fn use_role(&self, role: &str) -> DatabaseResult<()>;

    async fn list_roles(&self) -> DatabaseResult<Vec<String>>;

    async fn list_databases(&self) -> DatabaseResult<Vec<String>>;

    async fn list_schemas(&self, database: &str) -> DatabaseResult<Vec<String>>;

    async fn list_tables(&self, database: &str, schema: &str) -> DatabaseResult<Vec<String>>;

    /// Columns of a table in ordinal order, generated ones flagged
    async fn get_columns(&self, target: &TableRef) -> DatabaseResult<Vec<ColumnInfo>>;

    /// Every row of a table, unfiltered
    async fn fetch_table_data(&self, target: &TableRef) -> DatabaseResult<QueryResult>;

    /// Delete every row of a table
    async fn truncate_table(&self, target: &TableRef) -> DatabaseResult<()>;

    /// Insert rows whose cells line up with `batch.columns`
    async fn insert_rows(&self, target: &TableRef, batch: &RowBatch) -> DatabaseResult<u64>;

    /// Run statements that return no rows on the session serving `database`
    async fn execute_batch(&self, database: &str, sql: &str) -> DatabaseResult<()>;
}

pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds a multi-row `INSERT ... VALUES` statement. `clause` goes between
/// the column list and `VALUES`; `render` turns one cell into SQL.
pub fn build_insert_statement<F>(
    qualified_table: &str,
    batch: &RowBatch,
    clause: Option<&str>,
    mut render: F,
) -> String
where
    F: FnMut(CellKind, &CellValue) -> String,
{
    let column_list = batch
        .columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let values = batch
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let cells = (0..batch.columns.len())
                .map(|c| match row.get(c) {
                    Some(cell) => render(batch.kind(r, c), cell),
                    None => "NULL".to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", cells)
        })
        .collect::<Vec<_>>()
        .join(", ");

    match clause {
        Some(clause) => format!(
            "INSERT INTO {} ({}) {} VALUES {}",
            qualified_table, column_list, clause, values
        ),
        None => format!(
            "INSERT INTO {} ({}) VALUES {}",
            qualified_table, column_list, values
        ),
    }
}

/// Text literal or NULL.
pub fn render_text_literal(cell: &CellValue) -> String {
    match cell {
        Some(value) => quote_literal(value),
        None => "NULL".to_string(),
    }
}

/// Native literal when the cell still fits its storage class, otherwise text.
pub fn render_typed_literal(kind: CellKind, cell: &CellValue) -> String {
    match cell {
        Some(value) => kind
            .native_literal(value)
            .unwrap_or_else(|| quote_literal(value)),
        None => "NULL".to_string(),
    }
}
