use std::fmt;
use std::ops::Range;

use crate::database::{CellKind, CellValue, ColumnInfo, QueryResult, RowBatch, TableRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    RowOutOfRange { row: usize, len: usize },
    UnknownColumn(String),
    GeneratedColumn(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::RowOutOfRange { row, len } => {
                write!(f, "Row {} is out of range (buffer has {} rows)", row, len)
            }
            EditError::UnknownColumn(name) => write!(f, "Unknown column: {}", name),
            EditError::GeneratedColumn(name) => {
                write!(f, "{} is computed by the database and cannot be edited", name)
            }
        }
    }
}

impl std::error::Error for EditError {}

/// In-memory copy of one table's rows. Cells are kept as the text the backend
/// produced; nothing is validated until the rows are written back.
///
/// `kinds` mirrors `rows` and holds the storage class each cell was read with.
/// Edits change the text only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBuffer {
    target: TableRef,
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<CellValue>>,
    kinds: Vec<Vec<CellKind>>,
}

impl TableBuffer {
    pub fn new(target: TableRef, columns: Vec<ColumnInfo>, rows: Vec<Vec<CellValue>>) -> Self {
        Self::with_kinds(target, columns, rows, Vec::new())
    }

    fn with_kinds(
        target: TableRef,
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<CellValue>>,
        mut kinds: Vec<Vec<CellKind>>,
    ) -> Self {
        kinds.resize(rows.len(), Vec::new());
        for (row, row_kinds) in kinds.iter_mut().enumerate() {
            row_kinds.resize(rows[row].len().max(columns.len()), CellKind::Text);
        }
        Self {
            target,
            columns,
            rows,
            kinds,
        }
    }

    /// Lines the fetched rows up with the catalog's column list. Columns the
    /// catalog does not describe are kept as nullable text.
    pub fn from_result(target: TableRef, described: Vec<ColumnInfo>, result: QueryResult) -> Self {
        let columns = if result.columns.is_empty() {
            described
        } else {
            result
                .columns
                .iter()
                .map(|name| {
                    described
                        .iter()
                        .find(|c| &c.name == name)
                        .cloned()
                        .unwrap_or_else(|| ColumnInfo::new(name.clone(), "", true))
                })
                .collect()
        };
        Self::with_kinds(target, columns, result.rows, result.kinds)
    }

    pub fn target(&self) -> &TableRef {
        &self.target
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn kind(&self, row: usize, column: usize) -> CellKind {
        self.kinds
            .get(row)
            .and_then(|kinds| kinds.get(column))
            .copied()
            .unwrap_or_default()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn edit(&mut self, row: usize, column: &str, value: CellValue) -> Result<(), EditError> {
        let index = self
            .column_index(column)
            .ok_or_else(|| EditError::UnknownColumn(column.to_string()))?;
        self.edit_at(row, index, value)
    }

    pub fn edit_at(&mut self, row: usize, column: usize, value: CellValue) -> Result<(), EditError> {
        let len = self.rows.len();
        let width = self.columns.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(EditError::RowOutOfRange { row, len })?;
        if column >= width {
            return Err(EditError::UnknownColumn(format!("#{}", column)));
        }
        if self.columns[column].is_generated {
            return Err(EditError::GeneratedColumn(self.columns[column].name.clone()));
        }
        if cells.len() < width {
            cells.resize(width, None);
        }
        cells[column] = value;
        Ok(())
    }

    /// Appends a row of column-typed defaults and returns its index.
    pub fn add_row(&mut self) -> usize {
        let row = self.default_row();
        self.rows.push(row);
        self.kinds.push(
            self.columns
                .iter()
                .map(|c| CellKind::for_declared_type(&c.data_type))
                .collect(),
        );
        self.rows.len() - 1
    }

    pub fn delete_row(&mut self, row: usize) -> Result<Vec<CellValue>, EditError> {
        if row >= self.rows.len() {
            return Err(EditError::RowOutOfRange {
                row,
                len: self.rows.len(),
            });
        }
        self.kinds.remove(row);
        Ok(self.rows.remove(row))
    }

    pub fn default_row(&self) -> Vec<CellValue> {
        self.columns.iter().map(default_value).collect()
    }

    /// Rows `range` narrowed to the columns the database accepts values for.
    pub fn insert_batch(&self, range: Range<usize>) -> RowBatch {
        let writable: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_generated)
            .map(|(i, _)| i)
            .collect();
        let end = range.end.min(self.rows.len());
        let range = range.start.min(end)..end;

        RowBatch {
            columns: writable
                .iter()
                .map(|&i| self.columns[i].name.clone())
                .collect(),
            rows: self.rows[range.clone()]
                .iter()
                .map(|cells| {
                    writable
                        .iter()
                        .map(|&i| cells.get(i).cloned().flatten())
                        .collect()
                })
                .collect(),
            kinds: range
                .map(|row| writable.iter().map(|&i| self.kind(row, i)).collect())
                .collect(),
        }
    }
}

/// NULL where the column allows it or the database computes it, otherwise an
/// empty value of the column's type.
pub fn default_value(column: &ColumnInfo) -> CellValue {
    if column.is_nullable || column.is_generated {
        return None;
    }
    let data_type = column.data_type.to_ascii_lowercase();
    let is = |words: &[&str]| words.iter().any(|w| data_type.contains(w));

    if is(&["bool"]) {
        Some("false".to_string())
    } else if is(&[
        "int", "numeric", "number", "decimal", "real", "double", "float", "serial",
    ]) {
        Some("0".to_string())
    } else if is(&["char", "text", "string", "clob"]) || data_type.is_empty() {
        Some(String::new())
    } else {
        None
    }
}
