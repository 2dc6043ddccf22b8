//! Writes a buffer back over its table.
//!
//! The default strategy empties the table and then inserts the buffer in
//! batches. The two steps are independent statements, so a failed insert
//! leaves the table empty or partially written. `Transactional` wraps the same
//! statements in one transaction instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::buffer::TableBuffer;
use crate::database::{DatabaseConnection, DatabaseError, TableRef};
use crate::logging;

pub const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStrategy {
    #[default]
    TruncateThenInsert,
    Transactional,
}

impl SaveStrategy {
    /// Text for the save confirmation prompt.
    pub fn warning(&self) -> &'static str {
        match self {
            SaveStrategy::TruncateThenInsert => {
                "The table is emptied first. If an insert fails it stays empty or partially written."
            }
            SaveStrategy::Transactional => {
                "Runs in one transaction. If an insert fails the table keeps its current rows."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub strategy: SaveStrategy,
    pub batch_size: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            strategy: SaveStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub rows_written: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// Emptying the table failed; its rows are untouched.
    Truncate {
        target: TableRef,
        source: DatabaseError,
    },
    /// An insert failed after the table was emptied.
    Insert {
        target: TableRef,
        written: u64,
        expected: u64,
        source: DatabaseError,
    },
    /// The transaction was rolled back; the table keeps its previous rows.
    RolledBack {
        target: TableRef,
        source: DatabaseError,
    },
    /// The transaction could not be opened, committed or rolled back.
    Transaction {
        target: TableRef,
        source: DatabaseError,
    },
}

impl SaveError {
    pub fn source_error(&self) -> &DatabaseError {
        match self {
            SaveError::Truncate { source, .. }
            | SaveError::Insert { source, .. }
            | SaveError::RolledBack { source, .. }
            | SaveError::Transaction { source, .. } => source,
        }
    }

    /// True when the table may no longer hold what it held before the save.
    pub fn left_table_damaged(&self) -> bool {
        matches!(self, SaveError::Insert { .. } | SaveError::Transaction { .. })
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Truncate { target, source } => {
                write!(f, "Could not empty {}: {}. No rows were changed", target, source)
            }
            SaveError::Insert {
                target,
                written,
                expected,
                source,
            } => {
                if *written == 0 {
                    write!(
                        f,
                        "Insert into {} failed: {}. The table is now EMPTY",
                        target, source
                    )
                } else {
                    write!(
                        f,
                        "Insert into {} failed: {}. The table now holds only {} of {} rows",
                        target, source, written, expected
                    )
                }
            }
            SaveError::RolledBack { target, source } => write!(
                f,
                "Save of {} failed and was rolled back: {}. The table is unchanged",
                target, source
            ),
            SaveError::Transaction { target, source } => write!(
                f,
                "Transaction on {} failed: {}. Check the table contents",
                target, source
            ),
        }
    }
}

impl std::error::Error for SaveError {}

/// Replaces every row of the buffer's table with the buffer's rows.
pub async fn save(
    conn: &dyn DatabaseConnection,
    buffer: &TableBuffer,
    options: SaveOptions,
) -> Result<SaveReport, SaveError> {
    let target = buffer.target().clone();
    logging::info(&format!(
        "Saving {} rows to {} ({:?})",
        buffer.row_count(),
        target,
        options.strategy
    ));

    match options.strategy {
        SaveStrategy::TruncateThenInsert => replace_rows(conn, buffer, options.batch_size).await,
        SaveStrategy::Transactional => {
            conn.execute_batch(&target.database, "BEGIN")
                .await
                .map_err(|source| SaveError::Transaction {
                    target: target.clone(),
                    source,
                })?;

            match replace_rows(conn, buffer, options.batch_size).await {
                Ok(report) => {
                    conn.execute_batch(&target.database, "COMMIT")
                        .await
                        .map_err(|source| SaveError::Transaction {
                            target: target.clone(),
                            source,
                        })?;
                    Ok(report)
                }
                Err(err) => {
                    let source = err.source_error().clone();
                    if let Err(rollback) = conn.execute_batch(&target.database, "ROLLBACK").await {
                        logging::error(&format!("Rollback on {} failed: {}", target, rollback));
                        return Err(SaveError::Transaction {
                            target,
                            source: rollback,
                        });
                    }
                    Err(SaveError::RolledBack { target, source })
                }
            }
        }
    }
}

async fn replace_rows(
    conn: &dyn DatabaseConnection,
    buffer: &TableBuffer,
    batch_size: usize,
) -> Result<SaveReport, SaveError> {
    let target = buffer.target();
    let expected = buffer.row_count() as u64;

    conn.truncate_table(target)
        .await
        .map_err(|source| SaveError::Truncate {
            target: target.clone(),
            source,
        })?;

    let mut written = 0u64;
    let batch_size = batch_size.max(1);
    for start in (0..buffer.row_count()).step_by(batch_size) {
        let batch = buffer.insert_batch(start..start + batch_size);
        match conn.insert_rows(target, &batch).await {
            Ok(_) => written += batch.len() as u64,
            Err(source) => {
                logging::error(&format!(
                    "Insert into {} failed after {} of {} rows: {}",
                    target, written, expected, source
                ));
                return Err(SaveError::Insert {
                    target: target.clone(),
                    written,
                    expected,
                    source,
                });
            }
        }
    }

    logging::info(&format!("Wrote {} rows to {}", written, target));
    Ok(SaveReport {
        rows_written: written,
    })
}
