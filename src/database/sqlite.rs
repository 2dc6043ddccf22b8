use super::core::*;
use super::error::{DatabaseError, DatabaseResult};
use crate::logging;
use async_trait::async_trait;
use rusqlite::{types::ValueRef, Row as SyncRow};
use tokio_rusqlite::Connection;

/// SQLite has no access control, so the session exposes a single role.
pub const SQLITE_ROLE: &str = "PUBLIC";

/// Attached databases are flat; each one is presented with this single schema.
pub const SQLITE_SCHEMA: &str = "main";

pub struct SqliteConnection {
    config: super::ConnectionConfig,
    conn: Option<Connection>,
}

impl SqliteConnection {
    pub fn new(config: super::ConnectionConfig) -> Self {
        Self { config, conn: None }
    }

    fn resolve_path(&self) -> String {
        if let Some(db) = &self.config.default_database {
            db.clone()
        } else {
            self.config.host.clone()
        }
    }

    fn connection(&self) -> DatabaseResult<&Connection> {
        self.conn.as_ref().ok_or_else(DatabaseError::not_connected)
    }

    /// Display text of a value plus the storage class it came back with.
    fn value_ref_to_cell(value: ValueRef<'_>) -> (CellValue, CellKind) {
        match value {
            ValueRef::Null => (None, CellKind::Text),
            ValueRef::Integer(v) => (Some(v.to_string()), CellKind::Integer),
            ValueRef::Real(v) => (Some(v.to_string()), CellKind::Real),
            ValueRef::Text(v) => (Some(String::from_utf8_lossy(v).to_string()), CellKind::Text),
            ValueRef::Blob(v) => (Some(format!("0x{}", hex::encode(v))), CellKind::Blob),
        }
    }

    fn map_row_to_cells(
        row: &SyncRow<'_>,
        col_count: usize,
    ) -> rusqlite::Result<(Vec<CellValue>, Vec<CellKind>)> {
        let mut cells = Vec::with_capacity(col_count);
        let mut kinds = Vec::with_capacity(col_count);
        for i in 0..col_count {
            let (cell, kind) = Self::value_ref_to_cell(row.get_ref(i)?);
            cells.push(cell);
            kinds.push(kind);
        }
        Ok((cells, kinds))
    }

    fn qualified_name(target: &TableRef) -> String {
        format!(
            "{}.{}",
            quote_identifier(&target.database),
            quote_identifier(&target.table)
        )
    }
}

#[async_trait]
impl DatabaseConnection for SqliteConnection {
    async fn connect(&mut self) -> DatabaseResult<()> {
        let path = self.resolve_path();
        logging::debug(&format!("Opening SQLite database {}", path));
        let conn = Connection::open(path).await?;
        self.conn = Some(conn);
        Ok(())
    }

    async fn disconnect(&mut self) -> DatabaseResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }

    async fn current_role(&self) -> DatabaseResult<String> {
        self.connection()?;
        Ok(SQLITE_ROLE.to_string())
    }

    async fn use_role(&self, role: &str) -> DatabaseResult<()> {
        self.connection()?;
        if role == SQLITE_ROLE {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(format!(
                "role {} does not exist (SQLite sessions only have {})",
                role, SQLITE_ROLE
            )))
        }
    }

    async fn list_roles(&self) -> DatabaseResult<Vec<String>> {
        self.connection()?;
        Ok(vec![SQLITE_ROLE.to_string()])
    }

    async fn list_databases(&self) -> DatabaseResult<Vec<String>> {
        let names = self
            .connection()?
            .call(|c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<Vec<String>> {
                let mut stmt = c.prepare("PRAGMA database_list")?;
                let iter = stmt.query_map([], |row| row.get::<_, String>(1))?;
                let mut out = Vec::new();
                for name in iter {
                    out.push(name?);
                }
                Ok(out)
            })
            .await?;
        Ok(names)
    }

    async fn list_schemas(&self, database: &str) -> DatabaseResult<Vec<String>> {
        let databases = self.list_databases().await?;
        if databases.iter().any(|d| d == database) {
            Ok(vec![SQLITE_SCHEMA.to_string()])
        } else {
            Err(DatabaseError::NotFound(format!(
                "database {} is not attached",
                database
            )))
        }
    }

    async fn list_tables(&self, database: &str, _schema: &str) -> DatabaseResult<Vec<String>> {
        let query = format!(
            "SELECT name FROM {}.sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            quote_identifier(database)
        );
        let tables = self
            .connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<Vec<String>> {
                let mut stmt = c.prepare(&query)?;
                let iter = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut out = Vec::new();
                for t in iter {
                    out.push(t?);
                }
                Ok(out)
            })
            .await?;
        Ok(tables)
    }

    async fn get_columns(&self, target: &TableRef) -> DatabaseResult<Vec<ColumnInfo>> {
        // table_xinfo also reports generated columns: hidden is 2 (virtual) or
        // 3 (stored). Hidden columns of virtual tables (1) never show in SELECT *.
        let query = format!(
            "PRAGMA {}.table_xinfo({})",
            quote_identifier(&target.database),
            quote_identifier(&target.table)
        );
        let columns = self
            .connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<Vec<ColumnInfo>> {
                let mut stmt = c.prepare(&query)?;
                let mut rows = stmt.query([])?;

                let mut columns = Vec::new();
                while let Some(row) = rows.next()? {
                    let name: String = row.get(1)?;
                    let data_type: String = row.get(2)?;
                    let not_null: i32 = row.get(3)?;
                    let hidden: i32 = row.get(6)?;
                    if hidden == 1 {
                        continue;
                    }
                    columns.push(ColumnInfo {
                        name,
                        data_type,
                        is_nullable: not_null == 0,
                        is_generated: hidden == 2 || hidden == 3,
                    });
                }
                Ok(columns)
            })
            .await?;
        Ok(columns)
    }

    async fn fetch_table_data(&self, target: &TableRef) -> DatabaseResult<QueryResult> {
        let query = format!("SELECT * FROM {}", Self::qualified_name(target));
        logging::debug(&format!("Executing query: {}", query));
        let result = self
            .connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<QueryResult> {
                let mut stmt = c.prepare(&query)?;
                let col_count = stmt.column_count();
                let columns: Vec<String> = stmt
                    .column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                let mut rows_vec = Vec::new();
                let mut kinds = Vec::new();
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let (cells, row_kinds) = SqliteConnection::map_row_to_cells(row, col_count)?;
                    rows_vec.push(cells);
                    kinds.push(row_kinds);
                }
                let affected_rows = rows_vec.len() as u64;
                Ok(QueryResult {
                    columns,
                    rows: rows_vec,
                    kinds,
                    affected_rows,
                })
            })
            .await?;
        Ok(result)
    }

    async fn truncate_table(&self, target: &TableRef) -> DatabaseResult<()> {
        let statement = format!("DELETE FROM {}", Self::qualified_name(target));
        logging::debug(&format!("Executing: {}", statement));
        self.connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<()> {
                c.execute(&statement, [])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn insert_rows(&self, target: &TableRef, batch: &RowBatch) -> DatabaseResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        // Cells go back in the storage class they were read with.
        let statement = build_insert_statement(
            &Self::qualified_name(target),
            batch,
            None,
            render_typed_literal,
        );
        let inserted = self
            .connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<u64> {
                Ok(c.execute(&statement, [])? as u64)
            })
            .await?;
        Ok(inserted)
    }

    async fn execute_batch(&self, _database: &str, sql: &str) -> DatabaseResult<()> {
        let sql = sql.to_string();
        self.connection()?
            .call(move |c: &mut rusqlite::Connection| -> tokio_rusqlite::Result<()> {
                c.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
