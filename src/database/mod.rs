pub mod core;
pub mod error;
pub mod postgres;
pub mod sqlite;

#[cfg(test)]
pub mod fake;

use serde::{Deserialize, Serialize};

pub use self::core::{
    CellKind, CellValue, ColumnInfo, DatabaseConnection, QueryResult, RowBatch, TableRef,
};
pub use self::error::{DatabaseError, DatabaseResult};
pub use self::postgres::PostgresConnection;
pub use self::sqlite::SqliteConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum DatabaseType {
    #[default]
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub name: String,
    #[serde(default)]
    pub db_type: DatabaseType,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Database to open first; for SQLite this is the file path
    #[serde(default)]
    pub default_database: Option<String>,
}

pub fn create_database_connection(config: ConnectionConfig) -> Box<dyn DatabaseConnection> {
    match config.db_type {
        DatabaseType::Postgres => Box::new(PostgresConnection::new(config)),
        DatabaseType::Sqlite => Box::new(SqliteConnection::new(config)),
    }
}

/// Builds and connects the configured session.
pub async fn open_session(config: ConnectionConfig) -> DatabaseResult<Box<dyn DatabaseConnection>> {
    crate::logging::info(&format!(
        "Connecting to {} ({:?})",
        config.name, config.db_type
    ));
    let mut connection = create_database_connection(config);
    connection.connect().await?;
    Ok(connection)
}
