use std::error::Error;
use std::fmt;

use tokio_postgres::error::SqlState;

/// Error type shared by every database backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// No session, or the session dropped underneath us
    ConnectionError(String),

    /// Statement failed to execute
    QueryError(String),

    /// The active role lacks a privilege
    PermissionError(String),

    /// Role, database, schema or table does not exist
    NotFound(String),

    /// Input rejected before reaching the database
    ValidationError(String),

    /// Anything else
    Other(String),
}

impl DatabaseError {
    pub fn not_connected() -> Self {
        DatabaseError::ConnectionError("Not connected to database".to_string())
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DatabaseError::QueryError(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::PermissionError(msg) => write!(f, "Permission denied: {}", msg),
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            DatabaseError::Other(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl Error for DatabaseError {}

/// Type alias for database operation results
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl From<tokio_postgres::Error> for DatabaseError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return DatabaseError::ConnectionError(err.to_string());
        }
        let message = match err.as_db_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        match err.code() {
            Some(code) if *code == SqlState::INSUFFICIENT_PRIVILEGE => {
                DatabaseError::PermissionError(message)
            }
            Some(code)
                if *code == SqlState::UNDEFINED_OBJECT
                    || *code == SqlState::UNDEFINED_TABLE
                    || *code == SqlState::INVALID_SCHEMA_NAME
                    || *code == SqlState::INVALID_CATALOG_NAME =>
            {
                DatabaseError::NotFound(message)
            }
            _ => DatabaseError::QueryError(message),
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for DatabaseError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::ConnectionClosed => {
                DatabaseError::ConnectionError("SQLite connection closed".to_string())
            }
            tokio_rusqlite::Error::Rusqlite(inner) => DatabaseError::from(inner),
            other => DatabaseError::Other(other.to_string()),
        }
    }
}

impl From<std::io::Error> for DatabaseError {
    fn from(err: std::io::Error) -> Self {
        DatabaseError::Other(err.to_string())
    }
}
