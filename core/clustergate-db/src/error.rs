//! Error types for the database layer.

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error (creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection lock was poisoned by a panicking writer.
    #[error("database connection poisoned")]
    Poisoned,
}
