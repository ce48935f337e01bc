//! SQLite connection management for ClusterGate.
//!
//! Holds the legacy `licenses` table: one row per activated legacy client,
//! keyed by the client token it was issued for. The table carries its own
//! row id, so re-activating a token appends a second row instead of
//! replacing the first.

mod error;
mod license;

pub use error::{DbError, DbResult};
pub use license::{LicenseDao, LicenseRecord};

use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS licenses (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    token   TEXT NOT NULL,
    license TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_licenses_token ON licenses(token);
";

/// Opens (creating if needed) the database at `path` and applies the schema.
pub fn open_db(path: &Path) -> DbResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    migrate(&conn)?;
    debug!("opened legacy license database at {}", path.display());
    Ok(conn)
}

/// Opens a private in-memory database with the schema applied.
pub fn open_in_memory() -> DbResult<Connection> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
