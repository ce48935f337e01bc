//! Data access for the legacy `licenses` table.

use crate::error::{DbError, DbResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// One stored legacy license: the client token and its opaque ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Issued client token.
    pub token: String,
    /// Ciphertext as issued, never interpreted by this layer.
    pub license: String,
}

/// Access object for the `licenses` table.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so the connection is
/// kept behind a mutex to let the DAO be shared across threads.
pub struct LicenseDao {
    conn: Mutex<Connection>,
}

impl LicenseDao {
    /// Wraps a connection that already has the schema applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Appends a row. Duplicate tokens are accepted.
    pub fn add(&self, record: &LicenseRecord) -> DbResult<()> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        conn.execute(
            "INSERT INTO licenses (token, license) VALUES (?1, ?2)",
            params![record.token, record.license],
        )?;
        debug!("stored legacy license row for token {}", record.token);
        Ok(())
    }

    /// Returns every row in insertion order.
    pub fn list(&self) -> DbResult<Vec<LicenseRecord>> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        let mut stmt = conn.prepare("SELECT token, license FROM licenses ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(LicenseRecord {
                token: row.get(0)?,
                license: row.get(1)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
