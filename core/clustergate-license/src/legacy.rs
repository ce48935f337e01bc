//! Legacy encrypted licenses.
//!
//! Each legacy client is issued a token and a ciphertext that decrypts,
//! under that token, to a JSON [`LicenseInfo`]. Rows are appended, never
//! rewritten, and a token may appear more than once.
//!
//! Listing tolerates partial corruption: a row that fails to decrypt or
//! parse is logged and left out, and the rest of the batch is returned.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use clustergate_crypto::{decrypt_string, pack_token};
use clustergate_db::{LicenseDao, LicenseRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Timestamp layout used by legacy `start_time` / `end_time`, UTC.
pub const LEGACY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decrypted content of a legacy license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseInfo {
    pub code: String,
    pub company: String,
    /// Licensed node count.
    pub node: i64,
    /// Licensed CPU cores.
    pub cpu: i64,
    /// Licensed memory, GiB.
    pub memory: i64,
    /// Licensed tenant count.
    pub tenant: i64,
    pub end_time: String,
    pub start_time: String,
    /// Licensed data center count.
    pub data_center: i64,
    /// Enabled modules.
    pub module_list: Vec<String>,
}

impl LicenseInfo {
    /// Parsed `start_time`, `None` if blank or malformed.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        parse_legacy_time(&self.start_time)
    }

    /// Parsed `end_time`, `None` if blank or malformed.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        parse_legacy_time(&self.end_time)
    }

    /// True once `end_time` has passed. A missing end time never expires.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end().is_some_and(|end| end < now)
    }
}

fn parse_legacy_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), LEGACY_TIME_FORMAT)
        .ok()
        .map(|t| t.and_utc())
}

/// Row storage for legacy licenses.
pub trait LegacyRecordStore: Send + Sync {
    /// Appends a row.
    fn insert(&self, record: &LicenseRecord) -> LicenseResult<()>;

    /// Returns all rows in insertion order.
    fn list(&self) -> LicenseResult<Vec<LicenseRecord>>;
}

impl LegacyRecordStore for LicenseDao {
    fn insert(&self, record: &LicenseRecord) -> LicenseResult<()> {
        Ok(self.add(record)?)
    }

    fn list(&self) -> LicenseResult<Vec<LicenseRecord>> {
        Ok(LicenseDao::list(self)?)
    }
}

/// Process-local row storage.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: Mutex<Vec<LicenseRecord>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LegacyRecordStore for MemoryRecordStore {
    fn insert(&self, record: &LicenseRecord) -> LicenseResult<()> {
        self.rows
            .lock()
            .map_err(|_| LicenseError::Storage("legacy store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn list(&self) -> LicenseResult<Vec<LicenseRecord>> {
        Ok(self
            .rows
            .lock()
            .map_err(|_| LicenseError::Storage("legacy store lock poisoned".to_string()))?
            .clone())
    }
}

/// Store and list legacy licenses.
#[derive(Clone)]
pub struct LegacyLicenses {
    records: Arc<dyn LegacyRecordStore>,
}

impl LegacyLicenses {
    pub fn new(records: Arc<dyn LegacyRecordStore>) -> Self {
        Self { records }
    }

    /// Mints a new client token.
    #[must_use]
    pub fn issue_token() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Appends `(token, license)`. The ciphertext is stored as given.
    pub fn store_license(&self, license: &str, token: &str) -> LicenseResult<()> {
        self.records.insert(&LicenseRecord {
            token: token.to_string(),
            license: license.to_string(),
        })?;
        info!("stored legacy license for token {token}");
        Ok(())
    }

    /// Decrypts every row, keyed by token.
    ///
    /// Rows that fail to decrypt or parse are skipped. When a token has
    /// several rows, the most recently stored one wins.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rows cannot be read at all.
    pub fn list_licenses(&self) -> LicenseResult<BTreeMap<String, LicenseInfo>> {
        let rows = self.records.list()?;
        let total = rows.len();
        let mut licenses = BTreeMap::new();

        for row in rows {
            let plaintext = match decrypt_string(&pack_token(&row.token), &row.license) {
                Ok(p) => p,
                Err(e) => {
                    warn!("skipping legacy license for token {}: {e}", row.token);
                    continue;
                }
            };
            match serde_json::from_str::<LicenseInfo>(&plaintext) {
                Ok(info) => {
                    licenses.insert(row.token, info);
                }
                Err(e) => {
                    warn!("skipping legacy license for token {}: invalid JSON: {e}", row.token);
                }
            }
        }

        debug!("decoded {} of {total} legacy license rows", licenses.len());
        Ok(licenses)
    }
}

impl std::fmt::Debug for LegacyLicenses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyLicenses").finish_non_exhaustive()
    }
}
