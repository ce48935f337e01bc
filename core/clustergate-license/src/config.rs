//! Service configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) is valid.

use crate::engine::LicenseEngine;
use crate::entitlement::DEFAULT_CACHE_TTL;
use crate::error::{LicenseError, LicenseResult};
use crate::identity::{ClusterIdentity, HostIdentity, StaticIdentity};
use crate::legacy::LegacyLicenses;
use crate::source::Licensing;
use crate::store::{
    ConfigKey, CurrentLicenseStore, FileConfigStore, DEFAULT_KEY, DEFAULT_NAME, DEFAULT_NAMESPACE,
};
use crate::verifier::SignatureVerifier;
use clustergate_db::{open_db, LicenseDao};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clustergate")
}

/// Where licenses are kept and how they are cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Root of the file-backed config store.
    pub store_dir: PathBuf,
    /// SQLite database holding legacy licenses.
    pub legacy_db: PathBuf,
    /// Config store namespace of the current license.
    pub namespace: String,
    /// Config object name of the current license.
    pub name: String,
    /// Key inside the config object.
    pub key: String,
    /// Entitlement cache lifetime in seconds.
    pub cache_ttl_secs: u64,
    /// Fixed cluster id. The host fingerprint is used when unset.
    pub cluster_id: Option<String>,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            store_dir: dir.join("config"),
            legacy_db: dir.join("legacy.db"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            name: DEFAULT_NAME.to_string(),
            key: DEFAULT_KEY.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            cluster_id: None,
        }
    }
}

impl LicenseConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> LicenseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("loaded license config from {}", path.display());
        Ok(config)
    }

    /// Rejects configs that cannot address a license record.
    pub fn validate(&self) -> LicenseResult<()> {
        for (field, value) in [
            ("namespace", &self.namespace),
            ("name", &self.name),
            ("key", &self.key),
        ] {
            if value.trim().is_empty() {
                return Err(LicenseError::Config(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// Location of the current license record.
    #[must_use]
    pub fn config_key(&self) -> ConfigKey {
        ConfigKey::new(&self.namespace, &self.name, &self.key)
    }

    /// Entitlement cache lifetime.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// The configured identity source.
    #[must_use]
    pub fn identity(&self) -> Arc<dyn ClusterIdentity> {
        match &self.cluster_id {
            Some(id) => Arc::new(StaticIdentity::new(id.clone())),
            None => Arc::new(HostIdentity::default()),
        }
    }

    /// Opens both stores and builds the licensing service.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, the embedded key is corrupt, or the
    /// legacy database cannot be opened.
    pub fn open(&self) -> LicenseResult<Licensing> {
        self.validate()?;
        let verifier = SignatureVerifier::embedded()?;
        let store = CurrentLicenseStore::new(
            Arc::new(FileConfigStore::new(&self.store_dir)),
            self.config_key(),
        );
        let engine = LicenseEngine::new(verifier, store).with_identity(self.identity());

        let dao = LicenseDao::new(open_db(&self.legacy_db)?);
        let legacy = LegacyLicenses::new(Arc::new(dao));

        Ok(Licensing::new(legacy, engine, self.cache_ttl()))
    }
}
