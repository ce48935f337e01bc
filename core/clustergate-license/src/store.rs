//! Persistence of the current signed license.
//!
//! The active license lives as one key in a cluster-wide key/value config
//! store, addressed by namespace, name and key. The value is the verified
//! token record (see [`LicenseToken::to_record`]), never the raw artifact.

use crate::error::{LicenseError, LicenseResult};
use crate::token::LicenseToken;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Default namespace holding the license record.
pub const DEFAULT_NAMESPACE: &str = "clustergate-system";
/// Default config object name.
pub const DEFAULT_NAME: &str = "clustergate-license";
/// Default key inside the config object.
pub const DEFAULT_KEY: &str = "license";

/// Address of one value in a config store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

impl ConfigKey {
    /// Creates a key from its three parts.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            key: key.into(),
        }
    }
}

impl Default for ConfigKey {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_NAME, DEFAULT_KEY)
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.namespace, self.name, self.key)
    }
}

/// A cluster key/value config store.
///
/// Implementations own their timeouts; a timed-out or cancelled call must
/// surface as an `Err`, never as a missing value.
pub trait ConfigStore: Send + Sync {
    /// Reads a value, `None` if absent.
    fn get(&self, key: &ConfigKey) -> LicenseResult<Option<String>>;

    /// Creates or overwrites a value.
    fn put(&self, key: &ConfigKey, value: &str) -> LicenseResult<()>;
}

/// Process-local config store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<ConfigKey, String>>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &ConfigKey) -> LicenseResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| LicenseError::Storage("config store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &ConfigKey, value: &str) -> LicenseResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| LicenseError::Storage("config store lock poisoned".to_string()))?;
        values.insert(key.clone(), value.to_string());
        Ok(())
    }
}

/// Config store backed by a directory: one JSON string map per
/// `<root>/<namespace>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &ConfigKey) -> LicenseResult<PathBuf> {
        for part in [&key.namespace, &key.name] {
            if part.is_empty() || part.contains(['/', '\\']) || part == ".." {
                return Err(LicenseError::Config(format!(
                    "invalid config store segment: {part:?}"
                )));
            }
        }
        Ok(self
            .root
            .join(&key.namespace)
            .join(format!("{}.json", key.name)))
    }

    fn read_object(path: &Path) -> LicenseResult<BTreeMap<String, String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &ConfigKey) -> LicenseResult<Option<String>> {
        let path = self.object_path(key)?;
        let mut object = Self::read_object(&path)?;
        Ok(object.remove(&key.key))
    }

    fn put(&self, key: &ConfigKey, value: &str) -> LicenseResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut object = Self::read_object(&path)?;
        object.insert(key.key.clone(), value.to_string());

        // Write-then-rename so readers never observe a half-written object.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&object)?)?;
        fs::rename(&tmp, &path)?;
        debug!("wrote {key} to {}", path.display());
        Ok(())
    }
}

/// The single active signed license in a [`ConfigStore`].
#[derive(Clone)]
pub struct CurrentLicenseStore {
    store: Arc<dyn ConfigStore>,
    key: ConfigKey,
}

impl CurrentLicenseStore {
    /// Binds `store` at `key`.
    pub fn new(store: Arc<dyn ConfigStore>, key: ConfigKey) -> Self {
        Self { store, key }
    }

    /// Returns where the license is kept.
    #[must_use]
    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    /// Reads the stored record. Empty values read as absent.
    pub fn load(&self) -> LicenseResult<Option<String>> {
        let value = self.store.get(&self.key)?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    /// Overwrites the stored record with a verified token.
    pub fn save(&self, token: &LicenseToken) -> LicenseResult<()> {
        self.store.put(&self.key, &token.to_record())?;
        info!("stored license {} at {}", token.code, self.key);
        Ok(())
    }
}

impl std::fmt::Debug for CurrentLicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentLicenseStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
