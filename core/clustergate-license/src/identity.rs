//! Cluster identity for audit annotation.
//!
//! The id recorded on an activated license says which cluster activated it.
//! It is never compared against anything during validation.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Source of a stable cluster identifier.
pub trait ClusterIdentity: Send + Sync {
    /// Returns this cluster's identifier.
    fn cluster_id(&self) -> LicenseResult<String>;
}

/// A configured, fixed cluster id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(String);

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl ClusterIdentity for StaticIdentity {
    fn cluster_id(&self) -> LicenseResult<String> {
        if self.0.trim().is_empty() {
            return Err(LicenseError::Identity("configured cluster id is empty".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Derives a cluster id from the host running the control plane.
///
/// Combines the hostname with the first readable machine-id file, hashes
/// them with SHA-256 and keeps the first 16 bytes. Survives reboots; changes
/// when the host is reprovisioned.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    machine_id_paths: Vec<PathBuf>,
}

impl Default for HostIdentity {
    fn default() -> Self {
        Self {
            machine_id_paths: vec![
                PathBuf::from("/etc/machine-id"),
                PathBuf::from("/var/lib/dbus/machine-id"),
            ],
        }
    }
}

impl HostIdentity {
    /// Uses the given machine-id files, first readable wins.
    pub fn with_machine_id_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            machine_id_paths: paths,
        }
    }

    fn machine_id(&self) -> Option<String> {
        self.machine_id_paths
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

impl ClusterIdentity for HostIdentity {
    fn cluster_id(&self) -> LicenseResult<String> {
        let host = hostname::get()
            .map_err(|e| LicenseError::Identity(format!("hostname lookup failed: {e}")))?
            .into_string()
            .map_err(|_| LicenseError::Identity("hostname is not valid UTF-8".to_string()))?;

        let mut components = vec![host];
        if let Some(machine_id) = self.machine_id() {
            components.push(machine_id);
        }

        let mut hasher = Sha256::new();
        hasher.update(components.join("|").as_bytes());
        let hash = hasher.finalize();
        Ok(URL_SAFE_NO_PAD.encode(&hash[..16]))
    }
}
