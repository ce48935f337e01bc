//! Request-path entitlement decisions.
//!
//! Re-verifying the license on every request is wasteful, so the derived
//! [`Entitlement`] is cached for a TTL. The cache registers as the engine's
//! [`LicenseListener`] and drops its entry whenever a new license is
//! activated.

use crate::engine::LicenseEngine;
use crate::error::LicenseResult;
use crate::hook::LicenseListener;
use crate::status::LicenseStatus;
use crate::token::{LicenseToken, UNLIMITED};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Default time an entitlement stays cached (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Resources currently in use by the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub clusters: i64,
    pub nodes: i64,
    /// Memory in MiB.
    pub memory_mb: i64,
    /// CPU in millicores.
    pub cpu_millis: i64,
}

/// Why a request is not covered by the license.
///
/// The display strings are the reason codes the API layer returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaViolation {
    /// No valid license, or it lapsed while cached.
    #[error("authorize_expiration_of_authorization")]
    Unlicensed,

    #[error("authorize_cluster_lack_of_license")]
    Clusters { used: i64, limit: i64 },

    #[error("authorize_cluster_lack_of_node")]
    Nodes { used: i64, limit: i64 },

    #[error("authorize_cluster_lack_of_memory")]
    Memory { used: i64, limit: i64 },

    #[error("authorize_cluster_lack_of_cpu")]
    Cpu { used: i64, limit: i64 },
}

/// What the current license allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    status: LicenseStatus,
}

impl Entitlement {
    /// Derives the entitlement granted by `status`.
    #[must_use]
    pub fn from_status(status: LicenseStatus) -> Self {
        Self { status }
    }

    /// The status this entitlement was derived from.
    #[must_use]
    pub fn status(&self) -> &LicenseStatus {
        &self.status
    }

    fn licensed_token(&self, now: i64) -> Option<&LicenseToken> {
        if !self.status.is_valid() {
            return None;
        }
        self.status.token().filter(|t| now <= t.expire_at)
    }

    /// Checks `usage` against the license limits at `now`.
    pub fn check_usage(&self, usage: Usage, now: i64) -> Result<(), QuotaViolation> {
        let token = self.licensed_token(now).ok_or(QuotaViolation::Unlicensed)?;

        let exceeds = |used: i64, limit: i64| limit != UNLIMITED && used > limit;

        if exceeds(usage.clusters, token.cluster_limit) {
            return Err(QuotaViolation::Clusters {
                used: usage.clusters,
                limit: token.cluster_limit,
            });
        }
        if exceeds(usage.nodes, token.node_limit) {
            return Err(QuotaViolation::Nodes {
                used: usage.nodes,
                limit: token.node_limit,
            });
        }
        if exceeds(usage.memory_mb, token.memory_limit) {
            return Err(QuotaViolation::Memory {
                used: usage.memory_mb,
                limit: token.memory_limit,
            });
        }
        if exceeds(usage.cpu_millis, token.cpu_limit) {
            return Err(QuotaViolation::Cpu {
                used: usage.cpu_millis,
                limit: token.cpu_limit,
            });
        }
        Ok(())
    }

    /// True if the license is valid at `now` and enables `plugin`.
    #[must_use]
    pub fn is_plugin_allowed(&self, plugin: &str, now: i64) -> bool {
        self.licensed_token(now)
            .is_some_and(|t| t.is_plugin_allowed(plugin))
    }
}

struct CachedEntitlement {
    entitlement: Arc<Entitlement>,
    expires_at: Instant,
}

/// TTL cache of the current [`Entitlement`].
///
/// Every invalidation bumps a generation counter. A refill that started
/// before the latest invalidation returns its result but does not cache it.
pub struct EntitlementCache {
    ttl: Duration,
    generation: AtomicU64,
    entry: RwLock<Option<CachedEntitlement>>,
}

impl EntitlementCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entry: RwLock::new(None),
        }
    }

    /// Returns the cached entitlement, querying `engine` when stale or empty.
    ///
    /// # Errors
    ///
    /// Propagates store failures from [`LicenseEngine::status`].
    pub fn current(&self, engine: &LicenseEngine) -> LicenseResult<Arc<Entitlement>> {
        if let Ok(entry) = self.entry.read() {
            if let Some(cached) = entry.as_ref().filter(|c| Instant::now() < c.expires_at) {
                return Ok(Arc::clone(&cached.entitlement));
            }
        }

        debug!("entitlement cache miss, querying license status");
        let generation = self.generation.load(Ordering::SeqCst);
        let entitlement = Arc::new(Entitlement::from_status(engine.status()?));
        if let Ok(mut entry) = self.entry.write() {
            if self.generation.load(Ordering::SeqCst) == generation {
                *entry = Some(CachedEntitlement {
                    entitlement: Arc::clone(&entitlement),
                    expires_at: Instant::now() + self.ttl,
                });
            } else {
                debug!("license changed during refresh, result not cached");
            }
        }
        Ok(entitlement)
    }

    /// Drops the cached entitlement.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut entry) = self.entry.write() {
            *entry = None;
        }
    }

    /// True if an unexpired entitlement is cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.entry
            .read()
            .map(|e| e.as_ref().is_some_and(|c| Instant::now() < c.expires_at))
            .unwrap_or(false)
    }
}

impl Default for EntitlementCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl LicenseListener for EntitlementCache {
    fn license_changed(&self) {
        debug!("license changed, dropping cached entitlement");
        self.invalidate();
    }
}

impl std::fmt::Debug for EntitlementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementCache")
            .field("ttl", &self.ttl)
            .field("cached", &self.is_cached())
            .finish()
    }
}
