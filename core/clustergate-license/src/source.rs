//! One entry point for both license formats.
//!
//! Callers pick the format explicitly with [`LicenseFormat`]; nothing here
//! guesses the format from the shape of the input.

use crate::engine::LicenseEngine;
use crate::entitlement::{Entitlement, EntitlementCache};
use crate::error::{LicenseError, LicenseResult};
use crate::hook::LicenseListener;
use crate::legacy::{LegacyLicenses, LicenseInfo};
use crate::status::LicenseStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The two coexisting license formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseFormat {
    /// Token-keyed ciphertext in the relational table.
    Legacy,
    /// Ed25519-signed token in the config store.
    Signed,
}

impl std::fmt::Display for LicenseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Signed => f.write_str("signed"),
        }
    }
}

impl FromStr for LicenseFormat {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "signed" => Ok(Self::Signed),
            other => Err(LicenseError::Config(format!("unknown license format: {other:?}"))),
        }
    }
}

/// Input to an activation, per format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationRequest {
    /// Store a legacy ciphertext under its client token.
    Legacy { license: String, token: String },
    /// Verify and install a signed artifact for an enterprise.
    Signed {
        artifact: String,
        enterprise_id: String,
    },
}

impl ActivationRequest {
    /// The format this request targets.
    #[must_use]
    pub fn format(&self) -> LicenseFormat {
        match self {
            Self::Legacy { .. } => LicenseFormat::Legacy,
            Self::Signed { .. } => LicenseFormat::Signed,
        }
    }
}

/// Result of an activation or status query, per format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// All readable legacy licenses, keyed by client token.
    Legacy(BTreeMap<String, LicenseInfo>),
    /// The signed license status.
    Signed(LicenseStatus),
}

/// A store of licenses in one format.
pub trait LicenseSource: Send + Sync {
    /// The format this source handles.
    fn format(&self) -> LicenseFormat;

    /// Installs a license.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FormatMismatch`] for a request of the other
    /// format, or an infrastructure error from the underlying store.
    fn activate(&self, request: &ActivationRequest) -> LicenseResult<SourceStatus>;

    /// Reports the licenses currently installed.
    fn status(&self) -> LicenseResult<SourceStatus>;
}

fn mismatch(request: &ActivationRequest, target: LicenseFormat) -> LicenseError {
    LicenseError::FormatMismatch {
        request: request.format(),
        target,
    }
}

impl LicenseSource for LegacyLicenses {
    fn format(&self) -> LicenseFormat {
        LicenseFormat::Legacy
    }

    fn activate(&self, request: &ActivationRequest) -> LicenseResult<SourceStatus> {
        let ActivationRequest::Legacy { license, token } = request else {
            return Err(mismatch(request, LicenseFormat::Legacy));
        };
        self.store_license(license, token)?;
        self.status()
    }

    fn status(&self) -> LicenseResult<SourceStatus> {
        Ok(SourceStatus::Legacy(self.list_licenses()?))
    }
}

impl LicenseSource for LicenseEngine {
    fn format(&self) -> LicenseFormat {
        LicenseFormat::Signed
    }

    fn activate(&self, request: &ActivationRequest) -> LicenseResult<SourceStatus> {
        let ActivationRequest::Signed {
            artifact,
            enterprise_id,
        } = request
        else {
            return Err(mismatch(request, LicenseFormat::Signed));
        };
        Ok(SourceStatus::Signed(LicenseEngine::activate(
            self,
            artifact,
            enterprise_id,
        )?))
    }

    fn status(&self) -> LicenseResult<SourceStatus> {
        Ok(SourceStatus::Signed(LicenseEngine::status(self)?))
    }
}

/// Both license sources plus the request-path entitlement cache.
#[derive(Debug)]
pub struct Licensing {
    legacy: LegacyLicenses,
    signed: LicenseEngine,
    cache: Arc<EntitlementCache>,
}

impl Licensing {
    /// Wires the sources together and adds the entitlement cache to the
    /// signed engine's listener. A listener already registered on `signed`
    /// keeps being notified, after the cache is cleared.
    pub fn new(legacy: LegacyLicenses, signed: LicenseEngine, cache_ttl: Duration) -> Self {
        let cache = Arc::new(EntitlementCache::new(cache_ttl));
        let previous = signed.listener();
        let invalidate = Arc::clone(&cache);
        let signed = signed.with_listener(Arc::new(move || {
            invalidate.license_changed();
            previous.license_changed();
        }));
        Self {
            legacy,
            signed,
            cache,
        }
    }

    /// Returns the source for `format`.
    #[must_use]
    pub fn source(&self, format: LicenseFormat) -> &dyn LicenseSource {
        match format {
            LicenseFormat::Legacy => &self.legacy,
            LicenseFormat::Signed => &self.signed,
        }
    }

    /// Routes `request` to the source of its format.
    pub fn activate(&self, request: &ActivationRequest) -> LicenseResult<SourceStatus> {
        self.source(request.format()).activate(request)
    }

    /// Queries the source for `format`.
    pub fn status(&self, format: LicenseFormat) -> LicenseResult<SourceStatus> {
        self.source(format).status()
    }

    /// The signed-license engine.
    #[must_use]
    pub fn signed(&self) -> &LicenseEngine {
        &self.signed
    }

    /// The legacy license service.
    #[must_use]
    pub fn legacy(&self) -> &LegacyLicenses {
        &self.legacy
    }

    /// The cached entitlement of the signed license.
    pub fn entitlement(&self) -> LicenseResult<Arc<Entitlement>> {
        self.cache.current(&self.signed)
    }

    /// The entitlement cache.
    #[must_use]
    pub fn cache(&self) -> &EntitlementCache {
        &self.cache
    }
}
