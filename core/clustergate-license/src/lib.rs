//! License validation and activation for ClusterGate.
//!
//! This crate decides whether a deployment is entitled to run:
//! - Signed licenses: Ed25519 signature check against the embedded key,
//!   enterprise binding, validity window, persisted in a config store
//! - Legacy licenses: token-keyed ciphertexts in a relational table,
//!   read-compatible only
//! - Entitlement caching for request paths, invalidated on activation
//!
//! # Trust model
//!
//! A [`LicenseStatus`] is valid only if, in this process, the signature
//! verified against the embedded public key, the enterprise matched (on
//! activation) and `start_at <= now <= expire_at`. The cluster id written on
//! activation is an audit annotation and never part of that decision.
//!
//! # License Format
//!
//! Artifacts are `base64(json(LicenseToken))`. The signature covers the
//! canonical encoding from [`LicenseToken::encode`].

mod clock;
mod config;
mod engine;
mod entitlement;
mod error;
mod hook;
mod identity;
mod legacy;
mod source;
mod status;
mod store;
mod token;
mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LicenseConfig;
pub use engine::{validate_token, LicenseEngine};
pub use entitlement::{Entitlement, EntitlementCache, QuotaViolation, Usage, DEFAULT_CACHE_TTL};
pub use error::{DecodeError, LicenseError, LicenseResult, Rejection, SignatureError};
pub use hook::{LicenseListener, NoopListener};
pub use identity::{ClusterIdentity, HostIdentity, StaticIdentity};
pub use legacy::{
    LegacyLicenses, LegacyRecordStore, LicenseInfo, MemoryRecordStore, LEGACY_TIME_FORMAT,
};
pub use source::{ActivationRequest, LicenseFormat, LicenseSource, Licensing, SourceStatus};
pub use status::{LicenseStatus, LicenseSummary};
pub use store::{
    ConfigKey, ConfigStore, CurrentLicenseStore, FileConfigStore, MemoryConfigStore,
    DEFAULT_KEY, DEFAULT_NAME, DEFAULT_NAMESPACE,
};
pub use token::{LicenseToken, UNLIMITED};
pub use verifier::{SignatureVerifier, LICENSE_PUBLIC_KEY_PEM};

pub use clustergate_db::LicenseRecord;
