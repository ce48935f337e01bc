//! Error types for the licensing module.
//!
//! Two tiers: [`Rejection`] is a business-rule outcome that ends up in
//! [`LicenseStatus::reason`](crate::LicenseStatus), while [`LicenseError`]
//! is an infrastructure fault returned as `Err`.

use thiserror::Error;

/// Failure to turn an artifact or stored record into a token.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Nothing to decode.
    #[error("license artifact is empty")]
    Empty,

    /// Artifact is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not a complete license JSON object.
    #[error("invalid license JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to verify a token's signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Signature field is not a well-formed Ed25519 signature.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// Signature does not match the canonical payload.
    #[error("signature does not match")]
    Mismatch,
}

/// Why a license was judged invalid.
///
/// The `Display` text is what operators see as the status reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Nothing is persisted in the current license store.
    #[error("no license configured")]
    NoLicense,

    /// Artifact or stored record could not be decoded.
    #[error("malformed license: {0}")]
    Malformed(String),

    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// License is bound to a different enterprise.
    #[error("enterprise mismatch: license is bound to {licensed:?}, activation requested by {requested:?}")]
    EnterpriseMismatch {
        /// Enterprise id embedded in the license.
        licensed: String,
        /// Enterprise id supplied by the caller.
        requested: String,
    },

    /// `now` is before `start_at`.
    #[error("license not yet valid")]
    NotYetValid,

    /// `now` is after `expire_at`.
    #[error("license expired")]
    Expired,
}

/// Infrastructure errors. Never used for business-rule rejections.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The embedded public key is missing or corrupt.
    #[error("license public key unusable: {0}")]
    PublicKey(String),

    /// Config store read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Legacy database failure.
    #[error("database error: {0}")]
    Database(#[from] clustergate_db::DbError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Cluster identity source is unreachable.
    #[error("cluster identity unavailable: {0}")]
    Identity(String),

    /// Request routed to a source of the other license format.
    #[error("{request} request sent to the {target} license source")]
    FormatMismatch {
        /// Format of the request.
        request: crate::LicenseFormat,
        /// Format of the source it reached.
        target: crate::LicenseFormat,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
