//! License token model and codec.
//!
//! A signed license travels as `base64(json(token))`. The issuer signs the
//! canonical encoding returned by [`LicenseToken::encode`]: compact JSON of
//! every field in declaration order, minus `signature` and `cluster_id`.
//! `cluster_id` is an audit annotation written by the activating cluster,
//! so it stays outside the signed payload.
//!
//! Nothing decoded here is trusted until
//! [`SignatureVerifier::verify`](crate::SignatureVerifier::verify) succeeds.

use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// Limit value meaning "no limit".
pub const UNLIMITED: i64 = -1;

fn unlimited() -> i64 {
    UNLIMITED
}

/// A decoded license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseToken {
    /// Identifier of this license instance.
    pub code: String,
    /// Licensed company name.
    pub company: String,
    /// Contact address of the licensee.
    #[serde(default)]
    pub contact: String,
    /// Enterprise the license is bound to.
    pub enterprise_id: String,
    /// Cluster that activated the license. Audit only, unsigned.
    #[serde(default)]
    pub cluster_id: String,
    /// Product tier, e.g. `"advanced"`.
    #[serde(default)]
    pub tier: String,
    /// Plugins this license enables; `"*"` enables all.
    #[serde(default)]
    pub allowed_plugins: Vec<String>,
    /// First valid instant, UTC epoch seconds, inclusive.
    pub start_at: i64,
    /// Last valid instant, UTC epoch seconds, inclusive.
    pub expire_at: i64,
    /// End of the support subscription, UTC epoch seconds.
    #[serde(default)]
    pub subscribe_until: i64,
    /// Maximum number of clusters, or [`UNLIMITED`].
    #[serde(default = "unlimited")]
    pub cluster_limit: i64,
    /// Maximum number of nodes, or [`UNLIMITED`].
    #[serde(default = "unlimited")]
    pub node_limit: i64,
    /// Maximum memory in MiB, or [`UNLIMITED`].
    #[serde(default = "unlimited")]
    pub memory_limit: i64,
    /// Maximum CPU in millicores, or [`UNLIMITED`].
    #[serde(default = "unlimited")]
    pub cpu_limit: i64,
    /// Base64 Ed25519 signature over [`LicenseToken::encode`].
    pub signature: String,
}

/// The signed subset of a token, in signing order.
#[derive(Serialize)]
struct SignedFields<'a> {
    code: &'a str,
    company: &'a str,
    contact: &'a str,
    enterprise_id: &'a str,
    tier: &'a str,
    allowed_plugins: &'a [String],
    start_at: i64,
    expire_at: i64,
    subscribe_until: i64,
    cluster_limit: i64,
    node_limit: i64,
    memory_limit: i64,
    cpu_limit: i64,
}

impl LicenseToken {
    /// Decodes a wire artifact (`base64(json)`).
    ///
    /// # Errors
    ///
    /// Returns an error for empty, non-base64, truncated or non-JSON input,
    /// or JSON missing a required field.
    pub fn decode(artifact: &str) -> Result<Self, DecodeError> {
        let artifact = artifact.trim();
        if artifact.is_empty() {
            return Err(DecodeError::Empty);
        }
        let json = STANDARD.decode(artifact)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Returns the wire artifact for this token, the inverse of [`decode`](Self::decode).
    #[must_use]
    pub fn to_artifact(&self) -> String {
        STANDARD.encode(self.to_record())
    }

    /// Returns the canonical signed payload.
    ///
    /// Deterministic: equal tokens always produce equal bytes, and the
    /// result does not depend on `signature` or `cluster_id`.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let fields = SignedFields {
            code: &self.code,
            company: &self.company,
            contact: &self.contact,
            enterprise_id: &self.enterprise_id,
            tier: &self.tier,
            allowed_plugins: &self.allowed_plugins,
            start_at: self.start_at,
            expire_at: self.expire_at,
            subscribe_until: self.subscribe_until,
            cluster_limit: self.cluster_limit,
            node_limit: self.node_limit,
            memory_limit: self.memory_limit,
            cpu_limit: self.cpu_limit,
        };
        serde_json::to_vec(&fields).expect("license fields always serialize")
    }

    /// Returns the plain-text form kept in the config store.
    ///
    /// Unlike [`encode`](Self::encode) this carries the signature and
    /// cluster id, so a reader can re-verify it.
    #[must_use]
    pub fn to_record(&self) -> String {
        serde_json::to_string_pretty(self).expect("license fields always serialize")
    }

    /// Parses the plain-text form written by [`to_record`](Self::to_record).
    ///
    /// # Errors
    ///
    /// Returns an error if the record is empty or not a complete token.
    pub fn from_record(record: &str) -> Result<Self, DecodeError> {
        let record = record.trim();
        if record.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_str(record)?)
    }

    /// Returns a copy annotated with the activating cluster.
    #[must_use]
    pub fn with_cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = cluster_id.into();
        self
    }

    /// Returns true if `plugin` is enabled by this license.
    #[must_use]
    pub fn is_plugin_allowed(&self, plugin: &str) -> bool {
        self.allowed_plugins
            .iter()
            .any(|allowed| allowed == "*" || allowed == plugin)
    }

    /// Whole days left until `expire_at`, or 0 once expired.
    #[must_use]
    pub fn days_remaining(&self, now: i64) -> u32 {
        let secs = self.expire_at.saturating_sub(now);
        if secs <= 0 {
            0
        } else {
            u32::try_from(secs / (24 * 60 * 60)).unwrap_or(u32::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> LicenseToken {
        LicenseToken {
            code: "L-1".into(),
            company: "Acme".into(),
            contact: String::new(),
            enterprise_id: "ent-1".into(),
            cluster_id: String::new(),
            tier: "advanced".into(),
            allowed_plugins: vec!["backup".into()],
            start_at: 0,
            expire_at: 86_400 * 10,
            subscribe_until: 0,
            cluster_limit: UNLIMITED,
            node_limit: 3,
            memory_limit: UNLIMITED,
            cpu_limit: UNLIMITED,
            signature: "sig".into(),
        }
    }

    #[test]
    fn encode_ignores_signature_and_cluster_id() {
        let a = token();
        let mut b = token().with_cluster_id("c-9");
        b.signature = "other".into();
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn encode_changes_with_signed_fields() {
        let a = token();
        let mut b = token();
        b.node_limit = 4;
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let json = r#"{"code":"c","company":"x","enterprise_id":"e","start_at":1,"expire_at":2,"signature":"s"}"#;
        let parsed = LicenseToken::from_record(json).unwrap();
        assert_eq!(parsed.node_limit, UNLIMITED);
        assert!(parsed.allowed_plugins.is_empty());
        assert!(parsed.cluster_id.is_empty());
    }

    #[test]
    fn days_remaining_floors_and_clamps() {
        let t = token();
        assert_eq!(t.days_remaining(0), 10);
        assert_eq!(t.days_remaining(1), 9);
        assert_eq!(t.days_remaining(t.expire_at + 5), 0);
    }

    #[test]
    fn plugin_wildcard() {
        let mut t = token();
        assert!(t.is_plugin_allowed("backup"));
        assert!(!t.is_plugin_allowed("gpu"));
        t.allowed_plugins = vec!["*".into()];
        assert!(t.is_plugin_allowed("gpu"));
    }
}
