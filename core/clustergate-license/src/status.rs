//! The externally visible result of activation and status queries.

use crate::error::Rejection;
use crate::token::LicenseToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a license check.
///
/// Fields are private: a valid status can only be built inside this crate,
/// after every check of the validation pipeline has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseStatus {
    valid: bool,
    reason: String,
    token: Option<LicenseToken>,
    #[serde(skip)]
    rejection: Option<Rejection>,
}

impl LicenseStatus {
    pub(crate) fn valid(token: LicenseToken) -> Self {
        Self {
            valid: true,
            reason: String::new(),
            token: Some(token),
            rejection: None,
        }
    }

    /// Builds an invalid status. `token` is absent when decoding failed.
    #[must_use]
    pub fn invalid(rejection: Rejection, token: Option<LicenseToken>) -> Self {
        Self {
            valid: false,
            reason: rejection.to_string(),
            token,
            rejection: Some(rejection),
        }
    }

    /// Returns true if the license passed every check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Human-readable cause, empty when valid.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The rejection that made this status invalid.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// The token this status was derived from.
    #[must_use]
    pub fn token(&self) -> Option<&LicenseToken> {
        self.token.as_ref()
    }

    /// Flattens the status for display or API responses.
    #[must_use]
    pub fn summary(&self, now: i64) -> LicenseSummary {
        let token = self.token.as_ref();
        LicenseSummary {
            valid: self.valid,
            reason: self.reason.clone(),
            code: token.map(|t| t.code.clone()).unwrap_or_default(),
            company: token.map(|t| t.company.clone()).unwrap_or_default(),
            enterprise_id: token.map(|t| t.enterprise_id.clone()).unwrap_or_default(),
            cluster_id: token.map(|t| t.cluster_id.clone()).unwrap_or_default(),
            tier: token.map(|t| t.tier.clone()).unwrap_or_default(),
            start_at: token.and_then(|t| DateTime::from_timestamp(t.start_at, 0)),
            expire_at: token.and_then(|t| DateTime::from_timestamp(t.expire_at, 0)),
            days_remaining: token.map(|t| t.days_remaining(now)).unwrap_or(0),
        }
    }
}

/// Flat view of a [`LicenseStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub valid: bool,
    pub reason: String,
    pub code: String,
    pub company: String,
    pub enterprise_id: String,
    pub cluster_id: String,
    pub tier: String,
    pub start_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub days_remaining: u32,
}
