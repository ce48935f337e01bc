//! Activation and validation of signed licenses.
//!
//! Every check runs the same short-circuiting pipeline:
//!
//! 1. decode the artifact or stored record
//! 2. verify the signature against the embedded key
//! 3. compare the bound enterprise (activation only)
//! 4. check `start_at <= now <= expire_at`
//!
//! The first failing stage decides the reason; later stages are skipped.
//! Business-rule failures come back as an invalid [`LicenseStatus`], only
//! infrastructure faults come back as `Err`.

use crate::clock::{Clock, SystemClock};
use crate::error::{LicenseResult, Rejection};
use crate::hook::{LicenseListener, NoopListener};
use crate::identity::{ClusterIdentity, HostIdentity};
use crate::status::LicenseStatus;
use crate::store::CurrentLicenseStore;
use crate::token::LicenseToken;
use crate::verifier::SignatureVerifier;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs signature, binding and time checks on a decoded token.
///
/// `enterprise_id` is `None` for status queries, which have no caller
/// binding to compare against.
pub fn validate_token(
    verifier: &SignatureVerifier,
    token: &LicenseToken,
    enterprise_id: Option<&str>,
    now: i64,
) -> Result<(), Rejection> {
    verifier.verify(token).map_err(|e| {
        debug!("license {} failed signature check: {e}", token.code);
        Rejection::InvalidSignature
    })?;

    if let Some(requested) = enterprise_id {
        if token.enterprise_id != requested {
            return Err(Rejection::EnterpriseMismatch {
                licensed: token.enterprise_id.clone(),
                requested: requested.to_string(),
            });
        }
    }

    // A window with start_at > expire_at can violate both bounds; the
    // start check runs first and wins.
    if now < token.start_at {
        return Err(Rejection::NotYetValid);
    }
    if now > token.expire_at {
        return Err(Rejection::Expired);
    }
    Ok(())
}

/// The signed-license activation and status service.
///
/// Holds no locks and no long-lived resources. Concurrent activations race
/// on the store write and the last writer wins.
pub struct LicenseEngine {
    verifier: SignatureVerifier,
    store: CurrentLicenseStore,
    identity: Arc<dyn ClusterIdentity>,
    listener: Arc<dyn LicenseListener>,
    clock: Arc<dyn Clock>,
}

impl LicenseEngine {
    /// Creates an engine with the host identity, no listener and the wall clock.
    pub fn new(verifier: SignatureVerifier, store: CurrentLicenseStore) -> Self {
        Self {
            verifier,
            store,
            identity: Arc::new(HostIdentity::default()),
            listener: Arc::new(NoopListener),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the cluster identity source.
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn ClusterIdentity>) -> Self {
        self.identity = identity;
        self
    }

    /// Registers the listener notified after each successful activation,
    /// replacing any previous one.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn LicenseListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the registered listener.
    #[must_use]
    pub fn listener(&self) -> Arc<dyn LicenseListener> {
        Arc::clone(&self.listener)
    }

    /// Returns the current time as seen by this engine.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Returns the store the engine persists to.
    #[must_use]
    pub fn store(&self) -> &CurrentLicenseStore {
        &self.store
    }

    /// Verifies `artifact` for `enterprise_id` and, if valid, makes it the
    /// current license.
    ///
    /// On success the verified token, annotated with this cluster's id when
    /// available, overwrites the stored record and the listener is notified.
    ///
    /// # Errors
    ///
    /// Only store failures are returned as errors. A failed cluster id lookup
    /// is logged and does not block activation.
    pub fn activate(&self, artifact: &str, enterprise_id: &str) -> LicenseResult<LicenseStatus> {
        let now = self.clock.now();

        let token = match LicenseToken::decode(artifact) {
            Ok(token) => token,
            Err(e) => {
                debug!("rejecting activation: {e}");
                return Ok(LicenseStatus::invalid(Rejection::Malformed(e.to_string()), None));
            }
        };

        if let Err(rejection) = validate_token(&self.verifier, &token, Some(enterprise_id), now) {
            debug!("rejecting activation of {}: {rejection}", token.code);
            return Ok(LicenseStatus::invalid(rejection, Some(token)));
        }

        let token = match self.identity.cluster_id() {
            Ok(cluster_id) => token.with_cluster_id(cluster_id),
            Err(e) => {
                warn!("activating {} without cluster id: {e}", token.code);
                token
            }
        };

        self.store.save(&token)?;
        self.listener.license_changed();

        info!(
            "activated license {} for {} ({}), valid until {}",
            token.code, token.company, token.enterprise_id, token.expire_at
        );
        Ok(LicenseStatus::valid(token))
    }

    /// Re-verifies the persisted license. Read-only.
    ///
    /// A missing or empty record yields `no license configured`; a record
    /// that fails any check is reported with that check's reason.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub fn status(&self) -> LicenseResult<LicenseStatus> {
        let Some(record) = self.store.load()? else {
            return Ok(LicenseStatus::invalid(Rejection::NoLicense, None));
        };
        let now = self.clock.now();

        let token = match LicenseToken::from_record(&record) {
            Ok(token) => token,
            Err(e) => {
                warn!("stored license at {} is unreadable: {e}", self.store.key());
                return Ok(LicenseStatus::invalid(Rejection::Malformed(e.to_string()), None));
            }
        };

        match validate_token(&self.verifier, &token, None, now) {
            Ok(()) => Ok(LicenseStatus::valid(token)),
            Err(rejection) => {
                debug!("stored license {} is invalid: {rejection}", token.code);
                Ok(LicenseStatus::invalid(rejection, Some(token)))
            }
        }
    }
}

impl std::fmt::Debug for LicenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseEngine")
            .field("verifier", &self.verifier)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
