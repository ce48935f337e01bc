//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use clustergate_license::{
    ConfigKey, ConfigStore, CurrentLicenseStore, FixedClock, LicenseEngine, LicenseError,
    LicenseResult, LicenseToken, MemoryConfigStore, SignatureVerifier, StaticIdentity, UNLIMITED,
};
use ed25519_dalek::{Signer, SigningKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed "now" used by engine tests.
pub const NOW: i64 = 1_760_000_000;

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, [u8; 32]) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

/// A second, unrelated key pair.
pub fn other_keypair() -> (SigningKey, [u8; 32]) {
    let signing_key = SigningKey::from_bytes(&[7u8; 32]);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

/// An unsigned token bound to `enterprise_id`, valid for `[start_at, expire_at]`.
pub fn unsigned_token(enterprise_id: &str, start_at: i64, expire_at: i64) -> LicenseToken {
    LicenseToken {
        code: "TEST-001".to_string(),
        company: "Test Corp".to_string(),
        contact: "test@example.com".to_string(),
        enterprise_id: enterprise_id.to_string(),
        cluster_id: String::new(),
        tier: "advanced".to_string(),
        allowed_plugins: vec!["*".to_string()],
        start_at,
        expire_at,
        subscribe_until: expire_at,
        cluster_limit: UNLIMITED,
        node_limit: UNLIMITED,
        memory_limit: UNLIMITED,
        cpu_limit: UNLIMITED,
        signature: String::new(),
    }
}

/// Signs the canonical encoding of `token` and stores the signature.
pub fn sign(signing_key: &SigningKey, mut token: LicenseToken) -> LicenseToken {
    let signature = signing_key.sign(&token.encode());
    token.signature = STANDARD.encode(signature.to_bytes());
    token
}

/// A signed token valid for one hour either side of [`NOW`].
pub fn signed_token(enterprise_id: &str) -> LicenseToken {
    let (sk, _) = test_keypair();
    sign(&sk, unsigned_token(enterprise_id, NOW - 3600, NOW + 3600))
}

/// A signed wire artifact with the given window.
pub fn artifact(enterprise_id: &str, start_at: i64, expire_at: i64) -> String {
    let (sk, _) = test_keypair();
    sign(&sk, unsigned_token(enterprise_id, start_at, expire_at)).to_artifact()
}

pub fn test_verifier() -> SignatureVerifier {
    let (_, pk) = test_keypair();
    SignatureVerifier::from_bytes(&pk).unwrap()
}

/// Config store whose every call fails, as an unreachable backend would.
pub struct UnreachableStore;

impl ConfigStore for UnreachableStore {
    fn get(&self, _key: &ConfigKey) -> LicenseResult<Option<String>> {
        Err(LicenseError::Storage("config store unreachable".to_string()))
    }

    fn put(&self, _key: &ConfigKey, _value: &str) -> LicenseResult<()> {
        Err(LicenseError::Storage("config store unreachable".to_string()))
    }
}

/// An engine over in-memory collaborators, with handles to each.
pub struct Harness {
    pub engine: LicenseEngine,
    pub store: Arc<MemoryConfigStore>,
    pub clock: Arc<FixedClock>,
    pub notifications: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryConfigStore::new());
        let clock = Arc::new(FixedClock::new(NOW));
        let notifications = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&notifications);
        let engine = LicenseEngine::new(
            test_verifier(),
            CurrentLicenseStore::new(store.clone(), ConfigKey::default()),
        )
        .with_identity(Arc::new(StaticIdentity::new("cluster-a")))
        .with_clock(clock.clone())
        .with_listener(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        Self {
            engine,
            store,
            clock,
            notifications,
        }
    }

    pub fn notified(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    /// Raw value in the store, bypassing the engine.
    pub fn stored(&self) -> Option<String> {
        self.store.get(&ConfigKey::default()).unwrap()
    }

    /// Writes a raw value into the store, bypassing the engine.
    pub fn tamper(&self, value: &str) {
        self.store.put(&ConfigKey::default(), value).unwrap();
    }
}
