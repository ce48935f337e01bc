//! Ed25519 signature verification for license tokens.
//!
//! The production public key is compiled in from `keys/license_public.pem`.
//! There is no rotation path: replacing the key means shipping a new build.

use crate::error::{LicenseError, LicenseResult, SignatureError};
use crate::token::LicenseToken;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{pkcs8::DecodePublicKey, Signature, VerifyingKey};

/// Embedded SPKI PEM public key for production license verification.
pub const LICENSE_PUBLIC_KEY_PEM: &str = include_str!("../keys/license_public.pem");

/// Verifies token signatures against a single public key. Stateless.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Builds a verifier from the embedded production key.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::PublicKey`] if the embedded PEM is corrupt.
    pub fn embedded() -> LicenseResult<Self> {
        Self::from_pem(LICENSE_PUBLIC_KEY_PEM)
    }

    /// Builds a verifier from an SPKI PEM public key.
    pub fn from_pem(pem: &str) -> LicenseResult<Self> {
        let key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| LicenseError::PublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Builds a verifier from raw key bytes.
    /// Used for testing with a generated key pair.
    pub fn from_bytes(bytes: &[u8; 32]) -> LicenseResult<Self> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| LicenseError::PublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Checks `token.signature` against the canonical encoding of the token.
    ///
    /// Uses strict verification, which rejects small-order keys and
    /// non-canonical signatures. Timing is that of the underlying primitive.
    pub fn verify(&self, token: &LicenseToken) -> Result<(), SignatureError> {
        let raw = STANDARD
            .decode(token.signature.trim())
            .map_err(|e| SignatureError::Malformed(format!("invalid base64: {e}")))?;
        let signature = Signature::from_slice(&raw)
            .map_err(|_| SignatureError::Malformed("invalid signature length".to_string()))?;

        self.key
            .verify_strict(&token.encode(), &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}
