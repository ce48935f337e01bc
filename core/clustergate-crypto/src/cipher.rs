//! ChaCha20-Poly1305 sealing of legacy license payloads.
//!
//! A sealed payload is stored as one base64 string: the 12-byte nonce
//! followed by the ciphertext and its 16-byte tag.

use crate::error::{CryptoError, CryptoResult};
use crate::key::LegacyKey;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &LegacyKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(key.as_bytes().into())
}

/// Seals `plaintext` under `key` with a fresh nonce.
///
/// Legacy licenses are sealed by the issuing side; this is the inverse of
/// [`open`] for tooling that has to produce one.
pub fn seal(key: &LegacyKey, plaintext: &[u8]) -> CryptoResult<String> {
    let mut framed = vec![0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut framed);

    let sealed = cipher_for(key)
        .encrypt(Nonce::from_slice(&framed), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    framed.extend_from_slice(&sealed);
    Ok(STANDARD.encode(framed))
}

/// Opens a stored payload sealed under `key`.
pub fn open(key: &LegacyKey, encoded: &str) -> CryptoResult<Vec<u8>> {
    let framed = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
    if framed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "ciphertext too short: {} bytes",
            framed.len()
        )));
    }

    let (nonce, sealed) = framed.split_at(NONCE_SIZE);
    cipher_for(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Decryption("wrong token or tampered ciphertext".to_string()))
}

/// [`seal`] for text payloads.
pub fn encrypt_string(key: &LegacyKey, plaintext: &str) -> CryptoResult<String> {
    seal(key, plaintext.as_bytes())
}

/// [`open`] for text payloads.
pub fn decrypt_string(key: &LegacyKey, encoded: &str) -> CryptoResult<String> {
    String::from_utf8(open(key, encoded)?)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}
