//! Token-derived keys for the legacy cipher.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of cipher keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Byte used to right-pad tokens shorter than [`KEY_SIZE`].
pub const TOKEN_PAD: u8 = b'0';

/// A legacy cipher key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LegacyKey {
    bytes: [u8; KEY_SIZE],
}

impl LegacyKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for LegacyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Packs a client token into a cipher key.
///
/// Tokens longer than [`KEY_SIZE`] are truncated; shorter ones are
/// right-padded with [`TOKEN_PAD`]. Two tokens sharing a 32-byte prefix
/// therefore yield the same key.
pub fn pack_token(token: &str) -> LegacyKey {
    let mut bytes = [TOKEN_PAD; KEY_SIZE];
    let raw = token.as_bytes();
    let len = raw.len().min(KEY_SIZE);
    bytes[..len].copy_from_slice(&raw[..len]);
    LegacyKey { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_token_is_padded() {
        let key = pack_token("abc");
        assert_eq!(&key.as_bytes()[..3], b"abc");
        assert!(key.as_bytes()[3..].iter().all(|b| *b == TOKEN_PAD));
    }

    #[test]
    fn long_token_is_truncated() {
        let token = "x".repeat(40);
        let key = pack_token(&token);
        assert_eq!(key.as_bytes(), &[b'x'; KEY_SIZE]);
    }

    #[test]
    fn debug_redacts_bytes() {
        let key = pack_token("secret-token");
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("secret"));
    }
}
