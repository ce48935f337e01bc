//! Legacy license cipher for ClusterGate.
//!
//! Licenses issued before signed tokens were introduced are shipped as an
//! opaque ciphertext that only decrypts with the client token it was issued
//! for. The key is the token itself, padded or truncated to 32 bytes, so the
//! scheme is only as strong as the secrecy of that token. It is kept solely
//! to read licenses already in the field.
//!
//! Ciphertext layout: `base64(nonce || ChaCha20-Poly1305(plaintext))`.

mod cipher;
mod error;
mod key;

pub use cipher::{decrypt_string, encrypt_string, open, seal, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{pack_token, LegacyKey, KEY_SIZE, TOKEN_PAD};
