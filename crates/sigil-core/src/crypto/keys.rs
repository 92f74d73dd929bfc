// ============================================
// File: crates/sigil-core/src/crypto/keys.rs
// ============================================
//! # Session Key
//!
//! ## Main Functionality
//! - `SessionKey`: 32-byte symmetric secret derived once per handshake
//!
//! ## Key Layout
//! ```text
//! ┌──────────────────────────┬──────────────────────────┐
//! │ bytes 0..16              │ bytes 16..32             │
//! │ Ascon-128 key            │ default nonce seed       │
//! └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Zeroized on drop, never logged or serialized
//! - Owned exclusively by one `Session`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{ASCON_KEY_SIZE, SESSION_KEY_SIZE};

/// Symmetric session key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    cipher_key: [u8; ASCON_KEY_SIZE],
    nonce_seed: [u8; SESSION_KEY_SIZE - ASCON_KEY_SIZE],
}

impl SessionKey {
    /// Creates a session key from raw bytes. The input copy is wiped.
    #[must_use]
    pub fn from_bytes(mut bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        let mut key = Self {
            cipher_key: [0u8; ASCON_KEY_SIZE],
            nonce_seed: [0u8; SESSION_KEY_SIZE - ASCON_KEY_SIZE],
        };
        key.cipher_key.copy_from_slice(&bytes[..ASCON_KEY_SIZE]);
        key.nonce_seed.copy_from_slice(&bytes[ASCON_KEY_SIZE..]);
        bytes.zeroize();
        key
    }

    /// Returns the AEAD key half.
    ///
    /// # Security Warning
    /// Do not log or store the key material.
    #[must_use]
    pub const fn cipher_key(&self) -> &[u8; ASCON_KEY_SIZE] {
        &self.cipher_key
    }

    /// Returns the default nonce seed half.
    #[must_use]
    pub const fn nonce_seed(&self) -> &[u8] {
        &self.nonce_seed
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        write!(f, "SessionKey([REDACTED])")
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison
        let cipher = self.cipher_key[..].ct_eq(&other.cipher_key[..]);
        let seed = self.nonce_seed[..].ct_eq(&other.nonce_seed[..]);
        (cipher & seed).into()
    }
}

impl Eq for SessionKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let key = SessionKey::from_bytes(bytes);

        assert_eq!(key.cipher_key(), &bytes[..16]);
        assert_eq!(key.nonce_seed(), &bytes[16..]);
    }

    #[test]
    fn test_debug_redacted() {
        let key = SessionKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{key:?}"), "SessionKey([REDACTED])");
    }

    #[test]
    fn test_equality() {
        assert_eq!(SessionKey::from_bytes([1; 32]), SessionKey::from_bytes([1; 32]));
        assert_ne!(SessionKey::from_bytes([1; 32]), SessionKey::from_bytes([2; 32]));
    }
}
