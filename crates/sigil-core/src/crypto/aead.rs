// ============================================
// File: crates/sigil-core/src/crypto/aead.rs
// ============================================
//! # Authenticated Encryption
//!
//! ## Creation Reason
//! Provides authenticated encryption for channel messages using the
//! Ascon-128 AEAD cipher.
//!
//! ## Main Functionality
//! - `AeadCipher`: Trait for message encryption/decryption
//! - `AsconCipher`: Production implementation (Ascon-128)
//! - `encrypt` / `decrypt`: One-shot helpers over a raw 16-byte key
//!
//! ## Ciphertext Format
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Encrypted body (len = plaintext len)               │
//! ├────────────────────────────────────────────────────┤
//! │ Tag (16 bytes)                                     │
//! └────────────────────────────────────────────────────┘
//! ```
//! The nonce and associated data are never part of the output.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never reuse a (key, nonce) pair; nonces come from `session`
//! - Every decrypt failure MUST map to `CoreError::AuthFailure`
//! - Tag comparison is done inside `ascon-aead` in constant time
//!
//! ## Last Modified
//! v0.1.0 - Initial Ascon-128 implementation

use std::fmt;

use ascon_aead::aead::{Aead, KeyInit, Payload};
use ascon_aead::{Ascon128, Key, Nonce};

use super::{ASCON_KEY_SIZE, ASCON_NONCE_SIZE, ASCON_TAG_SIZE};
use crate::error::{CoreError, Result};

/// Overhead added by encryption (auth tag).
pub const ENCRYPTION_OVERHEAD: usize = ASCON_TAG_SIZE;

// ============================================
// AeadCipher Trait
// ============================================

/// Trait for keyed authenticated encryption.
///
/// The key is bound at construction; callers supply a fresh nonce per
/// message.
pub trait AeadCipher: Send + Sync {
    /// Encrypts `plaintext`, authenticating `associated_data` alongside it.
    ///
    /// # Returns
    /// `body ‖ tag`, `plaintext.len() + overhead()` bytes.
    ///
    /// # Errors
    /// - `Encryption`: the backend refused the input
    fn encrypt(
        &self,
        nonce: &[u8; ASCON_NONCE_SIZE],
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Decrypts and authenticates `ciphertext`.
    ///
    /// # Errors
    /// - `AuthFailure`: tampered data, wrong key, wrong nonce, wrong
    ///   associated data or truncated input
    fn decrypt(
        &self,
        nonce: &[u8; ASCON_NONCE_SIZE],
        associated_data: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Returns the encryption overhead in bytes.
    fn overhead(&self) -> usize;
}

// ============================================
// AsconCipher
// ============================================

/// Ascon-128 implementation of [`AeadCipher`].
pub struct AsconCipher {
    cipher: Ascon128,
}

impl AsconCipher {
    /// Creates a cipher bound to a 16-byte key.
    #[must_use]
    pub fn new(key: &[u8; ASCON_KEY_SIZE]) -> Self {
        Self {
            cipher: Ascon128::new(Key::<Ascon128>::from_slice(key)),
        }
    }

    /// Creates a cipher from a key slice.
    ///
    /// # Errors
    /// `Encryption` if the slice is not exactly 16 bytes.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        let cipher = Ascon128::new_from_slice(key).map_err(|_| CoreError::Encryption {
            context: format!("Invalid Ascon-128 key length: {}", key.len()),
        })?;
        Ok(Self { cipher })
    }
}

impl fmt::Debug for AsconCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsconCipher([REDACTED])")
    }
}

impl AeadCipher for AsconCipher {
    fn encrypt(
        &self,
        nonce: &[u8; ASCON_NONCE_SIZE],
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.cipher
            .encrypt(
                Nonce::<Ascon128>::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|_| CoreError::Encryption {
                context: "Ascon-128 encryption failed".into(),
            })
    }

    fn decrypt(
        &self,
        nonce: &[u8; ASCON_NONCE_SIZE],
        associated_data: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext.len() < ASCON_TAG_SIZE {
            return Err(CoreError::AuthFailure);
        }

        self.cipher
            .decrypt(
                Nonce::<Ascon128>::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: associated_data,
                },
            )
            .map_err(|_| CoreError::AuthFailure)
    }

    fn overhead(&self) -> usize {
        ENCRYPTION_OVERHEAD
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Encrypts a message with a one-off Ascon-128 cipher.
///
/// # Errors
/// `Encryption` if encryption fails.
pub fn encrypt(
    key: &[u8; ASCON_KEY_SIZE],
    nonce: &[u8; ASCON_NONCE_SIZE],
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    AsconCipher::new(key).encrypt(nonce, associated_data, plaintext)
}

/// Decrypts a message with a one-off Ascon-128 cipher.
///
/// # Errors
/// `AuthFailure` if authentication fails.
pub fn decrypt(
    key: &[u8; ASCON_KEY_SIZE],
    nonce: &[u8; ASCON_NONCE_SIZE],
    associated_data: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    AsconCipher::new(key).decrypt(nonce, associated_data, ciphertext)
}

// ============================================
// Tests
// ============================================
