// ============================================
// File: crates/sigil-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Main Functionality
//! - `derive`: HKDF-SHA256 extract-and-expand, arbitrary length
//! - `derive_session_key`: 32-byte session key from the X448 secret
//!
//! ## Derivation
//! ```text
//! session_key = HKDF-SHA256(
//!     ikm:  X448 shared secret (56 bytes),
//!     salt: none,
//!     info: "handshake data",
//!     L:    32
//! )
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::exchange::SharedSecret;
use super::keys::SessionKey;
use super::SESSION_KEY_SIZE;
use crate::error::{CoreError, Result};

/// Largest output HKDF-SHA256 can produce (255 * 32).
pub const MAX_OUTPUT_LEN: usize = 255 * 32;

/// Runs HKDF-SHA256 over `ikm`.
///
/// An absent or empty salt means the RFC 5869 default (a block of zeros).
///
/// # Errors
/// `KeyDerivation` if `output_len` is zero or exceeds [`MAX_OUTPUT_LEN`].
pub fn derive(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if output_len == 0 {
        return Err(CoreError::key_derivation("requested zero output bytes"));
    }

    let salt = salt.filter(|s| !s.is_empty());
    let hk = Hkdf::<Sha256>::new(salt, ikm);

    let mut output = Zeroizing::new(vec![0u8; output_len]);
    hk.expand(info, &mut output).map_err(|_| {
        CoreError::key_derivation(format!("HKDF expansion failed for {output_len} bytes"))
    })?;

    Ok(output)
}

/// Derives the session key from a completed exchange.
///
/// # Errors
/// `KeyDerivation` if HKDF fails.
pub fn derive_session_key(shared: &SharedSecret, info: &[u8]) -> Result<SessionKey> {
    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());

    let mut key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
    hk.expand(info, &mut key[..])
        .map_err(|_| CoreError::key_derivation("HKDF expansion failed"))?;

    Ok(SessionKey::from_bytes(*key))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{ExchangeKeyPair, HANDSHAKE_INFO};

    #[test]
    fn test_rfc5869_case_3() {
        // RFC 5869 test case 3: empty salt and info.
        let ikm = [0x0bu8; 22];
        let okm = derive(&ikm, None, b"", 42).unwrap();
        assert_eq!(
            hex::encode(okm.as_slice()),
            "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d\
             9d201395faa4b61a96c8"
        );
    }

    #[test]
    fn test_empty_salt_equals_no_salt() {
        let a = derive(b"ikm", None, b"info", 32).unwrap();
        let b = derive(b"ikm", Some(b""), b"info", 32).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_length_bounds() {
        assert!(derive(b"ikm", None, b"", 0).is_err());
        assert!(derive(b"ikm", None, b"", MAX_OUTPUT_LEN).is_ok());
        assert!(derive(b"ikm", None, b"", MAX_OUTPUT_LEN + 1).is_err());
    }

    #[test]
    fn test_session_key_agreement() {
        let alice = ExchangeKeyPair::generate().unwrap();
        let bob = ExchangeKeyPair::generate().unwrap();
        let alice_pub = alice.public_key();
        let bob_pub = bob.public_key();

        let alice_shared = alice.exchange(&bob_pub).unwrap();
        let bob_shared = bob.exchange(&alice_pub).unwrap();

        let k1 = derive_session_key(&alice_shared, HANDSHAKE_INFO).unwrap();
        let k2 = derive_session_key(&bob_shared, HANDSHAKE_INFO).unwrap();
        assert_eq!(k1, k2);

        let expected = derive(alice_shared.as_bytes(), None, HANDSHAKE_INFO, 32).unwrap();
        assert_eq!(k1.cipher_key().as_slice(), &expected[..16]);
        assert_eq!(k1.nonce_seed(), &expected[16..]);
    }

    #[test]
    fn test_info_separates_keys() {
        let alice = ExchangeKeyPair::generate().unwrap();
        let bob = ExchangeKeyPair::generate().unwrap();
        let shared = alice.exchange(&bob.public_key()).unwrap();

        let k1 = derive_session_key(&shared, b"handshake data").unwrap();
        let k2 = derive_session_key(&shared, b"other context").unwrap();
        assert_ne!(k1, k2);
    }
}
