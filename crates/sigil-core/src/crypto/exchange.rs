// ============================================
// File: crates/sigil-core/src/crypto/exchange.rs
// ============================================
//! # X448 Key Exchange
//!
//! ## Creation Reason
//! Ephemeral Diffie-Hellman for the handshake. Each handshake generates a
//! fresh key pair; the private scalar is consumed by the exchange.
//!
//! ## Main Functionality
//! - `ExchangeKeyPair`: single-use X448 key pair
//! - `ExchangePublicKey`: validated peer public value
//! - `SharedSecret`: DH output, only readable by the KDF
//!
//! ## ⚠️ Important Note for Next Developer
//! - Peer public keys MUST go through `ExchangePublicKey::from_bytes`; it
//!   rejects low-order points
//! - `SharedSecret` is deliberately not `Clone` and has no byte accessor
//!   outside this crate
//!
//! ## Last Modified
//! v0.1.0 - Initial X448 implementation

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::{X448_PUBLIC_KEY_SIZE, X448_SECRET_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// ExchangePublicKey
// ============================================

/// X448 public value that passed the low-order check.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExchangePublicKey([u8; X448_PUBLIC_KEY_SIZE]);

impl ExchangePublicKey {
    /// Validates raw bytes as an X448 public key.
    ///
    /// # Errors
    /// `InvalidPeerKey` if the length is wrong or the point is of low order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; X448_PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| CoreError::InvalidPeerKey)?;
        x448::PublicKey::from_bytes(&arr).ok_or(CoreError::InvalidPeerKey)?;
        Ok(Self(arr))
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; X448_PUBLIC_KEY_SIZE] {
        &self.0
    }

    fn to_point(self) -> Result<x448::PublicKey> {
        x448::PublicKey::from_bytes(&self.0).ok_or(CoreError::InvalidPeerKey)
    }
}

impl fmt::Debug for ExchangePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExchangePublicKey({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

// ============================================
// SharedSecret
// ============================================

/// Raw X448 Diffie-Hellman output. Zeroized on drop.
pub struct SharedSecret(Zeroizing<[u8; X448_SECRET_SIZE]>);

impl SharedSecret {
    pub(crate) fn as_bytes(&self) -> &[u8; X448_SECRET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

// ============================================
// ExchangeKeyPair
// ============================================

/// Ephemeral X448 key pair.
///
/// # Example
/// ```
/// use sigil_core::crypto::ExchangeKeyPair;
///
/// let alice = ExchangeKeyPair::generate().unwrap();
/// let bob = ExchangeKeyPair::generate().unwrap();
///
/// let alice_public = alice.public_key();
/// let bob_public = bob.public_key();
///
/// // Both sides now hold the same secret, ready for the KDF.
/// let _a = alice.exchange(&bob_public).unwrap();
/// let _b = bob.exchange(&alice_public).unwrap();
/// ```
pub struct ExchangeKeyPair {
    secret: x448::Secret,
    public: ExchangePublicKey,
}

impl ExchangeKeyPair {
    /// Generates a fresh key pair from the OS random number generator.
    ///
    /// # Errors
    /// `KeyGeneration` if the scalar cannot be built.
    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; X448_SECRET_SIZE]);
        OsRng.fill_bytes(&mut bytes[..]);

        let secret = x448::Secret::from_bytes(&bytes[..])
            .ok_or_else(|| CoreError::key_generation("X448 secret"))?;
        let public = x448::PublicKey::from(&secret);

        Ok(Self {
            secret,
            public: ExchangePublicKey(*public.as_bytes()),
        })
    }

    /// Returns the public half.
    #[must_use]
    pub const fn public_key(&self) -> ExchangePublicKey {
        self.public
    }

    /// Computes the shared secret with `peer`, consuming the private key.
    ///
    /// # Errors
    /// `InvalidPeerKey` if the peer point is of low order or the shared
    /// secret is all zeros.
    pub fn exchange(self, peer: &ExchangePublicKey) -> Result<SharedSecret> {
        let point = peer.to_point()?;
        let shared = self
            .secret
            .as_diffie_hellman(&point)
            .ok_or(CoreError::InvalidPeerKey)?;

        let bytes = Zeroizing::new(*shared.as_bytes());
        if bytes.iter().all(|b| *b == 0) {
            return Err(CoreError::InvalidPeerKey);
        }
        Ok(SharedSecret(bytes))
    }
}

impl fmt::Debug for ExchangeKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_exchange_agrees() {
        let alice = ExchangeKeyPair::generate().unwrap();
        let bob = ExchangeKeyPair::generate().unwrap();

        let alice_pub = alice.public_key();
        let bob_pub = bob.public_key();

        let alice_shared = alice.exchange(&bob_pub).unwrap();
        let bob_shared = bob.exchange(&alice_pub).unwrap();

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_fresh_keys_differ() {
        let a = ExchangeKeyPair::generate().unwrap();
        let b = ExchangeKeyPair::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_low_order_points_rejected() {
        // u = 0 and u = 1 are the small-order points on Curve448.
        let zero = [0u8; X448_PUBLIC_KEY_SIZE];
        let mut one = [0u8; X448_PUBLIC_KEY_SIZE];
        one[0] = 1;

        assert!(matches!(
            ExchangePublicKey::from_bytes(&zero),
            Err(CoreError::InvalidPeerKey)
        ));
        assert!(matches!(
            ExchangePublicKey::from_bytes(&one),
            Err(CoreError::InvalidPeerKey)
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(ExchangePublicKey::from_bytes(&[9u8; 32]).is_err());
    }

    #[test]
    fn test_public_key_roundtrip() {
        let kp = ExchangeKeyPair::generate().unwrap();
        let public = kp.public_key();
        let parsed = ExchangePublicKey::from_bytes(public.as_bytes()).unwrap();
        assert_eq!(public, parsed);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = ExchangeKeyPair::generate().unwrap();
        let bob = ExchangeKeyPair::generate().unwrap();
        let shared = kp.exchange(&bob.public_key()).unwrap();
        assert_eq!(format!("{shared:?}"), "SharedSecret([REDACTED])");
    }
}
