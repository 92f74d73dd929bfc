// ============================================
// File: crates/sigil-core/src/crypto/signature.rs
// ============================================
//! # Ed448 Signatures
//!
//! ## Creation Reason
//! Long-term identity keys. A peer signs its ephemeral exchange public key
//! so the other side can tie the handshake to a pinned identity.
//!
//! ## Main Functionality
//! - `SigningKeyPair`: Ed448 private seed + derived public key
//! - `SigningPublicKey`: validated public key, hex/base64 encodings
//! - `verify`: total function over untrusted byte slices
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  SigningKeyPair (Long-term)                                │
//! │  ├─ Generated once by `sigil-node keygen`                  │
//! │  ├─ Seed stored in the identity file (0600)                │
//! │  └─ Signs the exchange public key of every handshake       │
//! │                                                            │
//! │  SigningPublicKey                                          │
//! │  └─ Pinned (hex) in the peer's configuration               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Signing keys are never used for key exchange
//! - The seed zeroizes on drop and never reaches logs
//! - Signatures use the pure Ed448 mode with an empty context
//!
//! ## Last Modified
//! v0.1.0 - Initial Ed448 implementation
//! v0.1.1 - Fixed: public keys are decoded as curve points (ed448-goldilocks-plus)

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed448_goldilocks_plus::{SecretKey, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{ED448_PUBLIC_KEY_SIZE, ED448_SECRET_KEY_SIZE, ED448_SIGNATURE_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// SigningKeyPair
// ============================================

/// Long-term Ed448 signing key pair.
///
/// # Example
/// ```
/// use sigil_core::crypto::SigningKeyPair;
///
/// let identity = SigningKeyPair::generate();
/// let signature = identity.sign(b"exchange key");
/// assert!(identity.public_key().verify(b"exchange key", &signature).is_ok());
/// ```
pub struct SigningKeyPair {
    seed: Zeroizing<[u8; ED448_SECRET_KEY_SIZE]>,
    signing: SigningKey,
    public: SigningPublicKey,
}

impl SigningKeyPair {
    /// Generates a new random identity from the OS random number generator.
    #[must_use]
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; ED448_SECRET_KEY_SIZE]);
        OsRng.fill_bytes(&mut seed[..]);
        Self::from_seed_array(seed)
    }

    /// Restores an identity from its 57-byte private seed.
    ///
    /// # Errors
    /// `KeyGeneration` if the seed has the wrong length.
    pub fn from_seed(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ED448_SECRET_KEY_SIZE {
            return Err(CoreError::key_generation(format!(
                "Invalid Ed448 seed size: expected {}, got {}",
                ED448_SECRET_KEY_SIZE,
                bytes.len()
            )));
        }
        let mut seed = Zeroizing::new([0u8; ED448_SECRET_KEY_SIZE]);
        seed.copy_from_slice(bytes);
        Ok(Self::from_seed_array(seed))
    }

    fn from_seed_array(seed: Zeroizing<[u8; ED448_SECRET_KEY_SIZE]>) -> Self {
        let signing = SigningKey::from(&SecretKey::clone_from_slice(&seed[..]));
        let public = SigningPublicKey(signing.verifying_key().to_bytes());
        Self {
            seed,
            signing,
            public,
        }
    }

    /// Returns the public key.
    #[must_use]
    pub const fn public_key(&self) -> SigningPublicKey {
        self.public
    }

    /// Signs `message` (pure Ed448, empty context).
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; ED448_SIGNATURE_SIZE] {
        self.signing.sign_raw(message).to_bytes()
    }

    /// Exports the private seed for the identity file.
    ///
    /// # Security Warning
    /// The returned buffer zeroizes on drop; do not copy it elsewhere.
    #[must_use]
    pub fn seed_bytes(&self) -> Zeroizing<[u8; ED448_SECRET_KEY_SIZE]> {
        self.seed.clone()
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("SigningKeyPair")
            .field("public_key", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================
// SigningPublicKey
// ============================================

/// Public half of an Ed448 identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigningPublicKey([u8; ED448_PUBLIC_KEY_SIZE]);

impl SigningPublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// `KeyGeneration` if the bytes are not a valid Ed448 point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; ED448_PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::key_generation(format!(
                "Invalid Ed448 public key size: expected {}, got {}",
                ED448_PUBLIC_KEY_SIZE,
                bytes.len()
            ))
        })?;
        // Must decode to a curve point
        VerifyingKey::from_bytes(&arr)
            .map_err(|_| CoreError::key_generation("Invalid Ed448 public key"))?;
        Ok(Self(arr))
    }

    /// Parses a hex-encoded public key (the pinned-key format).
    ///
    /// # Errors
    /// `KeyGeneration` on bad hex or an invalid key.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| CoreError::key_generation(format!("Invalid hex public key: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Parses a base64-encoded public key.
    ///
    /// # Errors
    /// `KeyGeneration` on bad base64 or an invalid key.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CoreError::key_generation(format!("Invalid base64 public key: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ED448_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Returns the hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the base64 encoding.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Verifies `signature` over `message`.
    ///
    /// # Errors
    /// `InvalidSignature` if verification fails.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() != ED448_SIGNATURE_SIZE {
            return Err(CoreError::InvalidSignature);
        }
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidSignature)?;
        let signature = Signature::try_from(signature).map_err(|_| CoreError::InvalidSignature)?;
        key.verify_raw(&signature, message)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SigningPublicKey({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for SigningPublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for SigningPublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for SigningPublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

// ============================================
// Free Functions
// ============================================

/// Verifies a signature from untrusted inputs. Never panics.
#[must_use]
pub fn verify(public: &[u8], signature: &[u8], message: &[u8]) -> bool {
    SigningPublicKey::from_bytes(public)
        .and_then(|key| key.verify(message, signature))
        .is_ok()
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_produces_distinct_keys() {
        let a = SigningKeyPair::generate();
        let b = SigningKeyPair::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_sign_verify() {
        let kp = SigningKeyPair::generate();
        let signature = kp.sign(b"message");

        assert_eq!(signature.len(), ED448_SIGNATURE_SIZE);
        assert!(kp.public_key().verify(b"message", &signature).is_ok());
        assert!(matches!(
            kp.public_key().verify(b"other", &signature),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_with_key_restored_from_bytes() {
        let kp = SigningKeyPair::generate();
        let signature = kp.sign(b"exchange key");

        // Pinned keys, identity files and handshake messages all arrive as bytes
        let restored = SigningPublicKey::from_bytes(kp.public_key().as_bytes()).unwrap();
        assert_eq!(restored.as_bytes(), kp.public_key().as_bytes());
        assert!(restored.verify(b"exchange key", &signature).is_ok());

        let from_hex = SigningPublicKey::from_hex(&kp.public_key().to_hex()).unwrap();
        assert!(from_hex.verify(b"exchange key", &signature).is_ok());
        assert!(verify(kp.public_key().as_bytes(), &signature, b"exchange key"));
    }

    #[test]
    fn test_from_bytes_rejects_non_points() {
        assert!(SigningPublicKey::from_bytes(&[0xff; ED448_PUBLIC_KEY_SIZE]).is_err());
        assert!(SigningPublicKey::from_bytes(&[0u8; 56]).is_err());
    }

    #[test]
    fn test_flipped_signature_rejected() {
        let kp = SigningKeyPair::generate();
        let mut signature = kp.sign(b"message");
        signature[10] ^= 0x01;
        assert!(kp.public_key().verify(b"message", &signature).is_err());
    }

    #[test]
    fn test_seed_roundtrip() {
        let kp = SigningKeyPair::generate();
        let restored = SigningKeyPair::from_seed(&kp.seed_bytes()[..]).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_from_seed_rejects_bad_length() {
        assert!(SigningKeyPair::from_seed(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_free_verify_is_total() {
        let kp = SigningKeyPair::generate();
        let signature = kp.sign(b"m");
        let public = kp.public_key();

        assert!(verify(public.as_bytes(), &signature, b"m"));
        assert!(!verify(&[], &signature, b"m"));
        assert!(!verify(public.as_bytes(), &[], b"m"));
        assert!(!verify(public.as_bytes(), &signature[..100], b"m"));
        assert!(!verify(&[0xff; 57], &signature, b"m"));
    }

    #[test]
    fn test_hex_and_base64_encodings() {
        let public = SigningKeyPair::generate().public_key();

        assert_eq!(SigningPublicKey::from_hex(&public.to_hex()).unwrap(), public);
        assert_eq!(
            SigningPublicKey::from_base64(&public.to_base64()).unwrap(),
            public
        );
        assert_eq!(public.to_string().parse::<SigningPublicKey>().unwrap(), public);
        assert!(SigningPublicKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_public_key_serialization() {
        let public = SigningKeyPair::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, format!("\"{}\"", public.to_hex()));

        let restored: SigningPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public, restored);
    }

    #[test]
    fn test_debug_hides_seed() {
        let kp = SigningKeyPair::generate();
        let debug = format!("{kp:?}");
        assert!(debug.contains("SigningKeyPair"));
        assert!(!debug.contains("seed"));
    }
}
