// ============================================
// File: crates/sigil-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes every cryptographic primitive the Sigil protocol uses, each
//! backed by an existing implementation crate.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`hash`]: Ascon-Hash / Ascon-XOF, nonce derivation
//! - [`aead`]: Ascon-128 authenticated encryption
//! - [`exchange`]: X448 ephemeral key agreement
//! - [`signature`]: Ed448 long-term signing keys
//! - [`kdf`]: HKDF-SHA256 session-key derivation
//! - [`keys`]: `SessionKey`
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  Peer A                                          Peer B     │
//! │    │                                                │       │
//! │    │  X448 public (56) ‖ Ed448 sig(X448 public)(114) ──►    │
//! │    │  ◄── X448 public (56) ‖ Ed448 sig(X448 public)(114)    │
//! │    │                                                │       │
//! │    │  verify with pinned Ed448 key of the peer      │       │
//! │    │  X448(own private, peer public)                │       │
//! │    │  HKDF-SHA256(salt = none, info = "handshake data")     │
//! │    │              │                                 │       │
//! │    │              ▼                                 │       │
//! │    │        32-byte SessionKey                      │       │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport Phase                          │
//! │                                                             │
//! │  nonce = Ascon-XOF(seed ‖ counter_be, 16)                   │
//! │  SessionKey[0..16] + nonce ──► Ascon-128 ──► body ‖ tag     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER roll your own primitives; wrap the crates used here
//! - ALL secret keys zeroize on drop
//! - A (key, nonce) pair must never be used twice; see `session`
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod aead;
pub mod exchange;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod signature;

pub use aead::{AeadCipher, AsconCipher};
pub use exchange::{ExchangeKeyPair, ExchangePublicKey, SharedSecret};
pub use hash::{derive_nonce, hash, HashMode};
pub use keys::SessionKey;
pub use signature::{SigningKeyPair, SigningPublicKey};

// ============================================
// Constants
// ============================================

/// Size of an X448 public key in bytes.
pub const X448_PUBLIC_KEY_SIZE: usize = 56;

/// Size of an X448 private scalar / shared secret in bytes.
pub const X448_SECRET_SIZE: usize = 56;

/// Size of an Ed448 public key in bytes.
pub const ED448_PUBLIC_KEY_SIZE: usize = 57;

/// Size of an Ed448 private seed in bytes.
pub const ED448_SECRET_KEY_SIZE: usize = 57;

/// Size of an Ed448 signature in bytes.
pub const ED448_SIGNATURE_SIZE: usize = 114;

/// Size of the Ascon-128 key in bytes.
pub const ASCON_KEY_SIZE: usize = 16;

/// Size of the Ascon-128 nonce in bytes.
pub const ASCON_NONCE_SIZE: usize = 16;

/// Size of the Ascon-128 authentication tag in bytes.
pub const ASCON_TAG_SIZE: usize = 16;

/// Size of the Ascon-Hash digest in bytes.
pub const ASCON_HASH_SIZE: usize = 32;

/// Size of the derived session key in bytes.
pub const SESSION_KEY_SIZE: usize = 32;

/// HKDF info string shared by both peers.
pub const HANDSHAKE_INFO: &[u8] = b"handshake data";
