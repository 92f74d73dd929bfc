// ============================================
// File: crates/sigil-core/src/lib.rs
// ============================================
//! # Sigil Core - Handshake, Session & Cryptography Library
//!
//! ## Creation Reason
//! Holds everything security-relevant: the primitives, the handshake state
//! machine and the nonce-counter session. It never performs IO, so every
//! rule here can be tested without a socket.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Ascon-Hash / Ascon-XOF, Ascon-128 AEAD
//! - X448 key exchange, Ed448 signatures
//! - HKDF-SHA256 session-key derivation
//!
//! ### Protocol Module ([`protocol`])
//! - `HandshakeMessage` and its 170-byte codec
//!
//! ### Handshake ([`handshake`]) and Session ([`session`])
//! - `Handshake`: sans-IO state machine producing a `Session`
//! - `Session`: `send` / `receive` with counter-derived nonces
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 sigil-node                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │    sigil-core  ◄──     sigil-transport              │
//! │    You are here               │                     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             sigil-common                            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Guarantees
//! - **Confidentiality / Integrity**: Ascon-128 on every data message
//! - **Authenticity**: Ed448 signature over each exchange key, checked
//!   against a pinned key
//! - **Nonce uniqueness**: per-direction seeds, monotonic counters
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER implement custom crypto primitives
//! - ALL secret keys MUST zeroize on drop
//! - Keep this crate free of sockets and async runtimes
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod session;

// Re-export commonly used items
pub use crypto::{SessionKey, SigningKeyPair, SigningPublicKey};
pub use error::{CoreError, Result};
pub use handshake::{FailureReason, Handshake, HandshakeState};
pub use protocol::{HandshakeMessage, PeerIdentity, HANDSHAKE_MESSAGE_SIZE};
pub use session::{NonceSeed, Session, SessionOptions, SharedSession};
