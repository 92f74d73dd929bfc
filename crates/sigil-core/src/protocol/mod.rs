// ============================================
// File: crates/sigil-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wire format of the handshake and the shape of data messages.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: Protocol message structures
//! - [`codec`]: Binary serialization/deserialization
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │                                                             │
//! │  Initiator ──── HandshakeMessage (170 bytes) ────► Responder│
//! │  Initiator ◄─── HandshakeMessage (170 bytes) ──── Responder │
//! │                                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Transport Phase                          │
//! │                                                             │
//! │  Initiator ═══ body ‖ tag (Ascon-128) ═══════════ Responder │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format Principles
//! - Fixed-size handshake fields, no length prefixes inside a message
//! - Nonces are never transmitted; both sides derive them from counters
//! - Big-endian for the counter fed into nonce derivation
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;

pub use codec::{decode_handshake, encode_handshake, Codec, HandshakeCodec};
pub use messages::{HandshakeMessage, PeerIdentity, HANDSHAKE_MESSAGE_SIZE};
