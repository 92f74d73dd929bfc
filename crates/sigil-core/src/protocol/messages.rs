// ============================================
// File: crates/sigil-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Main Functionality
//! - `HandshakeMessage`: signed ephemeral exchange key, the only message
//!   exchanged before the session exists
//! - `PeerIdentity`: what a peer knows about the other side once its
//!   handshake message has been accepted
//!
//! ## Message Sizes
//! | Message | Size (bytes) |
//! |---------|--------------|
//! | HandshakeMessage | 170 |
//! | Data message | plaintext + 16 |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Field order is fixed: exchange key first, signature second
//! - There are no type bytes or length prefixes; framing belongs to
//!   `sigil-transport`
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::fmt;

use crate::crypto::{
    ExchangePublicKey, SigningPublicKey, ED448_SIGNATURE_SIZE, X448_PUBLIC_KEY_SIZE,
};

/// Size of a handshake message in bytes.
pub const HANDSHAKE_MESSAGE_SIZE: usize = X448_PUBLIC_KEY_SIZE + ED448_SIGNATURE_SIZE;

// ============================================
// HandshakeMessage
// ============================================

/// Handshake message sent by each peer.
///
/// # Wire Format (170 bytes)
/// ```text
/// ┌────────────────────────────────────────────┐
/// │ X448 exchange public key      (56 bytes)   │
/// ├────────────────────────────────────────────┤
/// │ Ed448 signature over the key  (114 bytes)  │
/// └────────────────────────────────────────────┘
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    /// Sender's ephemeral X448 public key.
    pub exchange_public: [u8; X448_PUBLIC_KEY_SIZE],
    /// Ed448 signature of `exchange_public` by the sender's identity.
    pub signature: [u8; ED448_SIGNATURE_SIZE],
}

impl HandshakeMessage {
    /// Creates a handshake message.
    #[must_use]
    pub const fn new(
        exchange_public: [u8; X448_PUBLIC_KEY_SIZE],
        signature: [u8; ED448_SIGNATURE_SIZE],
    ) -> Self {
        Self {
            exchange_public,
            signature,
        }
    }

    /// Returns the bytes covered by the signature.
    #[must_use]
    pub fn signed_content(&self) -> &[u8] {
        &self.exchange_public
    }
}

impl fmt::Debug for HandshakeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeMessage")
            .field("exchange_public", &hex::encode(&self.exchange_public[..4]))
            .field("signature", &hex::encode(&self.signature[..4]))
            .finish_non_exhaustive()
    }
}

// ============================================
// PeerIdentity
// ============================================

/// The remote peer as seen after a verified handshake message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerIdentity {
    /// Ephemeral exchange key from the peer's handshake message.
    pub exchange_public: ExchangePublicKey,
    /// Long-term signing key, pinned out of band.
    pub signing_public: SigningPublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_message_size() {
        assert_eq!(HANDSHAKE_MESSAGE_SIZE, 170);
    }

    #[test]
    fn test_signed_content_is_exchange_key() {
        let msg = HandshakeMessage::new([7u8; 56], [9u8; 114]);
        assert_eq!(msg.signed_content(), &[7u8; 56][..]);
    }

    #[test]
    fn test_debug_truncates() {
        let msg = HandshakeMessage::new([0xab; 56], [0xcd; 114]);
        let debug = format!("{msg:?}");
        assert!(debug.contains("abababab"));
        assert!(!debug.contains(&"ab".repeat(10)));
    }
}
