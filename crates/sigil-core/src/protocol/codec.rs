// ============================================
// File: crates/sigil-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Binary encoding of handshake messages so the handshake driver never
//! hands raw, unchecked bytes to the state machine.
//!
//! ## Main Functionality
//! - `Codec` trait: generic encode/decode interface
//! - `HandshakeCodec`: fixed 170-byte handshake message format
//! - `encode_handshake` / `decode_handshake`: slice helpers
//!
//! ## Parsing Strategy
//! 1. Check exact message length
//! 2. Split into fixed-size fields
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always validate buffer lengths before reading
//! - Trailing bytes are an error, not ignored
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::crypto::{ED448_SIGNATURE_SIZE, X448_PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::messages::{HandshakeMessage, HANDSHAKE_MESSAGE_SIZE};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol messages.
pub trait Codec<T> {
    /// Encodes a message into a byte buffer.
    fn encode(&self, msg: &T, buf: &mut BytesMut);

    /// Decodes a message, consuming the whole buffer.
    ///
    /// # Errors
    /// Fails if the buffer does not hold exactly one valid message.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// HandshakeCodec
// ============================================

/// Codec for [`HandshakeMessage`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HandshakeCodec;

impl HandshakeCodec {
    /// Creates a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec<HandshakeMessage> for HandshakeCodec {
    fn encode(&self, msg: &HandshakeMessage, buf: &mut BytesMut) {
        buf.reserve(HANDSHAKE_MESSAGE_SIZE);
        buf.put_slice(&msg.exchange_public);
        buf.put_slice(&msg.signature);
    }

    fn decode(&self, buf: &mut Bytes) -> Result<HandshakeMessage> {
        if buf.len() < HANDSHAKE_MESSAGE_SIZE {
            return Err(CoreError::too_short(HANDSHAKE_MESSAGE_SIZE, buf.len()));
        }
        if buf.len() > HANDSHAKE_MESSAGE_SIZE {
            return Err(CoreError::malformed(format!(
                "handshake message has {} trailing bytes",
                buf.len() - HANDSHAKE_MESSAGE_SIZE
            )));
        }

        let mut exchange_public = [0u8; X448_PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut exchange_public);

        let mut signature = [0u8; ED448_SIGNATURE_SIZE];
        buf.copy_to_slice(&mut signature);

        Ok(HandshakeMessage::new(exchange_public, signature))
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Encodes a handshake message to bytes.
#[must_use]
pub fn encode_handshake(msg: &HandshakeMessage) -> Bytes {
    let mut buf = BytesMut::with_capacity(HANDSHAKE_MESSAGE_SIZE);
    HandshakeCodec.encode(msg, &mut buf);
    buf.freeze()
}

/// Decodes a handshake message from bytes.
///
/// # Errors
/// `MessageTooShort` or `MalformedMessage` unless exactly 170 bytes.
pub fn decode_handshake(buf: &[u8]) -> Result<HandshakeMessage> {
    let mut bytes = Bytes::copy_from_slice(buf);
    HandshakeCodec.decode(&mut bytes)
}

// ============================================
// Tests
// ============================================
