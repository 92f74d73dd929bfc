// ============================================
// File: crates/sigil-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Main Functionality
//! - `SessionId`: Random 16-byte identifier attached to every channel for
//!   log correlation. It is never transmitted and carries no key material.
//! - `Role`: Which side of the handshake a peer plays. The role selects the
//!   per-direction nonce seed so both peers never derive the same nonce
//!   for their own outbound traffic.
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// Size of `SessionId` in bytes.
pub const SESSION_ID_SIZE: usize = 16;

// ============================================
// SessionId
// ============================================

/// Identifier for an established channel.
///
/// # Example
/// ```
/// use sigil_common::types::SessionId;
///
/// let id = SessionId::generate();
/// let restored = SessionId::from_bytes(id.as_bytes()).unwrap();
/// assert_eq!(id, restored);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_SIZE]);

impl SessionId {
    /// Creates a `SessionId` from raw bytes, `None` unless exactly 16 bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let id: [u8; SESSION_ID_SIZE] = bytes.try_into().ok()?;
        Some(Self(id))
    }

    /// Generates a new random `SessionId`.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; SESSION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut id);
        Self(id)
    }

    /// Returns the raw bytes of the session ID.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SESSION_ID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionId({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl FromStr for SessionId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = BASE64.decode(s)?;
        Self::from_bytes(&bytes)
            .ok_or_else(|| CommonError::invalid_length(SESSION_ID_SIZE, bytes.len()))
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&BASE64.encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_bytes(&bytes)
                .ok_or_else(|| serde::de::Error::invalid_length(bytes.len(), &"16 bytes"))
        }
    }
}

// ============================================
// Role
// ============================================

/// Side of the handshake a peer plays.
///
/// The initiator is the peer that opened the connection. Both roles run the
/// same handshake; the role only decides which nonce sequence is used for
/// which traffic direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Peer that opened the connection.
    Initiator,
    /// Peer that accepted the connection.
    Responder,
}

impl Role {
    /// Returns the opposite role.
    #[must_use]
    pub const fn peer(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }

    /// Domain label appended to the nonce seed for traffic sent by this role.
    #[must_use]
    pub const fn label(self) -> &'static [u8] {
        match self {
            Self::Initiator => b"initiator",
            Self::Responder => b"responder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

// ============================================
// Tests
// ============================================
