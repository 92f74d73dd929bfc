// ============================================
// File: crates/sigil-node/src/error.rs
// ============================================
//! # Node Error Types
//!
//! ## Creation Reason
//! Top-level error for the node library, wrapping the core and transport
//! errors so services can use `?` across layers.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `should_close_channel` decides whether a connection task gives up.
//!   Every session, crypto, protocol and framing fault closes; errors a
//!   `MessageHandler` raises for its own I/O do not
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions
//! v0.1.1 - should_close_channel drives the connection loop

use thiserror::Error;

use sigil_core::error::CoreError;
use sigil_transport::error::TransportError;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

/// Node error types.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Config file path
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// A configuration value is out of range or malformed.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field path, e.g. `peer.signing_key`
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A configuration value needed by this command is absent.
    #[error("Missing required configuration: {field}")]
    ConfigMissing {
        /// Dotted field path
        field: String,
    },

    /// Identity file could not be read, parsed or written.
    #[error("Identity file '{path}': {reason}")]
    Identity {
        /// Identity file path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Handshake did not finish in time.
    #[error("Handshake timed out after {secs}s")]
    HandshakeTimeout {
        /// Configured timeout
        secs: u64,
    },

    /// Server could not start.
    #[error("Node failed to start: {reason}")]
    StartupFailed {
        /// Why startup failed
        reason: String,
    },

    /// Handshake, session or crypto failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Channel failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error outside the transport layer, e.g. from a message handler.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigMissing` error.
    pub fn config_missing(field: impl Into<String>) -> Self {
        Self::ConfigMissing {
            field: field.into(),
        }
    }

    /// Creates an `Identity` error.
    pub fn identity(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Identity {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the connection this error came from must be
    /// dropped.
    #[must_use]
    pub fn should_close_channel(&self) -> bool {
        match self {
            Self::Core(e) => {
                e.is_fatal_for_session() || e.is_crypto_error() || e.is_protocol_error()
            }
            Self::Transport(e) => {
                e.is_closed()
                    || matches!(e, TransportError::FrameTooLarge { .. } | TransportError::Io { .. })
            }
            Self::HandshakeTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the peer's connection ended normally.
    #[must_use]
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_closed())
    }

    /// Returns `true` if the peer sent something that failed verification.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_suspicious())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NodeError::config_load("/etc/sigil/node.toml", "file not found");
        assert!(err.to_string().contains("/etc/sigil/node.toml"));

        let err = NodeError::HandshakeTimeout { secs: 10 };
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_channel_close_classification() {
        // Session and handshake faults
        assert!(NodeError::from(CoreError::AuthFailure).should_close_channel());
        assert!(NodeError::from(CoreError::CounterExhausted).should_close_channel());
        assert!(NodeError::from(CoreError::Aborted).should_close_channel());
        assert!(NodeError::from(CoreError::InvalidSignature).should_close_channel());
        assert!(NodeError::from(CoreError::malformed("bad")).should_close_channel());
        assert!(NodeError::HandshakeTimeout { secs: 5 }.should_close_channel());

        // Channel faults
        assert!(NodeError::from(TransportError::Closed).should_close_channel());
        assert!(NodeError::from(TransportError::FrameTooLarge { size: 9, max: 4 })
            .should_close_channel());

        // A handler's own I/O trouble leaves the connection up
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!NodeError::from(io).should_close_channel());
        assert!(!NodeError::config_missing("peer.signing_key").should_close_channel());
    }

    #[test]
    fn test_peer_closed_and_suspicious() {
        assert!(NodeError::from(TransportError::Closed).is_peer_closed());
        assert!(!NodeError::from(CoreError::AuthFailure).is_peer_closed());

        assert!(NodeError::from(CoreError::InvalidSignature).is_suspicious());
        assert!(NodeError::from(CoreError::InvalidPeerKey).is_suspicious());
        assert!(!NodeError::from(CoreError::Aborted).is_suspicious());
        assert!(!NodeError::from(TransportError::Closed).is_suspicious());
    }
}
