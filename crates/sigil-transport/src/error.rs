// ============================================
// File: crates/sigil-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for byte-stream channel operations.
//!
//! ## Error Categories
//! 1. **Network Errors**: bind/connect failures, socket I/O
//! 2. **Framing Errors**: frames over the configured limit
//! 3. **Lifecycle Errors**: peer closed the channel
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Closed` is the normal end of a conversation, not necessarily a fault
//! - A clean EOF between frames maps to `Closed`; EOF inside a frame is `Io`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Failed to connect to a peer.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Peer address
        addr: String,
        /// Why connecting failed
        reason: String,
    },

    /// Address string could not be parsed.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    // ========================================
    // Framing Errors
    // ========================================

    /// Frame exceeds the configured maximum.
    #[error("Frame of {size} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Size of the offending frame
        size: usize,
        /// Configured limit
        max: usize,
    },

    // ========================================
    // Lifecycle Errors
    // ========================================

    /// The channel was closed by either side.
    #[error("Channel closed")]
    Closed,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the channel can no longer be used.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

// ============================================
// Tests
// ============================================
