// ============================================
// File: crates/sigil-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types specific to the handshake, the cryptographic
//! primitives and the message protocol.
//!
//! ## Error Categories
//! 1. **Crypto Errors**: invalid peer keys, signature and tag failures,
//!    counter exhaustion, derivation failures
//! 2. **Protocol Errors**: malformed or truncated handshake messages
//! 3. **State Errors**: handshake operations called out of order, aborts
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or plaintext in error messages
//! - `AuthFailure` must stay detail-free: callers must not be able to tell
//!   a wrong key from a corrupted ciphertext
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for handshake, crypto and protocol operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Failed to generate or load a key.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    /// Peer exchange key is malformed or of low order.
    #[error("Invalid peer exchange key")]
    InvalidPeerKey,

    /// Signature verification failed.
    #[error("Signature verification failed")]
    InvalidSignature,

    /// AEAD authentication failed on decrypt.
    #[error("Decryption failed: authentication error")]
    AuthFailure,

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Nonce counter cannot advance; a fresh handshake is required.
    #[error("Nonce counter exhausted, session must be re-established")]
    CounterExhausted,

    /// Key derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    /// Requested hash output length is not supported by the mode.
    #[error("Invalid hash output length {requested} (allowed {min}..={max})")]
    InvalidOutputLength {
        /// Requested length
        requested: usize,
        /// Smallest allowed length
        min: usize,
        /// Largest allowed length
        max: usize,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    // ========================================
    // State Errors
    // ========================================

    /// Operation not valid in current handshake state.
    #[error("Invalid state for operation: {operation} requires {required_state}")]
    InvalidState {
        /// What operation was attempted
        operation: String,
        /// What state was required
        required_state: String,
    },

    /// Transport closed or timed out mid-protocol.
    #[error("Handshake aborted")]
    Aborted,
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    #[must_use]
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates a `KeyDerivation` error.
    pub fn key_derivation(reason: impl Into<String>) -> Self {
        Self::KeyDerivation {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidState` error.
    pub fn invalid_state(
        operation: impl Into<String>,
        required_state: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            required_state: required_state.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::KeyGeneration { .. }
                | Self::InvalidPeerKey
                | Self::InvalidSignature
                | Self::AuthFailure
                | Self::Encryption { .. }
                | Self::CounterExhausted
                | Self::KeyDerivation { .. }
                | Self::InvalidOutputLength { .. }
        )
    }

    /// Returns `true` if this is a protocol (wire format) error.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage { .. } | Self::MessageTooShort { .. }
        )
    }

    /// Returns `true` if the session that produced this error can no longer
    /// be used and a fresh handshake is required.
    #[must_use]
    pub const fn is_fatal_for_session(&self) -> bool {
        matches!(
            self,
            Self::AuthFailure | Self::CounterExhausted | Self::Aborted
        )
    }

    /// Returns `true` if this error might indicate an active attacker.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::InvalidSignature | Self::InvalidPeerKey | Self::AuthFailure
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidSignature;
        assert!(err.to_string().contains("Signature"));

        let err = CoreError::too_short(170, 12);
        assert!(err.to_string().contains("170"));
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_auth_failure_has_no_detail() {
        assert_eq!(
            CoreError::AuthFailure.to_string(),
            "Decryption failed: authentication error"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::InvalidSignature.is_crypto_error());
        assert!(CoreError::InvalidSignature.is_suspicious());
        assert!(!CoreError::InvalidSignature.is_fatal_for_session());

        assert!(CoreError::CounterExhausted.is_fatal_for_session());
        assert!(CoreError::AuthFailure.is_fatal_for_session());

        assert!(CoreError::malformed("bad").is_protocol_error());
        assert!(!CoreError::Aborted.is_crypto_error());
    }
}
