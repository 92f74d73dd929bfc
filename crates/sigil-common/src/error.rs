// ============================================
// File: crates/sigil-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Errors raised by the shared types in this crate, currently parsing a
//! `SessionId` from its base64 form.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include key material or plaintext in error messages
//! - Keep variants generic; protocol failures live in `sigil-core`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// CommonError
// ============================================

/// Common error types shared across Sigil crates.
///
/// # Example
/// ```
/// use sigil_common::error::CommonError;
/// use sigil_common::types::SessionId;
///
/// let err = "AAAA".parse::<SessionId>().unwrap_err();
/// assert!(matches!(err, CommonError::InvalidLength { expected: 16, actual: 3 }));
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Failed to decode textual data.
    #[error("Decoding error: {context}: {details}")]
    Decoding {
        /// What was being decoded
        context: String,
        /// Error details
        details: String,
    },
}

impl CommonError {
    /// Creates an `InvalidLength` error.
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Creates a `Decoding` error.
    pub fn decoding(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decoding {
            context: context.into(),
            details: details.into(),
        }
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<base64::DecodeError> for CommonError {
    fn from(err: base64::DecodeError) -> Self {
        Self::decoding("base64 decode", err.to_string())
    }
}

// ============================================
// Tests
// ============================================
