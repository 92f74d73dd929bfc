// ============================================
// File: crates/sigil-common/src/lib.rs
// ============================================
//! # Sigil Common - Shared Types Library
//!
//! ## Creation Reason
//! Provides the small set of types shared by the Sigil crates,
//! so the core and node crates agree on session identifiers and roles.
//!
//! ## Main Functionality
//! - [`types`]: `SessionId` (log/correlation identifier) and `Role`
//! - [`error`]: `CommonError`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 sigil-node                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │    sigil-core          sigil-transport              │
//! │         │                                           │
//! │         ▼                                           │
//! │    sigil-common  ◄── You are here                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Leaf crate: no internal dependencies
//! - Keep it small; protocol logic belongs in `sigil-core`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::CommonError;
pub use types::{Role, SessionId};
