// ============================================
// File: crates/sigil-transport/src/lib.rs
// ============================================
//! # Sigil Transport - Framed Channel Layer
//!
//! ## Creation Reason
//! Moves opaque frames (handshake messages, AEAD ciphertexts) between two
//! peers. Knows nothing about cryptography; the node wires a `Channel` to
//! a core `Session`.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `Channel` trait definition
//! - [`tcp`]: length-prefixed TCP channel and listener
//! - [`memory`]: in-process channel pair for tests
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 sigil-node                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │    sigil-core          sigil-transport              │
//! │                        You are here ◄──             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always code against `Channel` so tests can use `MemoryChannel`
//! - Frame size limits are enforced on both send and receive
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod memory;
pub mod tcp;
pub mod traits;

// Re-export commonly used items
pub use error::{Result, TransportError};
pub use memory::MemoryChannel;
pub use tcp::{ChannelListener, TcpChannel, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE};
pub use traits::Channel;
