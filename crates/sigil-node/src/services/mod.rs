// ============================================
// File: crates/sigil-node/src/services/mod.rs
// ============================================
//! # Node Services
//!
//! ## Creation Reason
//! Provides the connection-level logic of a Sigil node, separated from the
//! accept loop and the CLI.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`handshake`]: runs the authenticated key exchange over a channel
//! - [`channel`]: encrypted message channel built on an established session
//!
//! ## Service Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Service Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────────┐        ┌───────────────────────────┐  │
//! │  │ HandshakeService │ ─────► │      SecureChannel        │  │
//! │  │                  │Session │  - send_message           │  │
//! │  │  - Sign / verify │        │  - recv_message           │  │
//! │  │  - X448 + HKDF   │        │  - close                  │  │
//! │  └──────────────────┘        └───────────────────────────┘  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Services are generic over `Channel`; test them with `MemoryChannel`
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod channel;
pub mod handshake;

// Re-export primary types
pub use channel::SecureChannel;
pub use handshake::{Established, HandshakeService};
