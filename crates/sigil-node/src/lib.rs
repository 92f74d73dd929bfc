// ============================================
// File: crates/sigil-node/src/lib.rs
// ============================================
//! # Sigil Node Library
//!
//! ## Creation Reason
//! Wires the core handshake and session to TCP channels, giving the
//! `sigil-node` binary (and embedders) a listening server and a client.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Node configuration management
//! - [`identity`]: Identity key files
//! - [`services`]: Handshake driver and secure channel
//! - [`handlers`]: What happens to decrypted messages
//! - [`server`]: Accept loop and connection tasks
//! - [`client`]: Connect, handshake, send
//! - [`error`]: Node-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Sigil Node                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│ Server /    │────►│    Handlers     │    │
//! │  │  Identity   │     │ Client      │     │                 │    │
//! │  └─────────────┘     └──────┬──────┘     └─────────────────┘    │
//! │                             │                                   │
//! │                    ┌────────┴─────────┐                         │
//! │                    ▼                  ▼                         │
//! │           ┌────────────────┐  ┌────────────────┐                │
//! │           │HandshakeService│─►│ SecureChannel  │                │
//! │           └────────────────┘  └────────────────┘                │
//! │                                                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Transport Layer                             │
//! │             TcpChannel (u32 length-prefixed frames)             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Client → encrypt → TCP → decrypt → MessageHandler
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Peer signing keys are pinned in configuration; there is no
//!   trust-on-first-use
//! - Configuration changes require restart (no hot-reload)
//!
//! ## Last Modified
//! v0.1.0 - Initial node library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod server;
pub mod services;

// Re-export primary types
pub use client::Client;
pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use handlers::{ForwardingHandler, LoggingHandler, MessageHandler, SessionContext};
pub use server::Server;
pub use services::{HandshakeService, SecureChannel};
