// ============================================
// File: crates/sigil-node/src/handlers/mod.rs
// ============================================
//! # Message Handlers
//!
//! ## Creation Reason
//! Decouples what a node does with decrypted messages from the accept loop
//! that produces them.
//!
//! ## Main Functionality
//! - [`MessageHandler`]: per-session callbacks for established sessions,
//!   decrypted messages and closed sessions
//! - [`SessionContext`]: who a message came from
//!
//! ### Submodules
//! - [`message`]: `LoggingHandler` and `ForwardingHandler`
//!
//! ## Data Flow
//! ```text
//! Peer → TcpChannel → SecureChannel::recv_message → MessageHandler::on_message
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers run on the connection's task; a slow handler delays only
//!   that peer
//! - An `Err` from `on_message` closes the connection
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod message;

use std::net::SocketAddr;

use async_trait::async_trait;

use sigil_common::{Role, SessionId};
use sigil_core::SigningPublicKey;

use crate::error::Result;

pub use message::{ForwardingHandler, LoggingHandler, ReceivedMessage};

/// Identifies the session a callback belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    /// Local session identifier.
    pub session_id: SessionId,
    /// Our role in the handshake.
    pub role: Role,
    /// Remote address, if known.
    pub peer_addr: Option<SocketAddr>,
    /// Verified signing key of the peer.
    pub peer_key: SigningPublicKey,
}

/// Receives decrypted traffic from established sessions.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called once after the handshake succeeds.
    async fn on_session_established(&self, _ctx: &SessionContext) {}

    /// Called for every message that authenticated and decrypted.
    ///
    /// # Errors
    /// Returning an error closes the session.
    async fn on_message(&self, ctx: &SessionContext, plaintext: &[u8]) -> Result<()>;

    /// Called once when the session ends, cleanly or not.
    async fn on_session_closed(&self, _ctx: &SessionContext) {}
}
