// ============================================
// File: crates/sigil-node/src/handlers/message.rs
// ============================================
//! # Built-in Message Handlers
//!
//! ## Main Functionality
//! - `LoggingHandler`: logs every decrypted message; used by `listen`
//! - `ForwardingHandler`: hands messages to an mpsc receiver, for embedding
//!   the server in another program or a test
//!
//! ## ⚠️ Important Note for Next Developer
//! - `LoggingHandler` prints plaintext at info level; that is the purpose
//!   of the `listen` command, do not reuse it where payloads are sensitive
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use sigil_common::SessionId;
use sigil_core::SigningPublicKey;

use crate::error::{NodeError, Result};
use crate::handlers::{MessageHandler, SessionContext};

// ============================================
// LoggingHandler
// ============================================

/// Logs each decrypted message.
#[derive(Debug, Default)]
pub struct LoggingHandler {
    messages: AtomicU64,
}

impl LoggingHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far, across all sessions.
    #[must_use]
    pub fn message_count(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageHandler for LoggingHandler {
    async fn on_session_established(&self, ctx: &SessionContext) {
        info!(
            session_id = %ctx.session_id,
            peer = ?ctx.peer_addr,
            peer_key = %ctx.peer_key,
            "Session established"
        );
    }

    async fn on_message(&self, ctx: &SessionContext, plaintext: &[u8]) -> Result<()> {
        self.messages.fetch_add(1, Ordering::Relaxed);
        info!(
            session_id = %ctx.session_id,
            peer = ?ctx.peer_addr,
            len = plaintext.len(),
            "received and decrypted: {}",
            String::from_utf8_lossy(plaintext)
        );
        Ok(())
    }

    async fn on_session_closed(&self, ctx: &SessionContext) {
        info!(session_id = %ctx.session_id, peer = ?ctx.peer_addr, "Session closed");
    }
}

// ============================================
// ForwardingHandler
// ============================================

/// A decrypted message together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Session it arrived on.
    pub session_id: SessionId,
    /// Remote address, if known.
    pub peer_addr: Option<SocketAddr>,
    /// Verified signing key of the sender.
    pub peer_key: SigningPublicKey,
    /// Decrypted payload.
    pub plaintext: Vec<u8>,
}

/// Forwards decrypted messages to a channel.
#[derive(Debug)]
pub struct ForwardingHandler {
    tx: UnboundedSender<ReceivedMessage>,
}

impl ForwardingHandler {
    /// Creates a handler that sends every message to `tx`.
    #[must_use]
    pub const fn new(tx: UnboundedSender<ReceivedMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageHandler for ForwardingHandler {
    async fn on_message(&self, ctx: &SessionContext, plaintext: &[u8]) -> Result<()> {
        self.tx
            .send(ReceivedMessage {
                session_id: ctx.session_id,
                peer_addr: ctx.peer_addr,
                peer_key: ctx.peer_key,
                plaintext: plaintext.to_vec(),
            })
            .map_err(|_| {
                NodeError::Transport(sigil_transport::TransportError::Closed)
            })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_common::Role;
    use sigil_core::SigningKeyPair;

    fn context() -> SessionContext {
        SessionContext {
            session_id: SessionId::generate(),
            role: Role::Responder,
            peer_addr: Some("127.0.0.1:9000".parse().unwrap()),
            peer_key: SigningKeyPair::generate().public_key(),
        }
    }

    #[tokio::test]
    async fn test_logging_handler_counts() {
        let handler = LoggingHandler::new();
        let ctx = context();

        handler.on_session_established(&ctx).await;
        handler.on_message(&ctx, b"hello").await.unwrap();
        handler.on_message(&ctx, &[0xff, 0xfe]).await.unwrap();
        handler.on_session_closed(&ctx).await;

        assert_eq!(handler.message_count(), 2);
    }

    #[tokio::test]
    async fn test_forwarding_handler() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handler = ForwardingHandler::new(tx);
        let ctx = context();

        handler.on_message(&ctx, b"hello").await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.plaintext, b"hello");
        assert_eq!(msg.session_id, ctx.session_id);
        assert_eq!(msg.peer_key, ctx.peer_key);
    }

    #[tokio::test]
    async fn test_forwarding_handler_receiver_gone() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let handler = ForwardingHandler::new(tx);

        assert!(handler.on_message(&context(), b"x").await.is_err());
    }
}
