// ============================================
// File: crates/sigil-node/src/services/channel.rs
// ============================================
//! # Secure Channel
//!
//! ## Creation Reason
//! Pairs a transport `Channel` with an established `Session` so callers
//! exchange plaintext while every frame on the wire is Ascon-128 output.
//!
//! ## Data Flow
//! ```text
//! send_message: plaintext → Session::send → frame → Channel::send
//! recv_message: Channel::recv → frame → Session::receive → plaintext
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A failed `recv_message` has already consumed the inbound counter;
//!   the channel must be dropped, the peers are out of step
//! - Both peers must use the same associated data
//!
//! ## Last Modified
//! v0.1.0 - Initial secure channel

use std::net::SocketAddr;

use tracing::{debug, trace, warn};

use sigil_common::SessionId;
use sigil_core::Session;
use sigil_transport::Channel;

use crate::error::Result;

/// Encrypted, authenticated message channel to one peer.
pub struct SecureChannel<C> {
    channel: C,
    session: Session,
    associated_data: Vec<u8>,
}

impl<C: Channel> SecureChannel<C> {
    /// Wraps `channel` with `session`.
    pub fn new(channel: C, session: Session, associated_data: impl Into<Vec<u8>>) -> Self {
        Self {
            channel,
            session,
            associated_data: associated_data.into(),
        }
    }

    /// Encrypts and sends one message.
    ///
    /// # Errors
    /// - `Core(CounterExhausted)` once the outbound counter runs out
    /// - `Transport(..)` if the frame cannot be sent
    pub async fn send_message(&mut self, plaintext: &[u8]) -> Result<()> {
        let frame = self.session.send(plaintext, &self.associated_data)?;
        self.channel.send(&frame).await?;

        trace!(
            session_id = %self.session.id(),
            counter = self.session.messages_sent(),
            "Sent message"
        );
        Ok(())
    }

    /// Receives and decrypts one message.
    ///
    /// # Errors
    /// - `Core(AuthFailure)` if the frame does not authenticate
    /// - `Transport(Closed)` when the peer has closed the channel
    pub async fn recv_message(&mut self) -> Result<Vec<u8>> {
        let frame = self.channel.recv().await?;

        match self.session.receive(&frame, &self.associated_data) {
            Ok(plaintext) => {
                trace!(
                    session_id = %self.session.id(),
                    counter = self.session.messages_received(),
                    "Received message"
                );
                Ok(plaintext)
            }
            Err(e) => {
                warn!(
                    session_id = %self.session.id(),
                    peer = ?self.channel.peer_addr(),
                    error = %e,
                    "Rejected inbound frame"
                );
                Err(e.into())
            }
        }
    }

    /// Closes the sending side of the underlying channel.
    ///
    /// # Errors
    /// Returns error if the transport shutdown fails.
    pub async fn close(&self) -> Result<()> {
        debug!(session_id = %self.session.id(), "Closing secure channel");
        self.channel.close().await?;
        Ok(())
    }

    /// Identifier of the underlying session.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Remote address, if the transport has one.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.channel.peer_addr()
    }
}

impl<C> std::fmt::Debug for SecureChannel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel")
            .field("session", &self.session)
            .field("associated_data_len", &self.associated_data.len())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::NodeError;
    use crate::services::HandshakeService;
    use sigil_common::Role;
    use sigil_core::error::CoreError;
    use sigil_core::{SessionOptions, SigningKeyPair};
    use sigil_transport::{MemoryChannel, TransportError};

    async fn connected(
        options: SessionOptions,
        ad_a: &[u8],
        ad_b: &[u8],
    ) -> (SecureChannel<MemoryChannel>, SecureChannel<MemoryChannel>) {
        let alice_id = Arc::new(SigningKeyPair::generate());
        let bob_id = Arc::new(SigningKeyPair::generate());
        let timeout = Duration::from_secs(5);
        let alice = HandshakeService::new(
            Arc::clone(&alice_id),
            bob_id.public_key(),
            options.clone(),
            timeout,
        );
        let bob = HandshakeService::new(bob_id, alice_id.public_key(), options, timeout);

        let (a, b) = MemoryChannel::pair(4096);
        let (ra, rb) = tokio::join!(
            alice.run(&a, Role::Initiator),
            bob.run(&b, Role::Responder)
        );

        (
            SecureChannel::new(a, ra.unwrap().session, ad_a),
            SecureChannel::new(b, rb.unwrap().session, ad_b),
        )
    }

    #[tokio::test]
    async fn test_hello_scenario() {
        let (mut alice, mut bob) = connected(SessionOptions::default(), b"", b"").await;

        alice.send_message(b"hello").await.unwrap();
        assert_eq!(bob.recv_message().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_conversation_with_explicit_seed() {
        let options = SessionOptions::with_seed(b"shared seed".to_vec());
        let (mut alice, mut bob) = connected(options, b"ad", b"ad").await;

        for i in 0..10u8 {
            alice.send_message(&[i; 3]).await.unwrap();
            bob.send_message(&[i; 5]).await.unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(bob.recv_message().await.unwrap(), vec![i; 3]);
            assert_eq!(alice.recv_message().await.unwrap(), vec![i; 5]);
        }

        assert_eq!(alice.session().messages_sent(), 10);
        assert_eq!(bob.session().messages_received(), 10);
    }

    #[tokio::test]
    async fn test_associated_data_mismatch() {
        let (mut alice, mut bob) = connected(SessionOptions::default(), b"one", b"two").await;

        alice.send_message(b"hello").await.unwrap();
        assert!(matches!(
            bob.recv_message().await,
            Err(NodeError::Core(CoreError::AuthFailure))
        ));
    }

    #[tokio::test]
    async fn test_close_reaches_peer() {
        let (mut alice, mut bob) = connected(SessionOptions::default(), b"", b"").await;

        alice.send_message(b"bye").await.unwrap();
        alice.close().await.unwrap();

        assert_eq!(bob.recv_message().await.unwrap(), b"bye");
        let err = bob.recv_message().await.unwrap_err();
        assert!(matches!(err, NodeError::Transport(TransportError::Closed)));
        assert!(err.is_peer_closed());
    }
}
