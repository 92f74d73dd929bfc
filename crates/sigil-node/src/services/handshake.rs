// ============================================
// File: crates/sigil-node/src/services/handshake.rs
// ============================================
//! # Handshake Service
//!
//! ## Creation Reason
//! Drives the sans-IO `Handshake` state machine over a `Channel`, turning a
//! fresh connection into an established `Session`.
//!
//! ## Handshake Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    HandshakeService                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  1. Generate ephemeral X448 key                              │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  2. Sign and send our 170-byte message                       │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  3. Receive and decode the peer's message                    │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  4. Verify against the pinned peer key                       │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  5. X448 + HKDF → Session                                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! Both sides send before they read, so the exchange takes one round trip
//! regardless of role.
//!
//! ## Error Handling
//! - Signature failures: handshake fails, connection dropped (potential attack)
//! - Peer closed or deadline passed: handshake aborted, keys dropped
//!
//! ## ⚠️ Important Note for Next Developer
//! - The whole exchange runs under one deadline, not one per message
//! - Never retry a failed handshake on the same `Handshake` value
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake service

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use sigil_common::Role;
use sigil_core::error::CoreError;
use sigil_core::protocol::{decode_handshake, encode_handshake};
use sigil_core::{Handshake, PeerIdentity, Session, SessionOptions, SigningKeyPair, SigningPublicKey};
use sigil_transport::{Channel, TransportError};

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};

/// Result of a successful handshake.
#[derive(Debug)]
pub struct Established {
    /// Ready-to-use session.
    pub session: Session,
    /// Verified remote peer.
    pub peer: PeerIdentity,
}

/// Runs handshakes for one local identity against one pinned peer key.
pub struct HandshakeService {
    identity: Arc<SigningKeyPair>,
    peer_key: SigningPublicKey,
    options: SessionOptions,
    timeout: Duration,
}

impl HandshakeService {
    /// Creates a handshake service.
    #[must_use]
    pub fn new(
        identity: Arc<SigningKeyPair>,
        peer_key: SigningPublicKey,
        options: SessionOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            peer_key,
            options,
            timeout,
        }
    }

    /// Creates a handshake service from the node configuration.
    ///
    /// # Errors
    /// `ConfigMissing` / `ConfigInvalid` if no usable peer key is configured.
    pub fn from_config(config: &NodeConfig, identity: Arc<SigningKeyPair>) -> Result<Self> {
        Ok(Self::new(
            identity,
            config.peer_signing_key()?,
            config.session_options(),
            config.handshake_timeout(),
        ))
    }

    /// Our signing public key.
    #[must_use]
    pub fn local_key(&self) -> SigningPublicKey {
        self.identity.public_key()
    }

    /// Runs a complete handshake as `role`.
    ///
    /// # Errors
    /// - `HandshakeTimeout` if the deadline passes
    /// - `Core(Aborted)` if the peer closes the channel mid-handshake
    /// - `Core(InvalidSignature | InvalidPeerKey | MalformedMessage ..)` on a
    ///   bad peer message
    pub async fn run<C>(&self, channel: &C, role: Role) -> Result<Established>
    where
        C: Channel + ?Sized,
    {
        let mut handshake = Handshake::with_identity(role, Arc::clone(&self.identity));
        self.perform(&mut handshake, channel).await
    }

    /// Runs `handshake` to completion over `channel`, leaving it in a
    /// terminal state either way.
    ///
    /// # Errors
    /// See [`HandshakeService::run`].
    pub async fn perform<C>(&self, handshake: &mut Handshake, channel: &C) -> Result<Established>
    where
        C: Channel + ?Sized,
    {
        let role = handshake.role();
        let peer = channel.peer_addr();
        debug!(%role, ?peer, "Starting handshake");

        let outcome = tokio::time::timeout(self.timeout, self.exchange(handshake, channel)).await;

        match outcome {
            Ok(Ok(established)) => {
                info!(
                    %role,
                    ?peer,
                    session_id = %established.session.id(),
                    peer_key = %established.peer.signing_public,
                    "Handshake established"
                );
                Ok(established)
            }
            Ok(Err(e)) => {
                handshake.abort();
                if e.is_suspicious() {
                    warn!(%role, ?peer, state = %handshake.state(), error = %e, "Peer failed handshake verification");
                } else {
                    info!(%role, ?peer, state = %handshake.state(), error = %e, "Handshake failed");
                }
                Err(e)
            }
            Err(_) => {
                handshake.abort();
                warn!(%role, ?peer, "Handshake timed out");
                Err(NodeError::HandshakeTimeout {
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    async fn exchange<C>(&self, handshake: &mut Handshake, channel: &C) -> Result<Established>
    where
        C: Channel + ?Sized,
    {
        handshake.generate_keys()?;
        let ours = handshake.create_message()?;
        channel
            .send(&encode_handshake(&ours))
            .await
            .map_err(Self::transport_failure)?;

        let frame = channel.recv().await.map_err(Self::transport_failure)?;
        let theirs = match decode_handshake(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                handshake.fail_malformed();
                return Err(e.into());
            }
        };

        handshake.receive_message(&theirs, &self.peer_key)?;
        let session = handshake.establish(&self.options)?;

        let peer = handshake
            .peer_identity()
            .copied()
            .ok_or_else(|| CoreError::invalid_state("peer_identity", "SessionEstablished"))?;

        Ok(Established { session, peer })
    }

    fn transport_failure(err: TransportError) -> NodeError {
        if err.is_closed() {
            debug!(error = %err, "Channel closed during handshake");
            NodeError::Core(CoreError::Aborted)
        } else {
            NodeError::Transport(err)
        }
    }
}

impl std::fmt::Debug for HandshakeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeService")
            .field("local_key", &self.identity.public_key())
            .field("peer_key", &self.peer_key)
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================
// Tests
// ============================================
