// ============================================
// File: crates/sigil-node/src/client.rs
// ============================================
//! # Client
//!
//! ## Creation Reason
//! The initiating side of a Sigil connection: connect to the configured
//! peer, run the initiator handshake and send messages.
//!
//! ## Main Functionality
//! - `Client::connect`: TCP connect + handshake → `SecureChannel`
//! - `Client::send`: one-shot connect, send all messages, close
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

use std::sync::Arc;

use tracing::info;

use sigil_common::Role;
use sigil_core::SigningKeyPair;
use sigil_transport::TcpChannel;

use crate::config::NodeConfig;
use crate::error::Result;
use crate::services::{HandshakeService, SecureChannel};

/// Connecting Sigil node.
#[derive(Debug)]
pub struct Client {
    config: NodeConfig,
    handshake: HandshakeService,
}

impl Client {
    /// Creates a client.
    ///
    /// # Errors
    /// Returns error if the configuration has no usable peer key.
    pub fn new(config: NodeConfig, identity: SigningKeyPair) -> Result<Self> {
        let handshake = HandshakeService::from_config(&config, Arc::new(identity))?;
        Ok(Self { config, handshake })
    }

    /// Connects to the configured peer and completes the handshake.
    ///
    /// # Errors
    /// Returns error if connecting or the handshake fails.
    pub async fn connect(&self) -> Result<SecureChannel<TcpChannel>> {
        let addr = self.config.network.peer_addr;
        info!(peer = %addr, "Connecting");

        let channel = TcpChannel::connect(addr.to_string(), self.config.network.max_frame_size).await?;
        let established = self.handshake.run(&channel, Role::Initiator).await?;

        Ok(SecureChannel::new(
            channel,
            established.session,
            self.config.associated_data(),
        ))
    }

    /// Connects, sends every message in order and closes the channel.
    ///
    /// Returns the number of messages sent.
    ///
    /// # Errors
    /// Returns error if connecting, the handshake or any send fails.
    pub async fn send<M: AsRef<[u8]>>(&self, messages: &[M]) -> Result<usize> {
        let mut secure = self.connect().await?;

        for message in messages {
            secure.send_message(message.as_ref()).await?;
        }
        secure.close().await?;

        info!(
            session_id = %secure.session_id(),
            sent = messages.len(),
            "Messages sent"
        );
        Ok(messages.len())
    }
}
