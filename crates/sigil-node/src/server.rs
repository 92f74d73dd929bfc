// ============================================
// File: crates/sigil-node/src/server.rs
// ============================================
//! # Server Orchestrator
//!
//! ## Creation Reason
//! Accepts TCP connections, runs the responder handshake on each and feeds
//! decrypted messages to a `MessageHandler`.
//!
//! ## Main Functionality
//! - `Server`: listener lifecycle and accept loop
//! - One tokio task per connection
//! - Graceful shutdown on Ctrl+C or `Server::shutdown`
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Server                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────┐   accept    ┌──────────────────────────┐  │
//! │  │ Accept Loop  │ ──────────► │ Connection Task (each)   │  │
//! │  │              │             │  1. HandshakeService     │  │
//! │  │  select! on  │             │  2. SecureChannel        │  │
//! │  │  shutdown    │             │  3. MessageHandler       │  │
//! │  └──────────────┘             └──────────────────────────┘  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Graceful shutdown waits up to 5s for connection tasks
//! - Connection errors are logged and never stop the accept loop
//! - A connection survives handler errors unless `should_close_channel`
//!   says otherwise
//! - Use tokio::select! for concurrent operations
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation
//! v0.1.1 - Handler errors only close the connection when fatal

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use sigil_common::Role;
use sigil_core::SigningKeyPair;
use sigil_transport::{Channel, ChannelListener, TcpChannel};

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::handlers::{MessageHandler, SessionContext};
use crate::services::{HandshakeService, SecureChannel};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ============================================
// Server
// ============================================

/// Listening Sigil node.
///
/// # Lifecycle
/// 1. Create with `Server::new(config, identity, handler)`
/// 2. Start with `server.run().await` (or `serve` with a bound listener)
/// 3. Shutdown via `shutdown()` or Ctrl+C
pub struct Server {
    config: NodeConfig,
    handshake: Arc<HandshakeService>,
    handler: Arc<dyn MessageHandler>,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Errors
    /// Returns error if the configuration has no usable peer key.
    pub fn new(
        config: NodeConfig,
        identity: SigningKeyPair,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self> {
        let handshake = Arc::new(HandshakeService::from_config(&config, Arc::new(identity))?);
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            config,
            handshake,
            handler,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        })
    }

    /// Binds the configured address and serves until Ctrl+C or `shutdown`.
    ///
    /// # Errors
    /// Returns error if the listener cannot be bound.
    pub async fn run(&self) -> Result<()> {
        info!("Starting Sigil node v{}", env!("CARGO_PKG_VERSION"));

        let listener = self.bind().await?;

        let shutdown = Arc::clone(&self.shutdown);
        let shutdown_tx = self.shutdown_tx.clone();
        let signal_task = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown.store(true, Ordering::SeqCst);
                    let _ = shutdown_tx.send(());
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        });

        let result = self.serve(listener).await;
        signal_task.abort();
        result
    }

    /// Binds the configured listen address.
    ///
    /// # Errors
    /// `StartupFailed` if the address cannot be bound.
    pub async fn bind(&self) -> Result<ChannelListener> {
        let addr = self.config.network.listen_addr;
        ChannelListener::bind(addr.to_string(), self.config.network.max_frame_size)
            .await
            .map_err(|e| NodeError::startup_failed(format!("TCP bind on {addr} failed: {e}")))
    }

    /// Serves connections from `listener` until shutdown.
    ///
    /// # Errors
    /// Currently always `Ok`; accept failures are logged and retried.
    pub async fn serve(&self, listener: ChannelListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut tasks = JoinSet::new();

        info!(
            listen_addr = %listener.local_addr(),
            local_key = %self.handshake.local_key(),
            "Listening for peers"
        );

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok(channel) => {
                            let handshake = Arc::clone(&self.handshake);
                            let handler = Arc::clone(&self.handler);
                            let ad = self.config.associated_data().to_vec();
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            tasks.spawn(async move {
                                let peer = channel.peer_addr();
                                if let Err(e) =
                                    handle_connection(channel, &handshake, handler.as_ref(), ad, shutdown_rx).await
                                {
                                    warn!(?peer, error = %e, "Connection ended with error");
                                }
                            });
                        }
                        Err(e) => {
                            if !self.shutdown.load(Ordering::SeqCst) {
                                error!("Accept error: {}", e);
                            }
                        }
                    }
                }
                // Reap finished connection tasks so the set stays small.
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Connection task panicked: {}", e);
                    }
                }
            }
        }

        info!(active = tasks.len(), "Shutting down server...");
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Connection tasks timed out during shutdown");
            tasks.abort_all();
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Triggers server shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Configured listen address.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        self.config.network.listen_addr
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_addr", &self.config.network.listen_addr)
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}

// ============================================
// Connection Task
// ============================================

/// Handshake, then decrypt messages until the peer closes or shutdown.
async fn handle_connection(
    channel: TcpChannel,
    handshake: &HandshakeService,
    handler: &dyn MessageHandler,
    associated_data: Vec<u8>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let established = handshake.run(&channel, Role::Responder).await?;

    let ctx = SessionContext {
        session_id: established.session.id(),
        role: Role::Responder,
        peer_addr: channel.peer_addr(),
        peer_key: established.peer.signing_public,
    };
    let mut secure = SecureChannel::new(channel, established.session, associated_data);
    handler.on_session_established(&ctx).await;

    let result = loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!(session_id = %ctx.session_id, "Connection received shutdown signal");
                break Ok(());
            }
            received = secure.recv_message() => {
                let err = match received {
                    Ok(plaintext) => match handler.on_message(&ctx, &plaintext).await {
                        Ok(()) => continue,
                        Err(e) => e,
                    },
                    Err(e) if e.is_peer_closed() => break Ok(()),
                    Err(e) => e,
                };
                if err.should_close_channel() {
                    break Err(err);
                }
                warn!(session_id = %ctx.session_id, error = %err, "Message dropped, keeping connection");
            }
        }
    };

    handler.on_session_closed(&ctx).await;
    if let Err(e) = secure.close().await {
        debug!(session_id = %ctx.session_id, error = %e, "Close after session end failed");
    }
    result
}
