// ============================================
// File: crates/sigil-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the byte-stream channel interface the handshake driver and the
//! secure channel talk to, so both can run over TCP in production and
//! over in-memory pipes in tests.
//!
//! ## Main Functionality
//! - `Channel`: message-preserving, ordered, reliable byte channel
//!
//! ## Design Philosophy
//! - Async-first design with `async_trait`
//! - Methods take `&self` so one channel can be read and written from
//!   different tasks
//! - Every `send` is delivered as exactly one `recv`
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

// ============================================
// Channel Trait
// ============================================

/// Ordered, reliable, message-framed channel to one peer.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks.
///
/// # Example
/// ```ignore
/// async fn echo<C: Channel>(channel: &C) -> Result<()> {
///     loop {
///         let frame = channel.recv().await?;
///         channel.send(&frame).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait Channel: Send + Sync {
    /// Sends one frame.
    ///
    /// # Errors
    /// - `Closed`: channel was closed
    /// - `FrameTooLarge`: frame over the configured limit
    async fn send(&self, frame: &[u8]) -> Result<()>;

    /// Receives the next frame.
    ///
    /// # Errors
    /// - `Closed`: the peer closed the channel
    async fn recv(&self) -> Result<Bytes>;

    /// Closes the sending side. Further sends fail with `Closed`; the peer
    /// sees `Closed` after draining pending frames.
    ///
    /// # Errors
    /// Returns error if the underlying shutdown fails.
    async fn close(&self) -> Result<()>;

    /// Remote address, if the channel has one.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Returns `true` until `close` has been called.
    fn is_open(&self) -> bool;
}
