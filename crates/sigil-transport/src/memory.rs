// ============================================
// File: crates/sigil-transport/src/memory.rs
// ============================================
//! # In-Memory Channel
//!
//! ## Creation Reason
//! Provides a connected channel pair for testing the handshake and the
//! secure channel without opening sockets.
//!
//! ## Main Functionality
//! - `MemoryChannel::pair`: two connected ends
//! - Frame limit enforced like the TCP channel
//! - `close` on one end makes the other end's `recv` return `Closed`
//!   after pending frames are drained
//!
//! ## ⚠️ Important Note for Next Developer
//! - Intended for tests and in-process wiring; queues are unbounded
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::Channel;

// ============================================
// MemoryChannel
// ============================================

/// One end of an in-process channel.
///
/// # Example
/// ```
/// use sigil_transport::{Channel, MemoryChannel};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (a, b) = MemoryChannel::pair(1024);
/// a.send(b"ping").await?;
/// assert_eq!(&b.recv().await?[..], b"ping");
/// # Ok(())
/// # }
/// ```
pub struct MemoryChannel {
    tx: Mutex<Option<UnboundedSender<Bytes>>>,
    rx: tokio::sync::Mutex<UnboundedReceiver<Bytes>>,
    max_frame_size: usize,
}

impl MemoryChannel {
    /// Creates two connected ends.
    #[must_use]
    pub fn pair(max_frame_size: usize) -> (Self, Self) {
        let (a_tx, b_rx) = unbounded_channel();
        let (b_tx, a_rx) = unbounded_channel();

        let a = Self {
            tx: Mutex::new(Some(a_tx)),
            rx: tokio::sync::Mutex::new(a_rx),
            max_frame_size,
        };
        let b = Self {
            tx: Mutex::new(Some(b_tx)),
            rx: tokio::sync::Mutex::new(b_rx),
            max_frame_size,
        };
        (a, b)
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }

        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(TransportError::Closed)?;
        tx.send(Bytes::copy_from_slice(frame))
            .map_err(|_| TransportError::Closed)?;

        trace!("Queued {} byte frame", frame.len());
        Ok(())
    }

    async fn recv(&self) -> Result<Bytes> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&self) -> Result<()> {
        self.tx.lock().take();
        Ok(())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn is_open(&self) -> bool {
        self.tx.lock().is_some()
    }
}

impl std::fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChannel")
            .field("open", &self.is_open())
            .field("max_frame_size", &self.max_frame_size)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_roundtrip() {
        let (a, b) = MemoryChannel::pair(64);

        a.send(b"one").await.unwrap();
        a.send(b"two").await.unwrap();
        b.send(b"back").await.unwrap();

        assert_eq!(&b.recv().await.unwrap()[..], b"one");
        assert_eq!(&b.recv().await.unwrap()[..], b"two");
        assert_eq!(&a.recv().await.unwrap()[..], b"back");
    }

    #[tokio::test]
    async fn test_close_drains_then_closed() {
        let (a, b) = MemoryChannel::pair(64);

        a.send(b"pending").await.unwrap();
        a.close().await.unwrap();
        assert!(!a.is_open());

        assert_eq!(&b.recv().await.unwrap()[..], b"pending");
        assert!(matches!(b.recv().await, Err(TransportError::Closed)));
        assert!(matches!(a.send(b"x").await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_dropped_peer_is_closed() {
        let (a, b) = MemoryChannel::pair(64);
        drop(b);
        assert!(matches!(a.send(b"x").await, Err(TransportError::Closed)));
        assert!(matches!(a.recv().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_frame_limit() {
        let (a, _b) = MemoryChannel::pair(4);
        assert!(matches!(
            a.send(b"too long").await,
            Err(TransportError::FrameTooLarge { size: 8, max: 4 })
        ));
    }

    #[test]
    fn test_no_peer_addr() {
        let (a, _b) = MemoryChannel::pair(4);
        assert!(a.peer_addr().is_none());
    }
}
