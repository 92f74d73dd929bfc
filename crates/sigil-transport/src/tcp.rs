// ============================================
// File: crates/sigil-transport/src/tcp.rs
// ============================================
//! # TCP Transport Implementation
//!
//! ## Creation Reason
//! Carries handshake and data messages between peers over TCP, wrapping
//! Tokio's stream with length-prefixed framing behind the `Channel` trait.
//!
//! ## Main Functionality
//! - `TcpChannel`: framed, bidirectional channel over one `TcpStream`
//! - `ChannelListener`: accepts inbound connections as `TcpChannel`s
//!
//! ## Frame Format
//! ```text
//! ┌────────────────────────┬──────────────────────────────┐
//! │ length (u32 BE, 4 B)   │ payload (length bytes)       │
//! └────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Design Choices
//! - Read and write halves sit behind separate async mutexes so a reader
//!   task never blocks a writer
//! - `SO_REUSEADDR` on listeners for quick rebinding after restart
//! - Frames above `max_frame_size` are rejected before allocating
//!
//! ## ⚠️ Important Note for Next Developer
//! - EOF exactly on a frame boundary is `Closed`; anywhere else it is an
//!   `Io` error (truncated frame)
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP transport implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::Channel;

// ============================================
// Constants
// ============================================

/// Size of the frame length prefix.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Default upper bound on a single frame (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20;

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse().map_err(|_| TransportError::InvalidAddress {
        addr: addr.to_string(),
    })
}

// ============================================
// TcpChannel
// ============================================

/// Length-prefixed channel over a TCP stream.
///
/// # Example
/// ```ignore
/// use sigil_transport::{Channel, TcpChannel};
///
/// let channel = TcpChannel::connect("127.0.0.1:8098", 1 << 20).await?;
/// channel.send(b"frame").await?;
/// let reply = channel.recv().await?;
/// ```
pub struct TcpChannel {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    max_frame_size: usize,
    open: AtomicBool,
}

impl TcpChannel {
    /// Connects to `addr` (e.g. `"127.0.0.1:8098"`).
    ///
    /// # Errors
    /// - `InvalidAddress`: unparsable address
    /// - `ConnectFailed`: connection refused or unreachable
    pub async fn connect(addr: impl AsRef<str>, max_frame_size: usize) -> Result<Self> {
        let addr_str = addr.as_ref();
        let socket_addr = parse_addr(addr_str)?;

        debug!("Connecting to {}", socket_addr);
        let stream = TcpStream::connect(socket_addr)
            .await
            .map_err(|e| TransportError::connect_failed(addr_str, e.to_string()))?;

        Self::from_stream(stream, max_frame_size)
    }

    /// Wraps an already connected stream.
    ///
    /// # Errors
    /// Returns error if the socket addresses cannot be read.
    pub fn from_stream(stream: TcpStream, max_frame_size: usize) -> Result<Self> {
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::io("setting TCP_NODELAY", e))?;
        let peer_addr = stream
            .peer_addr()
            .map_err(|e| TransportError::io("getting peer address", e))?;
        let local_addr = stream
            .local_addr()
            .map_err(|e| TransportError::io("getting local address", e))?;

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            peer_addr,
            local_addr,
            max_frame_size,
            open: AtomicBool::new(true),
        })
    }

    /// Local address of the stream.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Configured frame limit.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

#[async_trait]
impl Channel for TcpChannel {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        if frame.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }
        let len = u32::try_from(frame.len()).map_err(|_| TransportError::FrameTooLarge {
            size: frame.len(),
            max: u32::MAX as usize,
        })?;

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(frame);

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&buf)
            .await
            .map_err(|e| TransportError::io("writing frame", e))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::io("flushing frame", e))?;

        trace!("Sent {} byte frame to {}", frame.len(), self.peer_addr);
        Ok(())
    }

    async fn recv(&self) -> Result<Bytes> {
        let mut reader = self.reader.lock().await;

        let mut header = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = reader
                .read(&mut header[filled..])
                .await
                .map_err(|e| TransportError::io("reading frame header", e))?;
            if n == 0 {
                if filled == 0 {
                    return Err(TransportError::Closed);
                }
                return Err(TransportError::io(
                    "reading frame header",
                    std::io::ErrorKind::UnexpectedEof.into(),
                ));
            }
            filled += n;
        }

        let len = u32::from_be_bytes(header) as usize;
        if len > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let mut payload = BytesMut::zeroed(len);
        reader
            .read_exact(&mut payload)
            .await
            .map_err(|e| TransportError::io("reading frame payload", e))?;

        trace!("Received {} byte frame from {}", len, self.peer_addr);
        Ok(payload.freeze())
    }

    async fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!("Closing channel to {}", self.peer_addr);
            let mut writer = self.writer.lock().await;
            writer
                .shutdown()
                .await
                .map_err(|e| TransportError::io("shutting down stream", e))?;
        }
        Ok(())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer_addr)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TcpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpChannel")
            .field("peer_addr", &self.peer_addr)
            .field("local_addr", &self.local_addr)
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================
// ChannelListener
// ============================================

/// TCP listener producing [`TcpChannel`]s.
pub struct ChannelListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_frame_size: usize,
}

impl ChannelListener {
    /// Binds to `addr` (e.g. `"127.0.0.1:8098"`, port 0 for any).
    ///
    /// # Errors
    /// - `InvalidAddress`: unparsable address
    /// - `BindFailed`: bind or listen failed
    pub async fn bind(addr: impl AsRef<str>, max_frame_size: usize) -> Result<Self> {
        let addr = parse_addr(addr.as_ref())?;
        info!("Binding TCP listener to {}", addr);

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|e| TransportError::io("creating TCP socket", e))?;

        socket
            .set_reuseaddr(true)
            .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;
        socket
            .bind(addr)
            .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;
        let listener = socket
            .listen(1024)
            .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("getting local address", e))?;
        info!("TCP listener bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            max_frame_size,
        })
    }

    /// Waits for the next inbound connection.
    ///
    /// # Errors
    /// Returns error if accepting fails.
    pub async fn accept(&self) -> Result<TcpChannel> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::io("accepting connection", e))?;
        debug!("Accepted connection from {}", addr);
        TcpChannel::from_stream(stream, self.max_frame_size)
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl std::fmt::Debug for ChannelListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelListener")
            .field("local_addr", &self.local_addr)
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

    async fn connected_pair(max: usize) -> (TcpChannel, TcpChannel) {
        let listener = ChannelListener::bind("127.0.0.1:0", max).await.unwrap();
        let addr = listener.local_addr().to_string();

        let (client, server) = tokio::join!(TcpChannel::connect(&addr, max), listener.accept());
        (client.unwrap(), server.unwrap())
    }

    #[tokio::test]
    async fn test_bind_and_local_addr() {
        let listener = ChannelListener::bind("127.0.0.1:0", DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap();
        let addr = listener.local_addr();

        assert_eq!(addr.ip(), std::net::Ipv4Addr::LOCALHOST);
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_send_recv_loopback() {
        let (client, server) = connected_pair(DEFAULT_MAX_FRAME_SIZE).await;

        client.send(b"Hello, Sigil!").await.unwrap();
        client.send(b"").await.unwrap();
        client.send(&[7u8; 5000]).await.unwrap();

        assert_eq!(&server.recv().await.unwrap()[..], b"Hello, Sigil!");
        assert!(server.recv().await.unwrap().is_empty());
        assert_eq!(server.recv().await.unwrap().len(), 5000);

        server.send(b"reply").await.unwrap();
        assert_eq!(&client.recv().await.unwrap()[..], b"reply");
        assert_eq!(server.peer_addr(), Some(client.local_addr()));
    }

    #[tokio::test]
    async fn test_close_is_seen_by_peer() {
        let (client, server) = connected_pair(DEFAULT_MAX_FRAME_SIZE).await;

        client.send(b"last").await.unwrap();
        client.close().await.unwrap();
        assert!(!client.is_open());

        assert_eq!(&server.recv().await.unwrap()[..], b"last");
        assert!(matches!(server.recv().await, Err(TransportError::Closed)));
        assert!(matches!(client.send(b"x").await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_on_send() {
        let (client, _server) = connected_pair(16).await;
        let result = client.send(&[0u8; 17]).await;
        assert!(matches!(
            result,
            Err(TransportError::FrameTooLarge { size: 17, max: 16 })
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_on_recv() {
        let listener = ChannelListener::bind("127.0.0.1:0", 16).await.unwrap();
        let addr = listener.local_addr();

        let (raw, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let mut raw = raw.unwrap();
        let server = server.unwrap();

        raw.write_all(&1000u32.to_be_bytes()).await.unwrap();
        assert!(matches!(
            server.recv().await,
            Err(TransportError::FrameTooLarge { size: 1000, max: 16 })
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let listener = ChannelListener::bind("127.0.0.1:0", 64).await.unwrap();
        let addr = listener.local_addr();

        let (raw, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let mut raw = raw.unwrap();
        let server = server.unwrap();

        raw.write_all(&10u32.to_be_bytes()).await.unwrap();
        raw.write_all(b"abc").await.unwrap();
        drop(raw);

        assert!(matches!(server.recv().await, Err(TransportError::Io { .. })));
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let result = ChannelListener::bind("not-an-address", 16).await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));

        let result = TcpChannel::connect("nope", 16).await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));
    }
}
