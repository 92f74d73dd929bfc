// ============================================
// File: crates/sigil-node/src/config.rs
// ============================================
//! # Node Configuration
//!
//! ## Creation Reason
//! Provides configuration management for a Sigil node, loaded from a TOML
//! file shared by the `listen` and `send` commands.
//!
//! ## Main Functionality
//! - `NodeConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Accessors that turn text values into protocol types
//!
//! ## Configuration Sections
//! - `network`: listen address, peer address, frame size limit
//! - `identity`: Ed448 identity key file
//! - `peer`: pinned signing public key of the remote peer (hex)
//! - `session`: nonce seed, associated data, handshake timeout
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "127.0.0.1:8098"
//! peer_addr = "127.0.0.1:8098"
//! max_frame_size = 1048576
//!
//! [identity]
//! key_file = "/etc/sigil/node_key.json"
//!
//! [peer]
//! signing_key = "<114 hex characters>"
//!
//! [session]
//! seed = "shared seed"
//! associated_data = ""
//! handshake_timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Both peers must agree on `session.seed` and `session.associated_data`,
//!   otherwise every message fails authentication
//! - Leaving `session.seed` unset derives the seed from the session key
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use sigil_core::{SessionOptions, SigningPublicKey};
use sigil_transport::DEFAULT_MAX_FRAME_SIZE;

use crate::error::{NodeError, Result};

/// Default port for `listen` and `send`.
pub const DEFAULT_PORT: u16 = 8098;

// ============================================
// NodeConfig
// ============================================

/// Main node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Local identity configuration.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Remote peer configuration.
    #[serde(default)]
    pub peer: PeerConfig,

    /// Session parameters.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the TOML is invalid or fails validation.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| NodeError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.identity.validate()?;
        self.peer.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Pinned signing key of the remote peer.
    ///
    /// # Errors
    /// `ConfigMissing` if `peer.signing_key` is unset.
    pub fn peer_signing_key(&self) -> Result<SigningPublicKey> {
        let hex = self
            .peer
            .signing_key
            .as_deref()
            .ok_or_else(|| NodeError::config_missing("peer.signing_key"))?;
        parse_signing_key(hex)
    }

    /// Session options for every session this node establishes.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        match &self.session.seed {
            Some(seed) => SessionOptions::with_seed(seed.as_bytes()),
            None => SessionOptions::default(),
        }
    }

    /// Associated data bound to every data message.
    #[must_use]
    pub fn associated_data(&self) -> &[u8] {
        self.session.associated_data.as_bytes()
    }

    /// Handshake deadline.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.session.handshake_timeout_secs)
    }
}

fn parse_signing_key(hex: &str) -> Result<SigningPublicKey> {
    SigningPublicKey::from_hex(hex.trim())
        .map_err(|e| NodeError::config_invalid("peer.signing_key", e.to_string()))
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address `listen` binds to.
    #[serde(default = "default_addr")]
    pub listen_addr: SocketAddr,

    /// Address `send` connects to.
    #[serde(default = "default_addr")]
    pub peer_addr: SocketAddr,

    /// Largest frame accepted or sent.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

fn default_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

const fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.peer_addr.port() == 0 {
            return Err(NodeError::config_invalid(
                "network.peer_addr",
                "port cannot be 0",
            ));
        }

        if self.max_frame_size < sigil_core::HANDSHAKE_MESSAGE_SIZE {
            return Err(NodeError::config_invalid(
                "network.max_frame_size",
                format!(
                    "must be at least {} bytes",
                    sigil_core::HANDSHAKE_MESSAGE_SIZE
                ),
            ));
        }

        if u32::try_from(self.max_frame_size).is_err() {
            return Err(NodeError::config_invalid(
                "network.max_frame_size",
                "cannot exceed u32::MAX",
            ));
        }

        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_addr(),
            peer_addr: default_addr(),
            max_frame_size: default_max_frame_size(),
        }
    }
}

// ============================================
// IdentityConfig
// ============================================

/// Identity configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to identity key file.
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

fn default_key_file() -> String {
    "/etc/sigil/node_key.json".to_string()
}

impl IdentityConfig {
    fn validate(&self) -> Result<()> {
        if self.key_file.trim().is_empty() {
            return Err(NodeError::config_invalid(
                "identity.key_file",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
        }
    }
}

// ============================================
// PeerConfig
// ============================================

/// Remote peer configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Hex-encoded Ed448 public key the peer must sign with.
    #[serde(default)]
    pub signing_key: Option<String>,
}

impl PeerConfig {
    fn validate(&self) -> Result<()> {
        if let Some(hex) = &self.signing_key {
            parse_signing_key(hex)?;
        }
        Ok(())
    }
}

// ============================================
// SessionConfig
// ============================================

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Shared nonce seed (UTF-8 bytes as given).
    #[serde(default)]
    pub seed: Option<String>,

    /// Associated data bound to every message.
    #[serde(default)]
    pub associated_data: String,

    /// Seconds allowed for the whole handshake.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

const fn default_handshake_timeout() -> u64 {
    10
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if matches!(&self.seed, Some(seed) if seed.is_empty()) {
            return Err(NodeError::config_invalid(
                "session.seed",
                "cannot be empty; omit it to derive the seed",
            ));
        }

        if self.handshake_timeout_secs == 0 {
            return Err(NodeError::config_invalid(
                "session.handshake_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            associated_data: String::new(),
            handshake_timeout_secs: default_handshake_timeout(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================
