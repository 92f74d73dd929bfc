// ============================================
// File: crates/sigil-node/src/identity.rs
// ============================================
//! # Identity Files
//!
//! ## Creation Reason
//! Persists the node's long-term Ed448 signing key so its public key can be
//! pinned by peers across restarts.
//!
//! ## File Format
//! ```json
//! {
//!   "version": "1.0",
//!   "key_type": "ed448",
//!   "public_key": "<base64, 57 bytes>",
//!   "private_key": "<base64, 57-byte seed>",
//!   "created_at": 1760000000
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Files are written with mode 0600 on Unix
//! - `load` rejects files whose public key does not match the seed
//!
//! ## Last Modified
//! v0.1.0 - Initial identity file support

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use sigil_core::SigningKeyPair;

use crate::error::{NodeError, Result};

const FILE_VERSION: &str = "1.0";
const KEY_TYPE: &str = "ed448";

/// On-disk identity representation.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: String,
    key_type: String,
    public_key: String,
    private_key: String,
    created_at: u64,
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Loads an identity from a JSON key file.
///
/// # Errors
/// `Identity` if the file is unreadable, malformed or inconsistent.
pub async fn load(path: impl AsRef<Path>) -> Result<SigningKeyPair> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = Zeroizing::new(
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NodeError::identity(&path_str, e.to_string()))?,
    );
    let key_data: KeyFile = serde_json::from_str(&content)
        .map_err(|e| NodeError::identity(&path_str, e.to_string()))?;

    if key_data.key_type != KEY_TYPE {
        return Err(NodeError::identity(
            &path_str,
            format!("unsupported key type '{}'", key_data.key_type),
        ));
    }

    let seed = Zeroizing::new(
        BASE64
            .decode(key_data.private_key.as_bytes())
            .map_err(|e| NodeError::identity(&path_str, format!("private key: {e}")))?,
    );
    let identity = SigningKeyPair::from_seed(&seed)
        .map_err(|e| NodeError::identity(&path_str, e.to_string()))?;

    if identity.public_key().to_base64() != key_data.public_key {
        return Err(NodeError::identity(
            &path_str,
            "public key does not match private key",
        ));
    }

    debug!(
        public_key = %identity.public_key(),
        version = %key_data.version,
        created_at = key_data.created_at,
        "Loaded identity from {}",
        path_str
    );
    Ok(identity)
}

/// Writes an identity to a JSON key file, creating parent directories.
///
/// # Errors
/// `Identity` if the file cannot be written.
pub async fn save(identity: &SigningKeyPair, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let io_err = |e: std::io::Error| NodeError::identity(&path_str, e.to_string());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let key_data = KeyFile {
        version: FILE_VERSION.to_string(),
        key_type: KEY_TYPE.to_string(),
        public_key: identity.public_key().to_base64(),
        private_key: BASE64.encode(&identity.seed_bytes()[..]),
        created_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
    };

    let content = Zeroizing::new(
        serde_json::to_string_pretty(&key_data)
            .map_err(|e| NodeError::identity(&path_str, e.to_string()))?,
    );
    tokio::fs::write(path, content.as_bytes())
        .await
        .map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = tokio::fs::metadata(path).await.map_err(io_err)?.permissions();
        perms.set_mode(0o600);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(io_err)?;
    }

    info!(public_key = %identity.public_key(), "Saved identity to {}", path_str);
    Ok(())
}

// ============================================
// Tests
// ============================================
