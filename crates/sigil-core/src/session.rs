// ============================================
// File: crates/sigil-core/src/session.rs
// ============================================
//! # Nonce-Counter Session
//!
//! ## Creation Reason
//! Turns the session key from a completed handshake into a message
//! protocol: every message gets a fresh nonce derived from a monotonic
//! counter, so no nonce is ever transmitted.
//!
//! ## Main Functionality
//! - `NonceCounter`: seed + counter for one traffic direction
//! - `NonceSeed`: where the base seed comes from
//! - `Session`: `send` / `receive` over Ascon-128
//! - `SharedSession`: mutex-guarded handle for fan-out
//!
//! ## Nonce Schedule
//! ```text
//! base_seed  = session_key[16..32]        (NonceSeed::Derived)
//!            | configured bytes           (NonceSeed::Explicit)
//!
//! initiator → responder : seed = base_seed ‖ "initiator"
//! responder → initiator : seed = base_seed ‖ "responder"
//!
//! nonce_n = Ascon-XOF(seed ‖ n.to_be_bytes(), 16),  n = 0, 1, 2, ...
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A counter value is consumed even when decryption then fails; the
//!   peers are out of step after that and the session should be dropped
//! - `u64::MAX` is never used; reaching it exhausts the direction for good
//! - Counters are never reset. Re-keying means a fresh handshake.
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sigil_common::{Role, SessionId};
use tracing::{debug, trace, warn};

use crate::crypto::aead::{AeadCipher, AsconCipher};
use crate::crypto::hash::derive_nonce;
use crate::crypto::{SessionKey, ASCON_NONCE_SIZE};
use crate::error::{CoreError, Result};

/// Session handle shared between tasks.
pub type SharedSession = Arc<Mutex<Session>>;

// ============================================
// NonceSeed
// ============================================

/// Source of the base nonce seed.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum NonceSeed {
    /// Use the second half of the session key.
    #[default]
    Derived,
    /// Use bytes both peers were configured with.
    Explicit(Vec<u8>),
}

impl fmt::Debug for NonceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derived => f.write_str("Derived"),
            Self::Explicit(bytes) => write!(f, "Explicit({} bytes)", bytes.len()),
        }
    }
}

// ============================================
// SessionOptions
// ============================================

/// Parameters fixed when a session is established.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Base nonce seed.
    pub nonce_seed: NonceSeed,
}

impl SessionOptions {
    /// Options using an explicit nonce seed.
    #[must_use]
    pub fn with_seed(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            nonce_seed: NonceSeed::Explicit(seed.into()),
        }
    }
}

// ============================================
// NonceCounter
// ============================================

/// Nonce state for one traffic direction.
pub struct NonceCounter {
    seed: Vec<u8>,
    /// Next counter value; `None` once exhausted.
    next: Option<u64>,
}

impl NonceCounter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub fn new(seed: Vec<u8>) -> Self {
        Self {
            seed,
            next: Some(0),
        }
    }

    /// Returns the nonce for the current counter value and advances.
    ///
    /// # Errors
    /// `CounterExhausted` if the counter cannot be incremented; no nonce is
    /// produced and every later call fails the same way.
    pub fn advance(&mut self) -> Result<[u8; ASCON_NONCE_SIZE]> {
        let current = self.next.ok_or(CoreError::CounterExhausted)?;
        let Some(following) = current.checked_add(1) else {
            self.next = None;
            return Err(CoreError::CounterExhausted);
        };
        self.next = Some(following);
        Ok(derive_nonce(&self.seed, current))
    }

    /// Number of nonces handed out so far.
    #[must_use]
    pub const fn used(&self) -> u64 {
        match self.next {
            Some(n) => n,
            None => u64::MAX,
        }
    }

    /// Returns `true` once the direction can no longer be used.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

impl fmt::Debug for NonceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceCounter")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

// ============================================
// Session
// ============================================

/// Established secure session.
///
/// # Example
/// ```
/// use sigil_common::Role;
/// use sigil_core::crypto::SessionKey;
/// use sigil_core::session::{Session, SessionOptions};
///
/// let options = SessionOptions::default();
/// let mut alice = Session::new(SessionKey::from_bytes([7; 32]), Role::Initiator, &options);
/// let mut bob = Session::new(SessionKey::from_bytes([7; 32]), Role::Responder, &options);
///
/// let ciphertext = alice.send(b"hello", b"").unwrap();
/// assert_eq!(bob.receive(&ciphertext, b"").unwrap(), b"hello");
/// ```
pub struct Session {
    id: SessionId,
    role: Role,
    key: SessionKey,
    outbound: NonceCounter,
    inbound: NonceCounter,
}

impl Session {
    /// Builds a session from a derived key.
    #[must_use]
    pub fn new(key: SessionKey, role: Role, options: &SessionOptions) -> Self {
        let base_seed = match &options.nonce_seed {
            NonceSeed::Derived => key.nonce_seed().to_vec(),
            NonceSeed::Explicit(bytes) => bytes.clone(),
        };

        let directional = |sender: Role| {
            let mut seed = base_seed.clone();
            seed.extend_from_slice(sender.label());
            seed
        };

        let id = SessionId::generate();
        debug!(session_id = %id, %role, seed = ?options.nonce_seed, "Session created");

        Self {
            id,
            role,
            outbound: NonceCounter::new(directional(role)),
            inbound: NonceCounter::new(directional(role.peer())),
            key,
        }
    }

    /// Local identifier used in logs.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Role this side played in the handshake.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Messages sent so far.
    #[must_use]
    pub const fn messages_sent(&self) -> u64 {
        self.outbound.used()
    }

    /// Messages received (or attempted) so far.
    #[must_use]
    pub const fn messages_received(&self) -> u64 {
        self.inbound.used()
    }

    /// Encrypts a message for the peer.
    ///
    /// # Errors
    /// - `CounterExhausted`: outbound direction is used up
    /// - `Encryption`: AEAD backend failure
    pub fn send(&mut self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let counter = self.outbound.used();
        let nonce = self.outbound.advance().map_err(|e| {
            warn!(session_id = %self.id, "Outbound nonce counter exhausted");
            e
        })?;

        let ciphertext = AsconCipher::new(self.key.cipher_key()).encrypt(
            &nonce,
            associated_data,
            plaintext,
        )?;

        trace!(
            session_id = %self.id,
            counter,
            len = ciphertext.len(),
            "Encrypted message"
        );
        Ok(ciphertext)
    }

    /// Decrypts a message from the peer.
    ///
    /// # Errors
    /// - `CounterExhausted`: inbound direction is used up
    /// - `AuthFailure`: tampered data, wrong key/seed, or counters out of step
    pub fn receive(&mut self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let counter = self.inbound.used();
        let nonce = self.inbound.advance().map_err(|e| {
            warn!(session_id = %self.id, "Inbound nonce counter exhausted");
            e
        })?;

        let plaintext = AsconCipher::new(self.key.cipher_key())
            .decrypt(&nonce, associated_data, ciphertext)
            .map_err(|e| {
                warn!(session_id = %self.id, counter, "Message failed authentication");
                e
            })?;

        trace!(session_id = %self.id, counter, len = plaintext.len(), "Decrypted message");
        Ok(plaintext)
    }

    /// Wraps the session for shared use.
    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("outbound", &self.outbound)
            .field("inbound", &self.inbound)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn pair(options: &SessionOptions) -> (Session, Session) {
        let a = Session::new(SessionKey::from_bytes([0x11; 32]), Role::Initiator, options);
        let b = Session::new(SessionKey::from_bytes([0x11; 32]), Role::Responder, options);
        (a, b)
    }

    #[test]
    fn test_hello_scenario() {
        let (mut alice, mut bob) = pair(&SessionOptions::default());

        let ciphertext = alice.send(b"hello", b"").unwrap();
        assert_eq!(ciphertext.len(), 5 + 16);
        assert_eq!(bob.receive(&ciphertext, b"").unwrap(), b"hello");
    }

    #[test]
    fn test_bidirectional_traffic() {
        let (mut alice, mut bob) = pair(&SessionOptions::default());

        for i in 0..5u8 {
            let c = alice.send(&[i], b"ad").unwrap();
            assert_eq!(bob.receive(&c, b"ad").unwrap(), vec![i]);

            let c = bob.send(&[i, i], b"ad").unwrap();
            assert_eq!(alice.receive(&c, b"ad").unwrap(), vec![i, i]);
        }

        assert_eq!(alice.messages_sent(), 5);
        assert_eq!(alice.messages_received(), 5);
    }

    #[test]
    fn test_directions_use_distinct_nonces() {
        let (mut alice, mut bob) = pair(&SessionOptions::default());

        // Same plaintext at the same counter must not encrypt identically.
        let from_alice = alice.send(b"same", b"").unwrap();
        let from_bob = bob.send(b"same", b"").unwrap();
        assert_ne!(from_alice, from_bob);
    }

    #[test]
    fn test_explicit_seed_must_match() {
        let mut alice = Session::new(
            SessionKey::from_bytes([0x11; 32]),
            Role::Initiator,
            &SessionOptions::with_seed(b"alpha".to_vec()),
        );
        let mut bob = Session::new(
            SessionKey::from_bytes([0x11; 32]),
            Role::Responder,
            &SessionOptions::with_seed(b"beta".to_vec()),
        );

        let c = alice.send(b"hello", b"").unwrap();
        assert!(matches!(bob.receive(&c, b""), Err(CoreError::AuthFailure)));
    }

    #[test]
    fn test_explicit_seed_roundtrip() {
        let (mut alice, mut bob) = pair(&SessionOptions::with_seed(b"shared seed".to_vec()));
        let c = alice.send(b"hello", b"").unwrap();
        assert_eq!(bob.receive(&c, b"").unwrap(), b"hello");
    }

    #[test]
    fn test_counter_mismatch_fails() {
        let (mut alice, mut bob) = pair(&SessionOptions::default());

        let _lost = alice.send(b"first", b"").unwrap();
        let second = alice.send(b"second", b"").unwrap();
        assert!(matches!(bob.receive(&second, b""), Err(CoreError::AuthFailure)));
    }

    #[test]
    fn test_failed_receive_consumes_counter() {
        let (mut alice, mut bob) = pair(&SessionOptions::default());

        let c = alice.send(b"hello", b"").unwrap();
        let mut tampered = c.clone();
        tampered[0] ^= 1;

        assert!(bob.receive(&tampered, b"").is_err());
        assert_eq!(bob.messages_received(), 1);
        // The genuine message now arrives one counter late.
        assert!(bob.receive(&c, b"").is_err());
    }

    #[test]
    fn test_counter_exhaustion() {
        let (mut alice, _) = pair(&SessionOptions::default());
        alice.outbound.next = Some(u64::MAX - 1);

        assert!(alice.send(b"last", b"").is_ok());
        assert!(matches!(
            alice.send(b"too many", b""),
            Err(CoreError::CounterExhausted)
        ));
        assert!(alice.outbound.is_exhausted());
        assert!(matches!(alice.send(b"again", b""), Err(CoreError::CounterExhausted)));
    }

    #[test]
    fn test_nonce_counter_sequence_unique() {
        let mut counter = NonceCounter::new(b"seed".to_vec());
        let nonces: HashSet<_> = (0..1000).map(|_| counter.advance().unwrap()).collect();
        assert_eq!(nonces.len(), 1000);
        assert_eq!(counter.used(), 1000);
    }

    #[test]
    fn test_first_nonce_uses_counter_zero() {
        let mut counter = NonceCounter::new(b"seed".to_vec());
        assert_eq!(counter.advance().unwrap(), derive_nonce(b"seed", 0));
        assert_eq!(counter.advance().unwrap(), derive_nonce(b"seed", 1));
    }

    #[test]
    fn test_shared_session_across_threads() {
        let (alice, _) = pair(&SessionOptions::default());
        let shared = alice.into_shared();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&shared);
                std::thread::spawn(move || s.lock().send(b"x", b"").unwrap())
            })
            .collect();

        let mut ciphertexts: Vec<Vec<u8>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(shared.lock().messages_sent(), 4);

        // Every ciphertext is distinct, so every nonce was distinct.
        ciphertexts.sort();
        ciphertexts.dedup();
        assert_eq!(ciphertexts.len(), 4);
    }

    #[test]
    fn test_debug_has_no_key() {
        let (alice, _) = pair(&SessionOptions::with_seed(b"secret seed".to_vec()));
        let debug = format!("{alice:?}");
        assert!(!debug.contains("key"));
        assert!(!debug.contains("secret seed"));
    }
}
