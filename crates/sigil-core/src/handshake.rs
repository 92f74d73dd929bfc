// ============================================
// File: crates/sigil-core/src/handshake.rs
// ============================================
//! # Handshake Orchestrator
//!
//! ## Creation Reason
//! Drives the authenticated key exchange as an explicit state machine so
//! that no session can exist before the peer's signature has been checked.
//! The machine does no IO; `sigil-node` moves the messages.
//!
//! ## Handshake Flow
//! ```text
//! Peer A                                          Peer B
//!   │  generate_keys()                 generate_keys()  │
//!   │  create_message()               create_message()  │
//!   │                                                   │
//!   │  HandshakeMessage ──────────────────────────────► │
//!   │  ◄────────────────────────────── HandshakeMessage │
//!   │                                                   │
//!   │  receive_message(msg, pinned B)                   │
//!   │                    receive_message(msg, pinned A) │
//!   │  establish()                         establish()  │
//!   │                                                   │
//!   │ ═══════════════ Session (Ascon-128) ═════════════ │
//! ```
//!
//! ## States
//! ```text
//! Init ─► KeysGenerated ─► ExchangeSent ─► PeerReceived ─► Verified ─► SessionEstablished
//!                                                │             │
//!                                                ▼             ▼
//!                                 Failed(InvalidSignature)  Failed(InvalidPeerKey)
//!
//! abort()          : any live state ─► Failed(Aborted)
//! fail_malformed() : any live state ─► Failed(Malformed)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Entering `Failed` drops every key the machine holds
//! - A call in the wrong state is an error and leaves the state unchanged
//! - The exchange is only computed after the signature verified
//!
//! ## Last Modified
//! v0.1.0 - Initial state machine

use std::fmt;
use std::sync::Arc;

use sigil_common::Role;
use tracing::{debug, info, warn};

use crate::crypto::kdf::derive_session_key;
use crate::crypto::{
    ExchangeKeyPair, ExchangePublicKey, SigningKeyPair, SigningPublicKey, HANDSHAKE_INFO,
    X448_PUBLIC_KEY_SIZE,
};
use crate::error::{CoreError, Result};
use crate::protocol::{HandshakeMessage, PeerIdentity};
use crate::session::{Session, SessionOptions};

// ============================================
// States
// ============================================

/// Why a handshake ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Peer exchange key was of low order or produced a zero secret.
    InvalidPeerKey,
    /// Peer signature did not verify against the pinned key.
    InvalidSignature,
    /// Peer message could not be decoded.
    Malformed,
    /// Transport closed, timed out, or the caller gave up.
    Aborted,
}

impl FailureReason {
    /// Error reported to callers for this failure.
    #[must_use]
    pub fn to_error(self) -> CoreError {
        match self {
            Self::InvalidPeerKey => CoreError::InvalidPeerKey,
            Self::InvalidSignature => CoreError::InvalidSignature,
            Self::Malformed => CoreError::malformed("handshake message"),
            Self::Aborted => CoreError::Aborted,
        }
    }
}

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing generated yet.
    Init,
    /// Exchange (and possibly signing) keys exist.
    KeysGenerated,
    /// Our message was produced.
    ExchangeSent,
    /// Peer message accepted for checking.
    PeerReceived,
    /// Peer signature verified.
    Verified,
    /// Session handed out; terminal.
    SessionEstablished,
    /// Terminal failure; all key material dropped.
    Failed(FailureReason),
}

impl HandshakeState {
    /// Returns `true` for `SessionEstablished` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionEstablished | Self::Failed(_))
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("Init"),
            Self::KeysGenerated => f.write_str("KeysGenerated"),
            Self::ExchangeSent => f.write_str("ExchangeSent"),
            Self::PeerReceived => f.write_str("PeerReceived"),
            Self::Verified => f.write_str("Verified"),
            Self::SessionEstablished => f.write_str("SessionEstablished"),
            Self::Failed(reason) => write!(f, "Failed({reason:?})"),
        }
    }
}

// ============================================
// Handshake
// ============================================

/// One side of a handshake.
pub struct Handshake {
    role: Role,
    state: HandshakeState,
    identity: Option<Arc<SigningKeyPair>>,
    exchange: Option<ExchangeKeyPair>,
    peer_exchange: Option<[u8; X448_PUBLIC_KEY_SIZE]>,
    peer_signing: Option<SigningPublicKey>,
    peer: Option<PeerIdentity>,
}

impl Handshake {
    /// Starts a handshake that will sign with a fresh, throwaway identity.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: HandshakeState::Init,
            identity: None,
            exchange: None,
            peer_exchange: None,
            peer_signing: None,
            peer: None,
        }
    }

    /// Starts a handshake that signs with a long-term identity.
    #[must_use]
    pub fn with_identity(role: Role, identity: Arc<SigningKeyPair>) -> Self {
        let mut handshake = Self::new(role);
        handshake.identity = Some(identity);
        handshake
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Role of this side.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Our signing public key, once keys exist.
    #[must_use]
    pub fn signing_public(&self) -> Option<SigningPublicKey> {
        self.identity.as_ref().map(|id| id.public_key())
    }

    /// The verified peer, available after `establish`.
    #[must_use]
    pub const fn peer_identity(&self) -> Option<&PeerIdentity> {
        self.peer.as_ref()
    }

    fn require(&self, expected: HandshakeState, operation: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::invalid_state(
                format!("{operation} (current {})", self.state),
                expected.to_string(),
            ))
        }
    }

    fn transition(&mut self, next: HandshakeState) {
        debug!(role = %self.role, from = %self.state, to = %next, "Handshake transition");
        self.state = next;
    }

    fn fail(&mut self, reason: FailureReason) -> CoreError {
        warn!(role = %self.role, from = %self.state, ?reason, "Handshake failed");
        self.state = HandshakeState::Failed(reason);
        self.exchange = None;
        self.peer_exchange = None;
        self.peer_signing = None;
        self.peer = None;
        reason.to_error()
    }

    /// Generates the ephemeral exchange key, and a signing key if none was
    /// supplied.
    ///
    /// # Errors
    /// `InvalidState` unless in `Init`; `KeyGeneration` on RNG failure.
    pub fn generate_keys(&mut self) -> Result<()> {
        self.require(HandshakeState::Init, "generate_keys")?;

        self.exchange = Some(ExchangeKeyPair::generate()?);
        if self.identity.is_none() {
            self.identity = Some(Arc::new(SigningKeyPair::generate()));
        }

        self.transition(HandshakeState::KeysGenerated);
        Ok(())
    }

    /// Signs our exchange public key and returns the message to send.
    ///
    /// # Errors
    /// `InvalidState` unless in `KeysGenerated`.
    pub fn create_message(&mut self) -> Result<HandshakeMessage> {
        self.require(HandshakeState::KeysGenerated, "create_message")?;

        let (Some(exchange), Some(identity)) = (&self.exchange, &self.identity) else {
            return Err(CoreError::invalid_state("create_message", "keys present"));
        };

        let exchange_public = *exchange.public_key().as_bytes();
        let signature = identity.sign(&exchange_public);

        self.transition(HandshakeState::ExchangeSent);
        Ok(HandshakeMessage::new(exchange_public, signature))
    }

    /// Checks the peer's message against its pinned signing key.
    ///
    /// On a bad signature the handshake fails and no exchange is computed.
    ///
    /// # Errors
    /// - `InvalidState` unless in `ExchangeSent`
    /// - `InvalidSignature` if verification fails
    pub fn receive_message(
        &mut self,
        msg: &HandshakeMessage,
        peer_signing_public: &SigningPublicKey,
    ) -> Result<()> {
        self.require(HandshakeState::ExchangeSent, "receive_message")?;
        self.transition(HandshakeState::PeerReceived);

        if peer_signing_public
            .verify(msg.signed_content(), &msg.signature)
            .is_err()
        {
            return Err(self.fail(FailureReason::InvalidSignature));
        }

        self.peer_exchange = Some(msg.exchange_public);
        self.peer_signing = Some(*peer_signing_public);
        self.transition(HandshakeState::Verified);
        Ok(())
    }

    /// Computes the shared secret, derives the session key and hands out
    /// the session.
    ///
    /// # Errors
    /// - `InvalidState` unless in `Verified`
    /// - `InvalidPeerKey` for a low-order peer key
    pub fn establish(&mut self, options: &SessionOptions) -> Result<Session> {
        self.require(HandshakeState::Verified, "establish")?;

        let (Some(exchange), Some(peer_bytes), Some(peer_signing)) = (
            self.exchange.take(),
            self.peer_exchange.take(),
            self.peer_signing.take(),
        ) else {
            return Err(self.fail(FailureReason::Aborted));
        };

        let Ok(peer_exchange) = ExchangePublicKey::from_bytes(&peer_bytes) else {
            return Err(self.fail(FailureReason::InvalidPeerKey));
        };
        let Ok(shared) = exchange.exchange(&peer_exchange) else {
            return Err(self.fail(FailureReason::InvalidPeerKey));
        };

        let key = match derive_session_key(&shared, HANDSHAKE_INFO) {
            Ok(key) => key,
            Err(e) => {
                // Exchange key is consumed; nothing to retry with.
                self.fail(FailureReason::Aborted);
                return Err(e);
            }
        };

        self.peer = Some(PeerIdentity {
            exchange_public: peer_exchange,
            signing_public: peer_signing,
        });
        self.transition(HandshakeState::SessionEstablished);

        let session = Session::new(key, self.role, options);
        info!(
            role = %self.role,
            session_id = %session.id(),
            peer = %peer_signing,
            "Handshake complete"
        );
        Ok(session)
    }

    /// Gives up on the handshake. No effect once terminal.
    pub fn abort(&mut self) {
        if !self.state.is_terminal() {
            self.fail(FailureReason::Aborted);
        }
    }

    /// Records that the peer's message could not be decoded. No effect once
    /// terminal.
    pub fn fail_malformed(&mut self) {
        if !self.state.is_terminal() {
            self.fail(FailureReason::Malformed);
        }
    }
}

impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("identity", &self.signing_public())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        a: Handshake,
        b: Handshake,
        a_pub: SigningPublicKey,
        b_pub: SigningPublicKey,
    }

    fn identities() -> Pair {
        let a_id = Arc::new(SigningKeyPair::generate());
        let b_id = Arc::new(SigningKeyPair::generate());
        Pair {
            a_pub: a_id.public_key(),
            b_pub: b_id.public_key(),
            a: Handshake::with_identity(Role::Initiator, a_id),
            b: Handshake::with_identity(Role::Responder, b_id),
        }
    }

    fn exchange_messages(p: &mut Pair) -> (HandshakeMessage, HandshakeMessage) {
        p.a.generate_keys().unwrap();
        p.b.generate_keys().unwrap();
        (p.a.create_message().unwrap(), p.b.create_message().unwrap())
    }

    #[test]
    fn test_honest_handshake() {
        let mut p = identities();
        let (msg_a, msg_b) = exchange_messages(&mut p);

        p.a.receive_message(&msg_b, &p.b_pub).unwrap();
        p.b.receive_message(&msg_a, &p.a_pub).unwrap();
        assert_eq!(p.a.state(), HandshakeState::Verified);

        let options = SessionOptions::default();
        let mut sa = p.a.establish(&options).unwrap();
        let mut sb = p.b.establish(&options).unwrap();

        assert_eq!(p.a.state(), HandshakeState::SessionEstablished);
        assert_eq!(p.b.state(), HandshakeState::SessionEstablished);
        assert_eq!(p.a.peer_identity().unwrap().signing_public, p.b_pub);

        // Identical keys: each side decrypts what the other sent.
        let c = sa.send(b"hello", b"").unwrap();
        assert_eq!(sb.receive(&c, b"").unwrap(), b"hello");
        let c = sb.send(b"world", b"").unwrap();
        assert_eq!(sa.receive(&c, b"").unwrap(), b"world");
    }

    #[test]
    fn test_throwaway_identity() {
        let mut a = Handshake::new(Role::Initiator);
        let mut b = Handshake::new(Role::Responder);
        assert!(a.signing_public().is_none());

        a.generate_keys().unwrap();
        b.generate_keys().unwrap();
        let a_pub = a.signing_public().unwrap();
        let b_pub = b.signing_public().unwrap();

        let msg_a = a.create_message().unwrap();
        let msg_b = b.create_message().unwrap();
        a.receive_message(&msg_b, &b_pub).unwrap();
        b.receive_message(&msg_a, &a_pub).unwrap();

        assert!(a.establish(&SessionOptions::default()).is_ok());
        assert!(b.establish(&SessionOptions::default()).is_ok());
    }

    #[test]
    fn test_forged_signature() {
        let mut p = identities();
        let (_, mut msg_b) = exchange_messages(&mut p);
        msg_b.signature[0] ^= 0x01;

        let err = p.a.receive_message(&msg_b, &p.b_pub).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSignature));
        assert_eq!(
            p.a.state(),
            HandshakeState::Failed(FailureReason::InvalidSignature)
        );
        assert!(p.a.exchange.is_none());

        let err = p.a.establish(&SessionOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[test]
    fn test_wrong_pinned_key() {
        let mut p = identities();
        let (_, msg_b) = exchange_messages(&mut p);
        let stranger = SigningKeyPair::generate().public_key();

        assert!(p.a.receive_message(&msg_b, &stranger).is_err());
        assert_eq!(
            p.a.state(),
            HandshakeState::Failed(FailureReason::InvalidSignature)
        );
    }

    #[test]
    fn test_low_order_peer_key() {
        let mut p = identities();
        p.a.generate_keys().unwrap();
        p.a.create_message().unwrap();

        // Properly signed, but the exchange key is the identity point.
        let b_id = SigningKeyPair::generate();
        let zero = [0u8; X448_PUBLIC_KEY_SIZE];
        let msg = HandshakeMessage::new(zero, b_id.sign(&zero));

        p.a.receive_message(&msg, &b_id.public_key()).unwrap();
        let err = p.a.establish(&SessionOptions::default()).unwrap_err();

        assert!(matches!(err, CoreError::InvalidPeerKey));
        assert_eq!(
            p.a.state(),
            HandshakeState::Failed(FailureReason::InvalidPeerKey)
        );
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut h = Handshake::new(Role::Initiator);

        assert!(matches!(
            h.create_message(),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(h.establish(&SessionOptions::default()).is_err());
        assert_eq!(h.state(), HandshakeState::Init);

        h.generate_keys().unwrap();
        assert!(h.generate_keys().is_err());
        assert_eq!(h.state(), HandshakeState::KeysGenerated);
    }

    #[test]
    fn test_abort() {
        let mut p = identities();
        exchange_messages(&mut p);

        p.a.abort();
        assert_eq!(p.a.state(), HandshakeState::Failed(FailureReason::Aborted));
        assert!(p.a.exchange.is_none());

        // Terminal states are sticky.
        p.a.fail_malformed();
        assert_eq!(p.a.state(), HandshakeState::Failed(FailureReason::Aborted));
    }

    #[test]
    fn test_fail_malformed() {
        let mut h = Handshake::new(Role::Responder);
        h.generate_keys().unwrap();
        h.fail_malformed();
        assert_eq!(h.state(), HandshakeState::Failed(FailureReason::Malformed));
    }

    #[test]
    fn test_abort_after_establish_is_noop() {
        let mut p = identities();
        let (msg_a, msg_b) = exchange_messages(&mut p);
        p.a.receive_message(&msg_b, &p.b_pub).unwrap();
        p.b.receive_message(&msg_a, &p.a_pub).unwrap();
        p.a.establish(&SessionOptions::default()).unwrap();

        p.a.abort();
        assert_eq!(p.a.state(), HandshakeState::SessionEstablished);
    }
}
