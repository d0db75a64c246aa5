//! Secure per-peer sessions: establishment, authentication, and
//! authenticated encryption (§3 `SessionContext`, §4.5).

use std::collections::HashMap;
use std::time::Duration;

use mesh_core::{Environment, SessionContext};
use mesh_crypto::{IV_LEN, SealedMessage, TAG_LEN};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SecureError;
use crate::proof_wire::ProofWire;
use crate::replay::IvReplayGuard;

/// A secure message as carried over the wire: `ciphertext`, `iv`, and
/// `auth_tag` are lowercase hex (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureMessage {
    /// Sending node id.
    pub sender: String,
    /// Receiving node id.
    pub recipient: String,
    /// Application-defined tag for the encrypted payload's shape.
    pub kind_tag: String,
    /// AES-256-GCM ciphertext, hex-encoded (tag excluded).
    pub ciphertext: String,
    /// 96-bit IV, hex-encoded.
    pub iv: String,
    /// 128-bit GCM authentication tag, hex-encoded.
    pub auth_tag: String,
    /// An optional §4.4 proof riding alongside this message (e.g. a
    /// reward claim's supporting proof).
    pub optional_proof: Option<ProofWire>,
    /// Logical send order under this messenger; not a wall-clock
    /// timestamp (see [`SecureMessenger`] docs).
    pub timestamp: u64,
}

/// Per-node secure-messaging state: one [`SessionContext`] and one
/// [`IvReplayGuard`] per peer.
///
/// `timestamp` on outgoing messages is a monotonically increasing
/// logical counter, not a wall-clock value: `Environment::Instant` is
/// generic and has no guaranteed serialization, so stamping a real
/// epoch time is left to the driver layer, which can map
/// `Environment::now()` through its own clock before logging.
#[derive(Debug, Clone)]
pub struct SecureMessenger<I> {
    self_id: String,
    sessions: HashMap<String, SessionContext>,
    replay_guards: HashMap<String, IvReplayGuard<I>>,
    next_timestamp: u64,
}

impl<I: Copy + Ord + std::ops::Sub<I, Output = Duration>> SecureMessenger<I> {
    /// Construct an empty messenger for `self_id`.
    #[must_use]
    pub fn new(self_id: impl Into<String>) -> Self {
        Self { self_id: self_id.into(), sessions: HashMap::new(), replay_guards: HashMap::new(), next_timestamp: 0 }
    }

    /// This node's id.
    #[must_use]
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Whether a session with `peer_id` currently exists.
    #[must_use]
    pub fn has_session(&self, peer_id: &str) -> bool {
        self.sessions.contains_key(peer_id)
    }

    /// Whether `peer_id`'s session has passed authentication.
    #[must_use]
    pub fn is_authenticated(&self, peer_id: &str) -> bool {
        self.sessions.get(peer_id).is_some_and(|s| s.authenticated)
    }

    /// A peer's session state, if established.
    #[must_use]
    pub fn session(&self, peer_id: &str) -> Option<&SessionContext> {
        self.sessions.get(peer_id)
    }

    /// Establish (or re-key) a session with `peer_id`, deriving
    /// `session_key` from `ephemeral_secret` through §4.5's labeled
    /// KDF.
    ///
    /// The KDF salts on `sha256(self_id || peer_id)`, which binds the
    /// key to an *ordered* pair (`derive_session_key`'s "peer order
    /// changes the salt" contract) — but both ends of a session must
    /// agree on the same symmetric key, and `SessionContext` has only
    /// one key field, not a pair of per-direction keys. This
    /// implementation canonicalizes the order by sorting the two ids
    /// lexicographically before deriving, so either peer calling
    /// `establish` with the same `ephemeral_secret` converges on the
    /// same `session_key` regardless of who is "self".
    pub fn establish(&mut self, peer_id: &str, ephemeral_secret: &[u8], peer_static_hash: impl Into<String>) -> &SessionContext {
        let (first, second) =
            if self.self_id.as_str() <= peer_id { (self.self_id.as_str(), peer_id) } else { (peer_id, self.self_id.as_str()) };
        let key = mesh_crypto::derive_session_key(ephemeral_secret, first, second);

        self.sessions.insert(peer_id.to_string(), SessionContext::new(peer_id, *key, peer_static_hash));
        self.replay_guards.insert(peer_id.to_string(), IvReplayGuard::with_defaults());
        debug!(peer_id, "session established");

        let Some(session) = self.sessions.get(peer_id) else { unreachable!("session just inserted for {peer_id}") };
        session
    }

    /// Authenticate `peer_id` via a §4.4 uniqueness proof. On success,
    /// marks the session `authenticated` with `auth_method =
    /// "uniqueness"`.
    pub fn authenticate<P>(&mut self, peer_id: &str, proof: &mesh_proofs::UniquenessProof<P>) -> Result<(), SecureError> {
        mesh_proofs::uniqueness::verify(proof).map_err(|e| SecureError::ProofRejected(e.to_string()))?;

        let session =
            self.sessions.get_mut(peer_id).ok_or_else(|| SecureError::NoSession { peer_id: peer_id.to_string() })?;
        session.authenticate("uniqueness");
        Ok(())
    }

    /// Encrypt `payload` for `peer_id` under its established session.
    ///
    /// Draws a fresh IV from `env`, seals with AES-256-GCM, records
    /// the IV against this session's own replay guard (a session must
    /// never reuse an IV under its key, whichever side drew it), and
    /// increments `tx_count`.
    pub fn encrypt<E: Environment<Instant = I>>(
        &mut self,
        env: &E,
        peer_id: &str,
        kind_tag: impl Into<String>,
        payload: &[u8],
        optional_proof: Option<ProofWire>,
    ) -> Result<SecureMessage, SecureError> {
        let session =
            self.sessions.get_mut(peer_id).ok_or_else(|| SecureError::NoSession { peer_id: peer_id.to_string() })?;

        let iv = env.random_12();
        let sealed = mesh_crypto::seal(&session.session_key, iv, payload);
        let (ciphertext, auth_tag) = split_tag(&sealed.ciphertext);

        session.record_encrypt();
        self.replay_guards.entry(peer_id.to_string()).or_insert_with(IvReplayGuard::with_defaults).record(iv, env.now());

        self.next_timestamp = self.next_timestamp.wrapping_add(1);

        Ok(SecureMessage {
            sender: self.self_id.clone(),
            recipient: peer_id.to_string(),
            kind_tag: kind_tag.into(),
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(iv),
            auth_tag: hex::encode(auth_tag),
            optional_proof,
            timestamp: self.next_timestamp,
        })
    }

    /// Decrypt and authenticate `msg`.
    ///
    /// Rejects in order: no session with `msg.sender`, a replayed IV,
    /// a failed GCM tag, and (if `verify_proof` and a proof is
    /// attached) a failed §4.4 check. Increments `rx_count` only on
    /// full success.
    pub fn decrypt(&mut self, msg: &SecureMessage, now: I, verify_proof: bool) -> Result<Vec<u8>, SecureError> {
        if !self.sessions.contains_key(&msg.sender) {
            return Err(SecureError::NoSession { peer_id: msg.sender.clone() });
        }

        let iv = decode_iv(&msg.iv)?;
        let guard = self.replay_guards.entry(msg.sender.clone()).or_insert_with(IvReplayGuard::with_defaults);
        if guard.contains(&iv) {
            warn!(peer_id = %msg.sender, "rejected replayed iv");
            return Err(SecureError::ReplayedIv { peer_id: msg.sender.clone() });
        }

        let ciphertext = hex::decode(&msg.ciphertext).map_err(|_| SecureError::AuthenticationFailed)?;
        let auth_tag = hex::decode(&msg.auth_tag).map_err(|_| SecureError::AuthenticationFailed)?;
        let combined: Vec<u8> = ciphertext.into_iter().chain(auth_tag).collect();

        let Some(session) = self.sessions.get(&msg.sender) else {
            return Err(SecureError::NoSession { peer_id: msg.sender.clone() });
        };
        let plaintext =
            mesh_crypto::open(&session.session_key, &SealedMessage { iv, ciphertext: combined }).map_err(|_| SecureError::AuthenticationFailed)?;

        if verify_proof {
            if let Some(proof) = &msg.optional_proof {
                proof.verify(0).map_err(|e| SecureError::ProofRejected(e.to_string()))?;
            }
        }

        let guard = self.replay_guards.entry(msg.sender.clone()).or_insert_with(IvReplayGuard::with_defaults);
        guard.record(iv, now);

        let Some(session) = self.sessions.get_mut(&msg.sender) else { unreachable!("session checked present above") };
        session.record_decrypt();

        Ok(plaintext)
    }
}

fn split_tag(combined: &[u8]) -> (&[u8], &[u8]) {
    let at = combined.len().saturating_sub(TAG_LEN);
    combined.split_at(at)
}

fn decode_iv(hex_str: &str) -> Result<[u8; IV_LEN], SecureError> {
    let bytes = hex::decode(hex_str).map_err(|_| SecureError::AuthenticationFailed)?;
    let array: [u8; IV_LEN] = bytes.try_into().map_err(|_| SecureError::AuthenticationFailed)?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
        fill: u8,
    }

    impl Environment for FakeEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            self.now
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.fill);
        }
    }

    fn paired_messengers() -> (SecureMessenger<Duration>, SecureMessenger<Duration>) {
        let mut alice: SecureMessenger<Duration> = SecureMessenger::new("alice");
        let mut bob: SecureMessenger<Duration> = SecureMessenger::new("bob");
        let secret = [7u8; 32];
        alice.establish("bob", &secret, "bob-static-hash");
        bob.establish("alice", &secret, "alice-static-hash");
        (alice, bob)
    }

    #[test]
    fn canonicalized_salt_order_yields_matching_session_keys() {
        let (alice, bob) = paired_messengers();
        assert_eq!(alice.session("bob").unwrap().session_key, bob.session("alice").unwrap().session_key);
    }

    #[test]
    fn encrypt_then_decrypt_round_trips_plaintext() {
        let (mut alice, mut bob) = paired_messengers();
        let env = FakeEnv { now: Duration::from_secs(1), fill: 0x11 };
        let msg = alice.encrypt(&env, "bob", "chat", b"hello mesh", None).unwrap();
        let plaintext = bob.decrypt(&msg, Duration::from_secs(2), false).unwrap();
        assert_eq!(plaintext, b"hello mesh");
        assert_eq!(bob.session("alice").unwrap().rx_count, 1);
    }

    #[test]
    fn decrypt_without_session_is_rejected() {
        let mut bob: SecureMessenger<Duration> = SecureMessenger::new("bob");
        let msg = SecureMessage {
            sender: "mallory".into(),
            recipient: "bob".into(),
            kind_tag: "chat".into(),
            ciphertext: "00".into(),
            iv: hex::encode([0u8; IV_LEN]),
            auth_tag: hex::encode([0u8; TAG_LEN]),
            optional_proof: None,
            timestamp: 0,
        };
        assert_eq!(bob.decrypt(&msg, Duration::ZERO, false), Err(SecureError::NoSession { peer_id: "mallory".into() }));
    }

    #[test]
    fn replayed_iv_is_rejected_on_second_decrypt() {
        let (mut alice, mut bob) = paired_messengers();
        let env = FakeEnv { now: Duration::from_secs(1), fill: 0x22 };
        let msg = alice.encrypt(&env, "bob", "chat", b"once only", None).unwrap();
        assert!(bob.decrypt(&msg, Duration::from_secs(2), false).is_ok());
        assert_eq!(
            bob.decrypt(&msg, Duration::from_secs(3), false),
            Err(SecureError::ReplayedIv { peer_id: "alice".into() })
        );
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (mut alice, mut bob) = paired_messengers();
        let env = FakeEnv { now: Duration::from_secs(1), fill: 0x33 };
        let mut msg = alice.encrypt(&env, "bob", "chat", b"integrity matters", None).unwrap();
        msg.ciphertext = "ff".repeat(msg.ciphertext.len() / 2);
        assert_eq!(bob.decrypt(&msg, Duration::from_secs(2), false), Err(SecureError::AuthenticationFailed));
    }

    #[test]
    fn authenticate_sets_session_flag_on_valid_proof() {
        let (mut alice, _bob) = paired_messengers();
        let env = FakeEnv { now: Duration::ZERO, fill: 0x44 };
        let proof = mesh_proofs::uniqueness::generate(&env, "bob", 8);
        assert!(!alice.is_authenticated("bob"));
        alice.authenticate("bob", &proof).unwrap();
        assert!(alice.is_authenticated("bob"));
        assert_eq!(alice.session("bob").unwrap().auth_method.as_deref(), Some("uniqueness"));
    }
}
