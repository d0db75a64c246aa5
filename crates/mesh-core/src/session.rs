//! Per-peer secure-session state (§3, §4.5).

use zeroize::Zeroizing;

/// State held per peer for a secure-messaging session.
///
/// Session keys are derived from an ephemeral secret through a
/// labeled KDF salted with `hash(self_id || peer_id)` and 100k
/// iterations (see `mesh_crypto::kdf::derive_session_key`). A session
/// is authenticated iff the peer has submitted a valid uniqueness
/// proof.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The peer this session is with.
    pub peer_id: String,
    /// The derived 32-byte session key, wiped on drop.
    pub session_key: Zeroizing<[u8; 32]>,
    /// Hash of the peer's static secret, for identity continuity
    /// checks across sessions.
    pub peer_static_hash: String,
    /// Number of messages encrypted under this session.
    pub tx_count: u64,
    /// Number of messages successfully decrypted under this session.
    pub rx_count: u64,
    /// Whether the peer has passed uniqueness-proof authentication.
    pub authenticated: bool,
    /// The authentication method used, if any (e.g. `"uniqueness"`).
    pub auth_method: Option<String>,
}

impl SessionContext {
    /// Start a fresh, unauthenticated session with `peer_id`.
    #[must_use]
    pub fn new(peer_id: impl Into<String>, session_key: [u8; 32], peer_static_hash: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            session_key: Zeroizing::new(session_key),
            peer_static_hash: peer_static_hash.into(),
            tx_count: 0,
            rx_count: 0,
            authenticated: false,
            auth_method: None,
        }
    }

    /// Mark this session authenticated via `method`.
    pub fn authenticate(&mut self, method: impl Into<String>) {
        self.authenticated = true;
        self.auth_method = Some(method.into());
    }

    /// Record a successful encrypt.
    pub fn record_encrypt(&mut self) {
        self.tx_count += 1;
    }

    /// Record a successful decrypt.
    pub fn record_decrypt(&mut self) {
        self.rx_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_unauthenticated() {
        let session = SessionContext::new("peer-1", [0u8; 32], "hash");
        assert!(!session.authenticated);
        assert!(session.auth_method.is_none());
    }

    #[test]
    fn authenticate_sets_method_and_flag() {
        let mut session = SessionContext::new("peer-1", [0u8; 32], "hash");
        session.authenticate("uniqueness");
        assert!(session.authenticated);
        assert_eq!(session.auth_method.as_deref(), Some("uniqueness"));
    }

    #[test]
    fn counters_increment_independently() {
        let mut session = SessionContext::new("peer-1", [0u8; 32], "hash");
        session.record_encrypt();
        session.record_encrypt();
        session.record_decrypt();
        assert_eq!(session.tx_count, 2);
        assert_eq!(session.rx_count, 1);
    }
}
