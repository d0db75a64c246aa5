//! Shared error taxonomy for the meshcore node (§7).
//!
//! Every crate above `mesh-core` converts its local errors into
//! [`MeshError`] at its public boundary. Receive-path errors are
//! swallowed and logged by callers; this enum only names the kinds
//! that need to flow across a crate boundary.

use thiserror::Error;

/// Errors surfaced by the meshcore core (§7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Radio failure, oversized frame, or empty receive buffer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Frame too short, field-width violation, JSON parse failure, or
    /// hex-width violation.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Checksum mismatch after FEC repair, or AEAD tag mismatch.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// Duplicate IV under a session key, or duplicate `(orig, rreq_id)`.
    #[error("replay detected: {0}")]
    Replay(String),

    /// Rate-limit denial.
    #[error("rate limited: {key}")]
    Limited {
        /// The rate-limiter key that denied admission.
        key: String,
    },

    /// No route to destination after timeout, or an unreachable
    /// destination reported upstream.
    #[error("routing error: {0}")]
    Routing(String),

    /// Commitment expired, claim out of range, chain break, ring-size
    /// out of range, or structural width mismatch.
    #[error("proof error: {0}")]
    Proof(String),

    /// Insufficient approvals within the decision window, or the
    /// claim is already finalized.
    #[error("quorum error: {0}")]
    Quorum(String),
}

impl MeshError {
    /// True for errors that a caller may reasonably retry (transport
    /// hiccups, rate limiting). Protocol and integrity violations are
    /// never transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Limited { .. })
    }
}

impl From<mesh_proto::ProtocolError> for MeshError {
    fn from(err: mesh_proto::ProtocolError) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_limited_are_transient() {
        assert!(MeshError::Transport("radio busy".into()).is_transient());
        assert!(MeshError::Limited { key: "peer:abc".into() }.is_transient());
    }

    #[test]
    fn integrity_and_replay_are_not_transient() {
        assert!(!MeshError::Integrity("tag mismatch".into()).is_transient());
        assert!(!MeshError::Replay("duplicate iv".into()).is_transient());
        assert!(!MeshError::Proof("commitment expired".into()).is_transient());
        assert!(!MeshError::Quorum("already finalized".into()).is_transient());
    }

    #[test]
    fn protocol_error_converts_to_malformed() {
        let proto_err = mesh_proto::ProtocolError::UnknownKind(0xFF);
        let mesh_err: MeshError = proto_err.into();
        assert!(matches!(mesh_err, MeshError::Malformed(_)));
    }
}
