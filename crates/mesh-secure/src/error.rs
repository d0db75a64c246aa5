//! Errors surfaced by secure sessions and the verifier quorum (§7).

use thiserror::Error;

/// Errors from secure messaging and the verifier-quorum workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecureError {
    /// `decrypt` was called for a peer with no established session.
    #[error("no session with {peer_id}")]
    NoSession {
        /// The peer the message claimed to be from.
        peer_id: String,
    },

    /// The message's IV has already been consumed under this session.
    #[error("replayed iv under session with {peer_id}")]
    ReplayedIv {
        /// The peer whose session saw the replay.
        peer_id: String,
    },

    /// GCM tag verification failed.
    #[error("AEAD authentication failed")]
    AuthenticationFailed,

    /// An attached proof failed §4.4 verification.
    #[error("proof rejected: {0}")]
    ProofRejected(String),

    /// A reward-bearing claim or proof was submitted by an
    /// unauthenticated peer.
    #[error("peer {peer_id} is not authenticated")]
    Unauthenticated {
        /// The peer that attempted the reward-gated action.
        peer_id: String,
    },

    /// A claim id referenced an unknown claim.
    #[error("unknown claim {claim_id}")]
    UnknownClaim {
        /// The unrecognized claim id.
        claim_id: String,
    },

    /// Re-submission or approval of an already-finalized claim.
    #[error("claim {claim_id} is already finalized")]
    AlreadyFinalized {
        /// The finalized claim id.
        claim_id: String,
    },

    /// A mint confirmation arrived for a claim not in `Approved` state.
    #[error("claim {claim_id} is not approved")]
    ClaimNotApproved {
        /// The claim id that was not ready to finalize.
        claim_id: String,
    },
}

impl From<SecureError> for mesh_core::MeshError {
    fn from(err: SecureError) -> Self {
        match err {
            SecureError::NoSession { .. } => Self::Integrity(err.to_string()),
            SecureError::ReplayedIv { .. } => Self::Replay(err.to_string()),
            SecureError::AuthenticationFailed => Self::Integrity(err.to_string()),
            SecureError::ProofRejected(_) => Self::Proof(err.to_string()),
            SecureError::Unauthenticated { .. } => Self::Quorum(err.to_string()),
            SecureError::UnknownClaim { .. } => Self::Quorum(err.to_string()),
            SecureError::AlreadyFinalized { .. } => Self::Quorum(err.to_string()),
            SecureError::ClaimNotApproved { .. } => Self::Quorum(err.to_string()),
        }
    }
}
