//! Errors surfaced by rate limiting, retransmission, and routing (§7).

use thiserror::Error;

/// Errors from the mesh routing engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A `RouteReply` arrived whose reverse route to `orig` does not
    /// exist; per §4.3 it must be dropped.
    #[error("no reverse route to forward reply toward {orig}")]
    NoReverseRoute {
        /// The originator the reply should have been forwarded toward.
        orig: String,
    },

    /// A control-frame payload failed to deserialize as JSON.
    #[error("malformed control payload: {0}")]
    MalformedPayload(String),

    /// A content announcement's freshness proof failed structural or
    /// chain verification.
    #[error("content announce proof rejected: {0}")]
    InvalidProof(String),

    /// An outbound action was denied by a rate-limit window.
    #[error("rate limited: {key}")]
    RateLimited {
        /// The rate-limit key that denied admission.
        key: String,
    },
}

impl From<RouterError> for mesh_core::MeshError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::NoReverseRoute { .. } => Self::Routing(err.to_string()),
            RouterError::MalformedPayload(_) => Self::Malformed(err.to_string()),
            RouterError::InvalidProof(_) => Self::Proof(err.to_string()),
            RouterError::RateLimited { key } => Self::Limited { key },
        }
    }
}
