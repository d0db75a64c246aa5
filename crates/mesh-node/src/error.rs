//! Node-level error taxonomy (§7).
//!
//! Wraps the lower crates' errors for the handful of call paths that
//! surface to a caller rather than being swallowed and logged (§7:
//! "malformed incoming frames never terminate the node" — so
//! `NodeDriver::handle_received_frame` never returns this type).

use thiserror::Error;

/// A [`crate::radio::RadioAdapter`] transmit or receive failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// The adapter could not hand the frame to the radio.
    #[error("radio transmit failed: {0}")]
    TransmitFailed(String),

    /// The adapter's receive buffer is empty or the hardware is down.
    #[error("radio receive failed: {0}")]
    ReceiveFailed(String),
}

/// Errors surfaced by caller-initiated [`crate::driver::NodeDriver`]
/// operations (discovery, announce, send, reward submission).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The mesh routing engine rejected the request.
    #[error(transparent)]
    Router(#[from] mesh_net::RouterError),

    /// Secure messaging or the verifier quorum rejected the request.
    #[error(transparent)]
    Secure(#[from] mesh_secure::SecureError),

    /// The radio adapter failed.
    #[error(transparent)]
    Radio(#[from] RadioError),

    /// A frame could not be encoded for transmission.
    #[error(transparent)]
    Protocol(#[from] mesh_proto::ProtocolError),

    /// A reward-workflow wire payload could not be parsed.
    #[error("malformed reward payload: {0}")]
    MalformedRewardPayload(String),
}

impl From<NodeError> for mesh_core::MeshError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Router(e) => e.into(),
            NodeError::Secure(e) => e.into(),
            NodeError::Radio(e) => Self::Transport(e.to_string()),
            NodeError::Protocol(e) => e.into(),
            NodeError::MalformedRewardPayload(msg) => Self::Malformed(msg),
        }
    }
}
