//! Secure messaging sessions and the verifier-quorum reward workflow
//! (§4.5).
//!
//! This crate sits beside `mesh-net` at the top of the stack: it
//! drives `mesh-crypto`'s AEAD/KDF primitives and `mesh-proofs`'
//! kind-specific verifiers to provide per-peer authenticated
//! encryption (replay-guarded) and the multi-verifier approval
//! workflow that gates reward-bearing claims.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod messenger;
pub mod proof_wire;
pub mod quorum;
pub mod replay;

pub use error::SecureError;
pub use messenger::{SecureMessage, SecureMessenger};
pub use proof_wire::ProofWire;
pub use quorum::{
    ApprovalDecision, ClaimState, MintResult, QuorumCoordinator, RewardClaim, VerifiedClaim, VerifierApproval,
};
pub use replay::IvReplayGuard;
