//! The reward-ledger boundary (§6): the second I/O surface `NodeDriver`
//! never touches directly. A concrete sink (an on-chain minting
//! client, or a recording stub for tests) implements [`RewardSink`].
//!
//! Per §6: "Emits `VerifiedClaim` ... when the quorum condition holds;
//! consumes `MintResult` ... to transition the claim to `Finalized`."
//! The emit direction is this trait; the consume direction is a
//! [`mesh_secure::MintResult`] fed back into
//! [`crate::driver::NodeDriver::confirm_mint`] by whatever watches the
//! sink for confirmations — on-chain submission and ledger bookkeeping
//! themselves are out of scope here.

use std::future::Future;

use mesh_secure::VerifiedClaim;

/// External reward-ledger boundary (§6).
pub trait RewardSink: Send + Sync + 'static {
    /// Hand a newly-verified claim to the ledger for minting.
    fn emit_verified_claim(&self, claim: VerifiedClaim) -> impl Future<Output = ()> + Send;
}

/// A sink that only logs emitted claims, for nodes run without a
/// configured ledger backend (development, or a verifier-only role
/// that never originates claims).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRewardSink;

impl RewardSink for LoggingRewardSink {
    async fn emit_verified_claim(&self, claim: VerifiedClaim) {
        tracing::info!(
            claim_id = %claim.claim_id,
            claimant = %claim.claimant,
            tokens = claim.tokens,
            "verified claim ready for minting (no ledger sink configured)"
        );
    }
}
