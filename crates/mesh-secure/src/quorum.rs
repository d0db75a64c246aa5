//! Verifier-quorum reward-claim workflow (§4.5).
//!
//! A claimant submits a [`RewardClaim`]; a coordinator-selected set of
//! verifiers each independently check its attached proof and return a
//! signed [`VerifierApproval`]. Once enough approvals land, the claim
//! transitions toward [`ClaimState::Approved`] and a [`VerifiedClaim`]
//! event is handed to an external minting/ledger sink; confirmation
//! (a [`MintResult`]) finalizes it.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::SecureError;
use crate::proof_wire::ProofWire;
use mesh_proofs::ProofKind;

/// Default quorum size (`N`).
pub const DEFAULT_QUORUM_SIZE: usize = 4;

/// Default approval threshold (`M`): at least `M` approvals and at
/// least `M` independently-valid proof checks, whichever completes
/// last, before a claim is accepted (§8 scenario S5 resolves the
/// spec's "3 of 4, or at least 2 + 2" wording in favor of this
/// stricter reading).
pub const DEFAULT_APPROVAL_THRESHOLD: usize = 3;

/// Minimum uptime percentage a peer must have last claimed to be
/// eligible to verify.
pub const MIN_ELIGIBLE_UPTIME_PCT: f64 = 90.0;

/// Lifecycle state of a reward claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    /// Awaiting enough verifier approvals or rejections.
    Pending,
    /// Quorum reached; awaiting mint confirmation.
    Approved,
    /// Quorum rejected the claim.
    Rejected,
    /// Mint confirmed; the claim is terminal.
    Finalized,
}

/// A verifier's decision on one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// The verifier accepts the claim.
    Approve,
    /// The verifier rejects the claim.
    Reject,
}

/// One verifier's signed response to a [`RewardClaim`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierApproval {
    /// The verifier that produced this record.
    pub verifier_id: String,
    /// The claim this approval responds to.
    pub claim_id: String,
    /// The verifier's decision.
    pub decision: ApprovalDecision,
    /// Whether the verifier's own §4.4 check of the attached proof
    /// passed.
    pub proof_valid: bool,
    /// Logical send order the approval was signed at.
    pub signed_at: u64,
    /// Opaque signature over `(claim_id, decision, proof_valid)`.
    pub signature: String,
}

/// A claimant's request for reward tokens backed by a §4.4 proof.
#[derive(Debug, Clone)]
pub struct RewardClaim {
    /// Unique id for this claim.
    pub claim_id: String,
    /// The peer claiming tokens.
    pub claimant: String,
    /// Which proof kind backs this claim.
    pub kind: ProofKind,
    /// Hash of the subject the claim is about (content hash, beacon
    /// period digest, etc.).
    pub subject_hash: String,
    /// Tokens requested.
    pub tokens_claimed: u64,
    /// The supporting proof, attached over secure messaging to each
    /// verifier.
    pub proof_payload: ProofWire,
    /// Logical submission order.
    pub submitted_at: u64,
    /// Approvals accumulated so far.
    pub approvals: Vec<VerifierApproval>,
    /// Current lifecycle state.
    pub state: ClaimState,
    /// Mint transaction id, set on finalization.
    pub tx_id: Option<String>,
}

impl RewardClaim {
    /// Start a new `Pending` claim with no approvals.
    #[must_use]
    pub fn new(
        claim_id: impl Into<String>,
        claimant: impl Into<String>,
        kind: ProofKind,
        subject_hash: impl Into<String>,
        tokens_claimed: u64,
        proof_payload: ProofWire,
        submitted_at: u64,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            claimant: claimant.into(),
            kind,
            subject_hash: subject_hash.into(),
            tokens_claimed,
            proof_payload,
            submitted_at,
            approvals: Vec::new(),
            state: ClaimState::Pending,
            tx_id: None,
        }
    }
}

/// Event emitted to an external minting/ledger sink when a claim's
/// quorum condition is first satisfied (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaim {
    /// The approved claim's id.
    pub claim_id: String,
    /// The claimant to credit.
    pub claimant: String,
    /// The proof kind the claim was backed by.
    pub kind: ProofKind,
    /// Tokens to mint.
    pub tokens: u64,
    /// Digest binding the minted event to the exact proof that
    /// justified it.
    pub proof_digest: String,
}

/// Confirmation from the external ledger sink that a [`VerifiedClaim`]
/// minted successfully (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintResult {
    /// The claim this confirms.
    pub claim_id: String,
    /// The minting transaction id.
    pub tx_id: String,
}

/// Coordinates verifier selection and approval accumulation for
/// reward claims.
#[derive(Debug, Clone)]
pub struct QuorumCoordinator {
    quorum_size: usize,
    approval_threshold: usize,
    claims: HashMap<String, RewardClaim>,
}

impl Default for QuorumCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuorumCoordinator {
    /// Construct a coordinator with the default `N=4, M=3` thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_thresholds(DEFAULT_QUORUM_SIZE, DEFAULT_APPROVAL_THRESHOLD)
    }

    /// Construct a coordinator with custom thresholds.
    #[must_use]
    pub fn with_thresholds(quorum_size: usize, approval_threshold: usize) -> Self {
        Self { quorum_size, approval_threshold, claims: HashMap::new() }
    }

    /// Select the eligible verifier set from `candidates` (peer id,
    /// last-claimed uptime percentage): those at or above
    /// [`MIN_ELIGIBLE_UPTIME_PCT`], sorted by uptime descending,
    /// capped at `2 * quorum_size`.
    #[must_use]
    pub fn eligible_verifiers(&self, candidates: &[(String, f64)]) -> Vec<String> {
        let mut eligible: Vec<&(String, f64)> =
            candidates.iter().filter(|(_, uptime_pct)| *uptime_pct >= MIN_ELIGIBLE_UPTIME_PCT).collect();
        eligible.sort_by(|a, b| b.1.total_cmp(&a.1));
        eligible.into_iter().take(2 * self.quorum_size).map(|(peer_id, _)| peer_id.clone()).collect()
    }

    /// Submit (or atomically replace the proof payload of) a claim.
    ///
    /// Rejects re-submission of an already-`Finalized` claim;
    /// `Pending`/`Approved` re-submissions under the same id replace
    /// the stored claim wholesale (the simplest atomic-replace
    /// semantics, since this coordinator holds one claim per id).
    pub fn submit_claim(&mut self, claim: RewardClaim) -> Result<(), SecureError> {
        if let Some(existing) = self.claims.get(&claim.claim_id) {
            if existing.state == ClaimState::Finalized {
                return Err(SecureError::AlreadyFinalized { claim_id: claim.claim_id });
            }
        }
        self.claims.insert(claim.claim_id.clone(), claim);
        Ok(())
    }

    /// Record one verifier's approval, returning `Some(VerifiedClaim)`
    /// the moment the claim transitions to `Approved`.
    pub fn record_approval(&mut self, approval: VerifierApproval) -> Result<Option<VerifiedClaim>, SecureError> {
        let claim = self
            .claims
            .get_mut(&approval.claim_id)
            .ok_or_else(|| SecureError::UnknownClaim { claim_id: approval.claim_id.clone() })?;

        if claim.state == ClaimState::Finalized {
            return Err(SecureError::AlreadyFinalized { claim_id: claim.claim_id.clone() });
        }

        claim.approvals.push(approval);

        if claim.state != ClaimState::Pending {
            return Ok(None);
        }

        let approved = claim.approvals.iter().filter(|a| a.decision == ApprovalDecision::Approve).count();
        let rejected = claim.approvals.iter().filter(|a| a.decision == ApprovalDecision::Reject).count();
        let proof_valid = claim.approvals.iter().filter(|a| a.proof_valid).count();

        let threshold = self.approval_threshold;
        if approved >= threshold && proof_valid >= threshold {
            claim.state = ClaimState::Approved;
            info!(claim_id = %claim.claim_id, approved, proof_valid, "claim approved by quorum");
            return Ok(Some(VerifiedClaim {
                claim_id: claim.claim_id.clone(),
                claimant: claim.claimant.clone(),
                kind: claim.kind,
                tokens: claim.tokens_claimed,
                proof_digest: proof_digest(&claim.proof_payload),
            }));
        }

        if rejected >= threshold {
            claim.state = ClaimState::Rejected;
            info!(claim_id = %claim.claim_id, rejected, "claim rejected by quorum");
        } else {
            debug!(claim_id = %claim.claim_id, approved, rejected, proof_valid, "recorded verifier approval");
        }

        Ok(None)
    }

    /// Finalize an `Approved` claim on mint confirmation.
    pub fn finalize(&mut self, result: MintResult) -> Result<(), SecureError> {
        let claim = self
            .claims
            .get_mut(&result.claim_id)
            .ok_or_else(|| SecureError::UnknownClaim { claim_id: result.claim_id.clone() })?;

        if claim.state != ClaimState::Approved {
            return Err(SecureError::ClaimNotApproved { claim_id: result.claim_id });
        }

        claim.state = ClaimState::Finalized;
        claim.tx_id = Some(result.tx_id);
        Ok(())
    }

    /// Current state of a tracked claim, if any.
    #[must_use]
    pub fn claim_state(&self, claim_id: &str) -> Option<ClaimState> {
        self.claims.get(claim_id).map(|c| c.state)
    }

    /// Number of claims tracked, in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// True iff no claims are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

fn proof_digest(proof: &ProofWire) -> String {
    let canonical = serde_json::to_string(proof).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
