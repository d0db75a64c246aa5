//! Wire shape for attaching a §4.4 proof to a [`crate::SecureMessage`].
//!
//! Mirrors `mesh_net::wire::FreshnessProofWire`: a proof's commitment
//! carries a generic `Instant`, which has no JSON representation, so
//! the wire form captures only the claim fields plus (for bandwidth,
//! the one kind whose verification consults commitment age) the
//! elapsed age in seconds at the moment the claimant attached it.
//! [`ProofWire::verify`] reconstructs a throwaway `Commitment<Duration>`
//! to drive the existing kind-specific `verify` functions unchanged.

use std::time::Duration;

use mesh_proofs::commitment::{Commitment, ProofKind};
use mesh_proofs::{bandwidth, proximity, uniqueness, uptime};
use mesh_proofs::{BandwidthProof, ProofError, ProximityProof, UniquenessProof, UptimeProof};
use serde::{Deserialize, Serialize};

/// The wire-relevant subset of one of the five §4.4 proof kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProofWire {
    /// §4.4 bandwidth proof.
    Bandwidth {
        /// Total bytes claimed served.
        bytes_served: u64,
        /// Merkle root over the served content hashes.
        merkle_root: String,
        /// Random challenges issued against the commitment.
        challenges: Vec<String>,
        /// Responses binding each challenge to the claim and secret.
        responses: Vec<String>,
        /// Seconds elapsed between the commitment and attaching this
        /// proof to a claim; a snapshot, not a live clock.
        committed_age_secs: u64,
    },
    /// §4.4 uptime proof.
    Uptime {
        /// Claimed uptime percentage, in `[0, 100]`.
        uptime_pct: f64,
        /// Length of the measured period, in seconds.
        period_seconds: u64,
        /// Merkle root over the beacon values heard.
        beacon_merkle_root: String,
        /// Number of beacons the node answered.
        participation: u64,
        /// Total beacons issued during the period.
        total_beacons: u64,
    },
    /// §4.4 proximity proof.
    Proximity {
        /// Claimed maximum distance, in kilometers.
        distance_bound_km: f64,
        /// Hash of the coarse grid cell containing the claimant.
        region_hash: String,
        /// Response to the coordinate-range challenge.
        challenge_response: String,
    },
    /// §4.4 uniqueness proof.
    Uniqueness {
        /// `sha256(node_id || pepper)`, hex-encoded.
        node_id_hash: String,
        /// `sha256(node_id_hash || pow_nonce)`, hex-encoded.
        proof_of_work: String,
        /// The nonce that satisfies the proof-of-work prefix constraint.
        pow_nonce: u64,
        /// Difficulty, in bits, the PoW was solved against.
        difficulty_bits: u32,
        /// Number of decoys in the ring signature.
        ring_size: u32,
        /// Ring signature over the node-id hash.
        ring_signature: String,
    },
}

impl ProofWire {
    /// Capture a bandwidth proof's wire-relevant fields. `now` is the
    /// instant of attachment, used only to snapshot the commitment's
    /// elapsed age.
    pub fn from_bandwidth<I: Copy + std::ops::Sub<I, Output = Duration>>(proof: &BandwidthProof<I>, now: I) -> Self {
        Self::Bandwidth {
            bytes_served: proof.bytes_served,
            merkle_root: proof.merkle_root.clone(),
            challenges: proof.challenges.clone(),
            responses: proof.responses.clone(),
            committed_age_secs: (now - proof.commitment.issued_at).as_secs(),
        }
    }

    /// Capture an uptime proof's wire-relevant fields.
    #[must_use]
    pub fn from_uptime<I>(proof: &UptimeProof<I>) -> Self {
        Self::Uptime {
            uptime_pct: proof.uptime_pct,
            period_seconds: proof.period_seconds,
            beacon_merkle_root: proof.beacon_merkle_root.clone(),
            participation: proof.participation,
            total_beacons: proof.total_beacons,
        }
    }

    /// Capture a proximity proof's wire-relevant fields.
    #[must_use]
    pub fn from_proximity<I>(proof: &ProximityProof<I>) -> Self {
        Self::Proximity {
            distance_bound_km: proof.distance_bound_km,
            region_hash: proof.region_hash.clone(),
            challenge_response: proof.challenge_response.clone(),
        }
    }

    /// Capture a uniqueness proof's wire-relevant fields.
    #[must_use]
    pub fn from_uniqueness<I>(proof: &UniquenessProof<I>) -> Self {
        Self::Uniqueness {
            node_id_hash: proof.node_id_hash.clone(),
            proof_of_work: proof.proof_of_work.clone(),
            pow_nonce: proof.pow_nonce,
            difficulty_bits: proof.difficulty_bits,
            ring_size: proof.ring_size,
            ring_signature: proof.ring_signature.clone(),
        }
    }

    /// Which proof kind this wire value carries.
    #[must_use]
    pub fn kind(&self) -> ProofKind {
        match self {
            Self::Bandwidth { .. } => ProofKind::Bandwidth,
            Self::Uptime { .. } => ProofKind::Uptime,
            Self::Proximity { .. } => ProofKind::Proximity,
            Self::Uniqueness { .. } => ProofKind::Uniqueness,
        }
    }

    /// Verify this proof's §4.4 rules by reconstructing a throwaway
    /// proof value and delegating to the kind-specific verifier.
    /// `min_bytes` is only consulted for bandwidth proofs.
    pub fn verify(&self, min_bytes: u64) -> Result<(), ProofError> {
        match self {
            Self::Bandwidth { bytes_served, merkle_root, challenges, responses, committed_age_secs } => {
                let proof = BandwidthProof {
                    commitment: dummy_commitment(ProofKind::Bandwidth),
                    bytes_served: *bytes_served,
                    merkle_root: merkle_root.clone(),
                    challenges: challenges.clone(),
                    responses: responses.clone(),
                };
                bandwidth::verify(&proof, Duration::from_secs(*committed_age_secs), min_bytes)
            }
            Self::Uptime { uptime_pct, period_seconds, beacon_merkle_root, participation, total_beacons } => {
                let proof = UptimeProof {
                    commitment: dummy_commitment(ProofKind::Uptime),
                    uptime_pct: *uptime_pct,
                    period_seconds: *period_seconds,
                    beacon_merkle_root: beacon_merkle_root.clone(),
                    participation: *participation,
                    total_beacons: *total_beacons,
                };
                uptime::verify(&proof)
            }
            Self::Proximity { distance_bound_km, region_hash, challenge_response } => {
                let proof = ProximityProof {
                    commitment: dummy_commitment(ProofKind::Proximity),
                    distance_bound_km: *distance_bound_km,
                    region_hash: region_hash.clone(),
                    challenge_response: challenge_response.clone(),
                };
                proximity::verify(&proof)
            }
            Self::Uniqueness { node_id_hash, proof_of_work, pow_nonce, difficulty_bits, ring_size, ring_signature } => {
                let proof = UniquenessProof {
                    commitment: dummy_commitment(ProofKind::Uniqueness),
                    node_id_hash: node_id_hash.clone(),
                    proof_of_work: proof_of_work.clone(),
                    pow_nonce: *pow_nonce,
                    difficulty_bits: *difficulty_bits,
                    ring_size: *ring_size,
                    ring_signature: ring_signature.clone(),
                };
                uniqueness::verify(&proof)
            }
        }
    }
}

/// A commitment shell with `issued_at = Duration::ZERO`, used only so
/// the kind-specific `verify` functions (which expect a live
/// `Commitment<I>`) can run against wire-reconstructed claim fields.
fn dummy_commitment(kind: ProofKind) -> Commitment<Duration> {
    Commitment { hash: String::new(), nonce: [0u8; 16], issued_at: Duration::ZERO, kind }
}
