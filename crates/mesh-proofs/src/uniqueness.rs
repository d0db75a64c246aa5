//! Node uniqueness proof, a Sybil deterrent (§4.4).
//!
//! Binds a proof-of-work and a ring signature to a peppered node-id
//! hash, so a verifier can check "this is some unique node" without
//! learning which one.

use mesh_core::Environment;
use sha2::{Digest, Sha256};

use crate::commitment::{secret_hex, Commitment, ProofKind};
use crate::error::ProofError;

/// Default proof-of-work difficulty, in bits.
pub const DEFAULT_DIFFICULTY_BITS: u32 = 20;

/// Default ring size used to obscure the prover among decoys.
pub const DEFAULT_RING_SIZE: u32 = 10;

/// Hard ceiling on proof-of-work search attempts.
pub const MAX_POW_ATTEMPTS: u64 = 1_000_000;

/// A zero-knowledge proof of node uniqueness.
#[derive(Debug, Clone)]
pub struct UniquenessProof<I> {
    /// Shared commitment fields.
    pub commitment: Commitment<I>,
    /// `sha256(node_id || pepper)`, hex-encoded.
    pub node_id_hash: String,
    /// `sha256(node_id_hash || pow_nonce)`, hex-encoded.
    pub proof_of_work: String,
    /// The nonce that satisfies the proof-of-work prefix constraint.
    pub pow_nonce: u64,
    /// Difficulty, in bits, the PoW was solved against.
    pub difficulty_bits: u32,
    /// Number of decoys in the ring signature.
    pub ring_size: u32,
    /// Ring signature over the node-id hash.
    pub ring_signature: String,
}

/// Generate a uniqueness proof for `node_id` at `difficulty_bits`.
pub fn generate<E: Environment>(env: &E, node_id: &str, difficulty_bits: u32) -> UniquenessProof<E::Instant> {
    let (commitment, secret) = Commitment::fresh(env, ProofKind::Uniqueness);

    let pepper = hex::encode(env.random_16());
    let node_id_hash = hex::encode(Sha256::digest(format!("{node_id}{pepper}").as_bytes()));

    let prefix_len = (difficulty_bits / 4) as usize;
    let target = "0".repeat(prefix_len);
    let mut pow_nonce = 0u64;
    let mut proof_of_work = hex::encode(Sha256::digest(format!("{node_id_hash}{pow_nonce}").as_bytes()));
    while !proof_of_work.starts_with(&target) && pow_nonce < MAX_POW_ATTEMPTS {
        pow_nonce += 1;
        proof_of_work = hex::encode(Sha256::digest(format!("{node_id_hash}{pow_nonce}").as_bytes()));
    }

    let ring_size = DEFAULT_RING_SIZE;
    let secret_hex = secret_hex(&secret);
    let mut ring_commitment = String::new();
    for i in 0..ring_size {
        let member = hex::encode(Sha256::digest(format!("{i}{node_id_hash}{secret_hex}").as_bytes()));
        ring_commitment.push_str(&member);
    }
    let ring_signature = hex::encode(Sha256::digest(ring_commitment.as_bytes()));

    UniquenessProof { commitment, node_id_hash, proof_of_work, pow_nonce, difficulty_bits, ring_size, ring_signature }
}

/// Verify a uniqueness proof's structure, ring size, and proof-of-work.
pub fn verify<I>(proof: &UniquenessProof<I>) -> Result<(), ProofError> {
    for (field, value) in
        [("node_id_hash", &proof.node_id_hash), ("proof_of_work", &proof.proof_of_work), ("ring_signature", &proof.ring_signature)]
    {
        if value.len() != 64 {
            return Err(ProofError::StructuralWidth { field, expected_hex_chars: 64, actual_hex_chars: value.len() });
        }
    }

    if !(5..=1000).contains(&proof.ring_size) {
        return Err(ProofError::RingSizeOutOfRange { size: proof.ring_size });
    }

    let prefix_len = (proof.difficulty_bits / 4) as usize;
    let target = "0".repeat(prefix_len);
    let recomputed =
        hex::encode(Sha256::digest(format!("{}{}", proof.node_id_hash, proof.pow_nonce).as_bytes()));
    if recomputed != proof.proof_of_work || !recomputed.starts_with(&target) {
        return Err(ProofError::OutOfRange {
            field: "proof_of_work",
            value: proof.proof_of_work.clone(),
            expected: "sha256(node_id_hash || pow_nonce) with required zero prefix",
        });
    }

    Ok(())
}
