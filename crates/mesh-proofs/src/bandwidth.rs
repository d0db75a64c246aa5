//! Bandwidth contribution proof (§4.4).
//!
//! Proves "I served X bytes" without revealing which content was
//! served: a Merkle root over the served content hashes, plus a set
//! of challenge/response pairs binding the claim to the commitment
//! secret.

use mesh_core::Environment;
use mesh_crypto::merkle_root;
use sha2::{Digest, Sha256};

use crate::commitment::{secret_hex, Commitment, ProofKind};
use crate::error::ProofError;

/// Default number of challenge/response pairs generated per proof.
pub const DEFAULT_CHALLENGE_COUNT: usize = 5;

/// A zero-knowledge proof of bandwidth contribution.
#[derive(Debug, Clone)]
pub struct BandwidthProof<I> {
    /// Shared commitment fields.
    pub commitment: Commitment<I>,
    /// Total bytes claimed served.
    pub bytes_served: u64,
    /// Merkle root over the served content hashes.
    pub merkle_root: String,
    /// Random challenges issued against the commitment.
    pub challenges: Vec<String>,
    /// Responses binding each challenge to the claim and secret.
    pub responses: Vec<String>,
}

/// Generate a bandwidth proof over `content_hashes`.
pub fn generate<E: Environment>(
    env: &E,
    bytes_served: u64,
    content_hashes: &[String],
    challenge_count: usize,
) -> BandwidthProof<E::Instant> {
    let (commitment, secret) = Commitment::fresh(env, ProofKind::Bandwidth);
    let root = merkle_root(content_hashes);
    let secret_hex = secret_hex(&secret);

    let challenges: Vec<String> = (0..challenge_count).map(|_| hex::encode(env.random_16())).collect();
    let responses: Vec<String> =
        challenges.iter().map(|challenge| response_for(challenge, bytes_served, &root, &secret_hex)).collect();

    BandwidthProof { commitment, bytes_served, merkle_root: root, challenges, responses }
}

fn response_for(challenge: &str, bytes_served: u64, merkle_root: &str, secret_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge.as_bytes());
    hasher.update(bytes_served.to_string().as_bytes());
    hasher.update(merkle_root.as_bytes());
    hasher.update(secret_hex.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a bandwidth proof's structure and freshness.
///
/// Acceptance attests only to structural well-formedness and
/// freshness, not to the truth of the claim — a verifier never
/// possesses the prover's secret, so the authoritative check is the
/// verifier quorum (§4.5).
pub fn verify<I: Copy + std::ops::Sub<I, Output = std::time::Duration>>(
    proof: &BandwidthProof<I>,
    now: I,
    min_bytes: u64,
) -> Result<(), ProofError> {
    if proof.bytes_served < min_bytes {
        return Err(ProofError::OutOfRange {
            field: "bytes_served",
            value: proof.bytes_served.to_string(),
            expected: "at least min_bytes",
        });
    }

    if proof.merkle_root.len() != 64 {
        return Err(ProofError::StructuralWidth {
            field: "merkle_root",
            expected_hex_chars: 64,
            actual_hex_chars: proof.merkle_root.len(),
        });
    }

    if proof.challenges.len() != proof.responses.len() {
        return Err(ProofError::VectorLengthMismatch {
            a_name: "challenges",
            a_len: proof.challenges.len(),
            b_name: "responses",
            b_len: proof.responses.len(),
        });
    }

    proof.commitment.check_freshness(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
        counter: std::cell::Cell<u8>,
    }

    impl Environment for FakeEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            self.now
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let start = self.counter.get();
            self.counter.set(start.wrapping_add(buffer.len() as u8));
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = start.wrapping_add(i as u8);
            }
        }
    }

    fn env(now_secs: u64) -> FakeEnv {
        FakeEnv { now: Duration::from_secs(now_secs), counter: std::cell::Cell::new(0) }
    }

    #[test]
    fn generated_proof_has_matching_challenge_response_lengths() {
        let hashes = vec!["hash-a".to_string(), "hash-b".to_string()];
        let proof = generate(&env(0), 1024, &hashes, DEFAULT_CHALLENGE_COUNT);
        assert_eq!(proof.challenges.len(), DEFAULT_CHALLENGE_COUNT);
        assert_eq!(proof.responses.len(), DEFAULT_CHALLENGE_COUNT);
        assert_eq!(proof.merkle_root.len(), 64);
    }

    #[test]
    fn verify_accepts_well_formed_fresh_proof() {
        let hashes = vec!["hash-a".to_string()];
        let proof = generate(&env(0), 1024, &hashes, 3);
        assert!(verify(&proof, Duration::from_secs(100), 0).is_ok());
    }

    #[test]
    fn verify_rejects_below_minimum_bytes() {
        let hashes = vec!["hash-a".to_string()];
        let proof = generate(&env(0), 10, &hashes, 3);
        assert!(verify(&proof, Duration::from_secs(0), 1000).is_err());
    }

    #[test]
    fn verify_rejects_stale_commitment() {
        let hashes = vec!["hash-a".to_string()];
        let proof = generate(&env(0), 1024, &hashes, 3);
        assert!(verify(&proof, Duration::from_secs(3601), 0).is_err());
    }

    #[test]
    fn verify_rejects_mismatched_challenge_response_lengths() {
        let hashes = vec!["hash-a".to_string()];
        let mut proof = generate(&env(0), 1024, &hashes, 3);
        proof.responses.pop();
        assert!(verify(&proof, Duration::from_secs(0), 0).is_err());
    }
}
