//! Shared commitment fields embedded by every proof kind (§4.4).

use mesh_core::Environment;
use sha2::{Digest, Sha256};

use crate::error::ProofError;

/// Maximum age of a commitment before a verifier rejects it outright.
pub const MAX_COMMITMENT_AGE_SECS: u64 = 3600;

/// Which proof kind a commitment backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    /// §4.4 bandwidth proof.
    Bandwidth,
    /// §4.4 uptime proof.
    Uptime,
    /// §4.4 proximity proof.
    Proximity,
    /// §4.4 freshness proof.
    Freshness,
    /// §4.4 uniqueness proof.
    Uniqueness,
}

/// `Commitment{hash, nonce, issued_at, kind}` shared by all proof
/// kinds. `hash = sha256(secret32 || nonce_bytes)`.
#[derive(Debug, Clone)]
pub struct Commitment<I> {
    /// `sha256(secret || nonce)`, hex-encoded.
    pub hash: String,
    /// 16-byte nonce bound into the commitment hash.
    pub nonce: [u8; 16],
    /// Instant the commitment was issued.
    pub issued_at: I,
    /// Which proof kind this commitment backs.
    pub kind: ProofKind,
}

impl<I: Copy> Commitment<I> {
    /// Sample a fresh 32-byte secret and 16-byte nonce from `env`,
    /// compute the commitment hash, and stamp `issued_at = env.now()`.
    /// Returns the commitment together with the secret, which the
    /// caller must keep to build kind-specific responses and must
    /// never hand to the verifier.
    pub fn fresh<E: Environment<Instant = I>>(env: &E, kind: ProofKind) -> (Self, [u8; 32]) {
        let secret = env.random_32();
        let nonce = env.random_16();
        let hash = commitment_hash(&secret, &nonce);
        (Self { hash, nonce, issued_at: env.now(), kind }, secret)
    }
}

impl<I: Copy + std::ops::Sub<I, Output = std::time::Duration>> Commitment<I> {
    /// Reject if `now - issued_at` exceeds [`MAX_COMMITMENT_AGE_SECS`].
    pub fn check_freshness(&self, now: I) -> Result<(), ProofError> {
        let age = now - self.issued_at;
        if age.as_secs() > MAX_COMMITMENT_AGE_SECS {
            return Err(ProofError::CommitmentExpired {
                age_secs: age.as_secs(),
                limit_secs: MAX_COMMITMENT_AGE_SECS,
            });
        }
        Ok(())
    }
}

/// `sha256(secret || nonce)`, hex-encoded.
#[must_use]
pub fn commitment_hash(secret: &[u8; 32], nonce: &[u8; 16]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}

/// `secret` rendered as lowercase hex, the form bound into
/// challenge-response formulas throughout §4.4.
#[must_use]
pub fn secret_hex(secret: &[u8; 32]) -> String {
    hex::encode(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
        bytes: std::cell::RefCell<Vec<u8>>,
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
            let mut pool = self.bytes.borrow_mut();
            for slot in buffer.iter_mut() {
                *slot = pool.pop().unwrap_or(0);
            }
        }
    }

    fn subtractable_env(now_secs: u64) -> FakeEnv {
        FakeEnv { now: Duration::from_secs(now_secs), bytes: std::cell::RefCell::new((0..64).collect()) }
    }

    #[test]
    fn fresh_commitment_hash_matches_secret_and_nonce() {
        let env = subtractable_env(100);
        let (commitment, secret) = Commitment::fresh(&env, ProofKind::Bandwidth);
        assert_eq!(commitment.hash, commitment_hash(&secret, &commitment.nonce));
        assert_eq!(commitment.issued_at, Duration::from_secs(100));
    }

    #[test]
    fn freshness_check_rejects_after_one_hour() {
        let env = subtractable_env(0);
        let (commitment, _secret) = Commitment::fresh(&env, ProofKind::Uptime);
        assert!(commitment.check_freshness(Duration::from_secs(3600)).is_ok());
        assert!(commitment.check_freshness(Duration::from_secs(3601)).is_err());
    }
}
