//! Commit-challenge-response zero-knowledge-style proofs for meshcore
//! claims (§4.4): bandwidth contribution, uptime, geographic
//! proximity, message freshness, and node uniqueness.
//!
//! Every proof kind shares a [`commitment::Commitment`] (a secret
//! committed to before the claim is known) and a kind-specific
//! response binding the claim to that commitment. Verifiers never see
//! the prover's secret; acceptance attests to structural
//! well-formedness and freshness, not to ground truth — the
//! authoritative check for reward-bearing claims is the verifier
//! quorum in `mesh-secure`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use tracing::{debug, warn};

pub mod bandwidth;
pub mod commitment;
pub mod error;
pub mod freshness;
pub mod proximity;
pub mod uniqueness;
pub mod uptime;

pub use bandwidth::BandwidthProof;
pub use commitment::{Commitment, ProofKind};
pub use error::ProofError;
pub use freshness::FreshnessProof;
pub use proximity::ProximityProof;
pub use uniqueness::UniquenessProof;
pub use uptime::UptimeProof;

/// Any of the five proof kinds, tagged for exhaustive dispatch at call
/// sites that only know a proof's kind at runtime (e.g.
/// `mesh-secure`'s `decrypt` dispatching on `SecureMessage::optional_proof`).
#[derive(Debug, Clone)]
pub enum ProofPayload<I> {
    /// §4.4 bandwidth proof.
    Bandwidth(BandwidthProof<I>),
    /// §4.4 uptime proof.
    Uptime(UptimeProof<I>),
    /// §4.4 proximity proof.
    Proximity(ProximityProof<I>),
    /// §4.4 freshness proof.
    Freshness(FreshnessProof<I>),
    /// §4.4 uniqueness proof.
    Uniqueness(UniquenessProof<I>),
}

impl<I: Copy + std::ops::Sub<I, Output = std::time::Duration>> ProofPayload<I> {
    /// Verify this proof against its kind-specific rules, dispatching
    /// on the variant. `now` is only consulted by kinds with a
    /// freshness window; `min_bandwidth` only by bandwidth proofs.
    pub fn verify(&self, now: I, min_bandwidth: u64) -> Result<(), ProofError> {
        let kind = self.kind();
        let result = match self {
            Self::Bandwidth(proof) => bandwidth::verify(proof, now, min_bandwidth),
            Self::Uptime(proof) => uptime::verify(proof),
            Self::Proximity(proof) => proximity::verify(proof),
            Self::Freshness(proof) => freshness::verify(proof),
            Self::Uniqueness(proof) => uniqueness::verify(proof),
        };
        match &result {
            Ok(()) => debug!(?kind, "proof verified"),
            Err(e) => warn!(?kind, error = %e, "proof rejected"),
        }
        result
    }

    /// The proof kind this payload carries.
    #[must_use]
    pub fn kind(&self) -> ProofKind {
        match self {
            Self::Bandwidth(_) => ProofKind::Bandwidth,
            Self::Uptime(_) => ProofKind::Uptime,
            Self::Proximity(_) => ProofKind::Proximity,
            Self::Freshness(_) => ProofKind::Freshness,
            Self::Uniqueness(_) => ProofKind::Uniqueness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
    }

    impl mesh_core::Environment for FakeEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            self.now
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0x5);
        }
    }

    #[test]
    fn payload_dispatches_to_matching_kind_and_verifier() {
        let env = FakeEnv { now: Duration::ZERO };
        let proof = uniqueness::generate(&env, "node-a", 8);
        let payload = ProofPayload::Uniqueness(proof);
        assert_eq!(payload.kind(), ProofKind::Uniqueness);
        assert!(payload.verify(Duration::ZERO, 0).is_ok());
    }
}
