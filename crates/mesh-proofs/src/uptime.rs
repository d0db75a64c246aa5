//! Uptime / availability proof (§4.4).
//!
//! Proves "I was available for X% of the period" without revealing
//! exact beacon timestamps: a Merkle root over beacon values heard,
//! plus a participation count checked against the claimed percentage.

use mesh_core::Environment;
use mesh_crypto::merkle_root;

use crate::commitment::{Commitment, ProofKind};
use crate::error::ProofError;

/// Maximum allowed drift between the claimed percentage and the
/// percentage derived from `participation`/`total_beacons`.
pub const ACCEPTABLE_VARIANCE_PCT: f64 = 5.0;

/// A zero-knowledge proof of node uptime.
#[derive(Debug, Clone)]
pub struct UptimeProof<I> {
    /// Shared commitment fields.
    pub commitment: Commitment<I>,
    /// Claimed uptime percentage, in `[0, 100]`.
    pub uptime_pct: f64,
    /// Length of the measured period, in seconds.
    pub period_seconds: u64,
    /// Merkle root over the beacon values heard.
    pub beacon_merkle_root: String,
    /// Number of beacons the node answered.
    pub participation: u64,
    /// Total beacons issued during the period, derived from the
    /// claimed percentage and participation count.
    pub total_beacons: u64,
}

/// Generate an uptime proof from `beacon_values` heard during
/// `period_seconds`, claiming `uptime_pct`.
pub fn generate<E: Environment>(
    env: &E,
    uptime_pct: f64,
    period_seconds: u64,
    beacon_values: &[String],
) -> UptimeProof<E::Instant> {
    let (commitment, _secret) = Commitment::fresh(env, ProofKind::Uptime);
    let root = merkle_root(beacon_values);
    let participation = beacon_values.len() as u64;
    let total_beacons = ((participation as f64) / (uptime_pct / 100.0) + 0.5) as u64;

    UptimeProof { commitment, uptime_pct, period_seconds, beacon_merkle_root: root, participation, total_beacons }
}

/// Verify an uptime proof's range and internal consistency.
pub fn verify<I>(proof: &UptimeProof<I>) -> Result<(), ProofError> {
    if !(0.0..=100.0).contains(&proof.uptime_pct) {
        return Err(ProofError::OutOfRange {
            field: "uptime_pct",
            value: proof.uptime_pct.to_string(),
            expected: "[0, 100]",
        });
    }

    if proof.participation > proof.total_beacons {
        return Err(ProofError::OutOfRange {
            field: "participation",
            value: proof.participation.to_string(),
            expected: "<= total_beacons",
        });
    }

    if proof.total_beacons == 0 {
        return Ok(());
    }

    let calculated = 100.0 * (proof.participation as f64) / (proof.total_beacons as f64);
    if (calculated - proof.uptime_pct).abs() > ACCEPTABLE_VARIANCE_PCT {
        return Err(ProofError::OutOfRange {
            field: "uptime_pct",
            value: proof.uptime_pct.to_string(),
            expected: "within 5 points of participation/total_beacons*100",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
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
            buffer.fill(0x42);
        }
    }

    #[test]
    fn scenario_s3_boundary_acceptance_and_rejection() {
        let proof = UptimeProof {
            commitment: Commitment::fresh(&FakeEnv { now: Duration::ZERO }, ProofKind::Uptime).0,
            uptime_pct: 90.0,
            period_seconds: 3600,
            beacon_merkle_root: "x".repeat(64),
            participation: 45,
            total_beacons: 50,
        };
        assert!(verify(&proof).is_ok());

        let mismatched = UptimeProof { uptime_pct: 82.0, ..proof };
        assert!(verify(&mismatched).is_err());
    }

    #[test]
    fn generate_derives_total_beacons_from_participation_and_pct() {
        let env = FakeEnv { now: Duration::ZERO };
        let beacons: Vec<String> = (0..45).map(|i| i.to_string()).collect();
        let proof = generate(&env, 90.0, 3600, &beacons);
        assert_eq!(proof.participation, 45);
        assert_eq!(proof.total_beacons, 50);
        assert!(verify(&proof).is_ok());
    }

    #[test]
    fn verify_rejects_out_of_range_percentage() {
        let env = FakeEnv { now: Duration::ZERO };
        let (commitment, _) = Commitment::fresh(&env, ProofKind::Uptime);
        let proof = UptimeProof {
            commitment,
            uptime_pct: 150.0,
            period_seconds: 60,
            beacon_merkle_root: "x".repeat(64),
            participation: 1,
            total_beacons: 1,
        };
        assert!(verify(&proof).is_err());
    }

    #[test]
    fn verify_rejects_participation_exceeding_total() {
        let env = FakeEnv { now: Duration::ZERO };
        let (commitment, _) = Commitment::fresh(&env, ProofKind::Uptime);
        let proof = UptimeProof {
            commitment,
            uptime_pct: 50.0,
            period_seconds: 60,
            beacon_merkle_root: "x".repeat(64),
            participation: 10,
            total_beacons: 5,
        };
        assert!(verify(&proof).is_err());
    }
}
