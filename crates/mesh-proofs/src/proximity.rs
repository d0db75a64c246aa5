//! Geographic proximity proof (§4.4).
//!
//! Proves "I'm within X km" without revealing exact coordinates: the
//! claim is bound to a coarse grid cell rather than a point.

use mesh_core::Environment;
use sha2::{Digest, Sha256};

use crate::commitment::{secret_hex, Commitment, ProofKind};
use crate::error::ProofError;

/// A zero-knowledge proof of geographic proximity.
#[derive(Debug, Clone)]
pub struct ProximityProof<I> {
    /// Shared commitment fields.
    pub commitment: Commitment<I>,
    /// Claimed maximum distance, in kilometers.
    pub distance_bound_km: f64,
    /// Hash of the coarse grid cell containing the node's location.
    pub region_hash: String,
    /// Response to the coordinate-range challenge.
    pub challenge_response: String,
}

/// Generate a proximity proof for `(lat, lon)` bounded by
/// `distance_bound_km`.
pub fn generate<E: Environment>(env: &E, lat: f64, lon: f64, distance_bound_km: f64) -> ProximityProof<E::Instant> {
    let (commitment, secret) = Commitment::fresh(env, ProofKind::Proximity);

    let grid_size = (distance_bound_km / 1.11).floor().max(1.0) as i64;
    let lat_hundredths = (lat * 100.0).floor() as i64;
    let lon_hundredths = (lon * 100.0).floor() as i64;
    let lat_min = lat_hundredths - grid_size;
    let lat_max = lat_hundredths + grid_size;
    let lon_min = lon_hundredths - grid_size;
    let lon_max = lon_hundredths + grid_size;

    let salt = hex::encode(env.random_16());
    let region_data = format!("{lat_min},{lat_max},{lon_min},{lon_max}:{salt}");
    let region_hash = hex::encode(Sha256::digest(region_data.as_bytes()));

    let challenge = hex::encode(Sha256::digest(format!("{lat_min}{lon_min}").as_bytes()));
    let challenge_response =
        hex::encode(Sha256::digest(format!("{challenge}{}", secret_hex(&secret)).as_bytes()));

    ProximityProof { commitment, distance_bound_km, region_hash, challenge_response }
}

/// Verify a proximity proof's bounds and structural widths.
pub fn verify<I>(proof: &ProximityProof<I>) -> Result<(), ProofError> {
    if !(proof.distance_bound_km > 0.0 && proof.distance_bound_km <= 10_000.0) {
        return Err(ProofError::OutOfRange {
            field: "distance_bound_km",
            value: proof.distance_bound_km.to_string(),
            expected: "(0, 10000]",
        });
    }

    if proof.region_hash.len() != 64 {
        return Err(ProofError::StructuralWidth {
            field: "region_hash",
            expected_hex_chars: 64,
            actual_hex_chars: proof.region_hash.len(),
        });
    }

    if proof.challenge_response.len() != 64 {
        return Err(ProofError::StructuralWidth {
            field: "challenge_response",
            expected_hex_chars: 64,
            actual_hex_chars: proof.challenge_response.len(),
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
            buffer.fill(0x7);
        }
    }

    #[test]
    fn generated_proof_passes_verification() {
        let env = FakeEnv { now: Duration::ZERO };
        let proof = generate(&env, 37.77, -122.42, 50.0);
        assert!(verify(&proof).is_ok());
    }

    #[test]
    fn rejects_zero_and_excessive_distance_bounds() {
        let env = FakeEnv { now: Duration::ZERO };
        let zero = generate(&env, 0.0, 0.0, 0.0);
        assert!(verify(&zero).is_err());

        let too_far = generate(&env, 0.0, 0.0, 10_001.0);
        assert!(verify(&too_far).is_err());
    }

    #[test]
    fn rejects_malformed_region_hash() {
        let env = FakeEnv { now: Duration::ZERO };
        let mut proof = generate(&env, 1.0, 1.0, 10.0);
        proof.region_hash.truncate(10);
        assert!(verify(&proof).is_err());
    }

    #[test]
    fn grid_size_floors_to_at_least_one() {
        let env = FakeEnv { now: Duration::ZERO };
        let tiny = generate(&env, 1.0, 1.0, 0.1);
        assert!(verify(&tiny).is_ok());
    }
}
