//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic (routing, rate limiting, proof generation)
//! from system resources (time, randomness), so the same code can run
//! against real wall-clock time and OS entropy in production, or a
//! virtual clock and seeded RNG in tests.

use std::time::Duration;

/// Abstract environment providing time, randomness, and sleep.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards within a single execution context.
/// - `random_bytes()` uses cryptographically secure entropy in
///   production implementations.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment. Production
    /// environments use `std::time::Instant`; simulations may use a
    /// virtual equivalent.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleep for `duration`. The only async method on this trait;
    /// only driver code (not protocol logic) should call it.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Convenience: a random `u16`, used for frame sequence numbers.
    fn random_u16(&self) -> u16 {
        let mut bytes = [0u8; 2];
        self.random_bytes(&mut bytes);
        u16::from_be_bytes(bytes)
    }

    /// Convenience: a random `u32`, used for route-request ids.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    /// Convenience: a random 32-byte array, used for proof secrets and
    /// ephemeral session-key material.
    fn random_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.random_bytes(&mut bytes);
        bytes
    }

    /// Convenience: a random 16-byte array, used for commitment
    /// nonces and peppers.
    fn random_16(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        bytes
    }

    /// Convenience: a random 12-byte array, used for AEAD IVs.
    fn random_12(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// Production environment using system time and cryptographic RNG.
///
/// # Panics
///
/// [`Environment::random_bytes`] panics if the OS entropy source
/// fails. A node without functioning cryptographic randomness cannot
/// safely generate session keys, IVs, or proof secrets, so continuing
/// would be worse than aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Construct a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("OS entropy source unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_produces_distinct_randomness() {
        let env = SystemEnv::new();
        assert_ne!(env.random_32(), env.random_32());
    }

    #[test]
    fn system_env_time_is_monotonic() {
        let env = SystemEnv::new();
        let a = env.now();
        let b = env.now();
        assert!(b >= a);
    }
}
