//! IV replay guard for a secure session (§4.5, §5).
//!
//! A session's replay state is a bounded, time-ordered set of IVs
//! already consumed under its key: bounded the way
//! `mesh_core::rate::RateWindow` bounds admission timestamps, deduped
//! the way `mesh_core::route::SeenDiscoverySet` deduplicates discovery
//! ids. Evicted by age (a sliding window) and by a hard capacity
//! ceiling, whichever is reached first — §4.5 requires memory to stay
//! bounded without specifying which eviction rule takes precedence.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use mesh_crypto::IV_LEN;

/// Default number of IVs retained per session before the oldest is
/// evicted regardless of age.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Default sliding-window age after which an IV is forgotten and may
/// coincidentally repeat without being flagged (a session is not
/// expected to survive this long without rekeying in practice).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3600);

/// Tracks IVs already consumed under one session key.
#[derive(Debug, Clone)]
pub struct IvReplayGuard<I> {
    capacity: usize,
    window: Duration,
    seen: HashSet<[u8; IV_LEN]>,
    order: VecDeque<(I, [u8; IV_LEN])>,
}

impl<I: Copy + Ord> IvReplayGuard<I> {
    /// Construct an empty guard with the given capacity and window.
    #[must_use]
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self { capacity, window, seen: HashSet::new(), order: VecDeque::new() }
    }

    /// Construct a guard with [`DEFAULT_CAPACITY`] and [`DEFAULT_WINDOW`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }

    /// True iff `iv` has already been recorded and has not yet aged
    /// out or been evicted for capacity.
    #[must_use]
    pub fn contains(&self, iv: &[u8; IV_LEN]) -> bool {
        self.seen.contains(iv)
    }

    /// Record `iv` as consumed at `now`, evicting stale and
    /// over-capacity entries first. Callers must check
    /// [`Self::contains`] before calling this.
    pub fn record(&mut self, iv: [u8; IV_LEN], now: I)
    where
        I: std::ops::Sub<I, Output = Duration>,
    {
        self.evict_stale(now);
        while self.order.len() >= self.capacity {
            if let Some((_, oldest_iv)) = self.order.pop_front() {
                self.seen.remove(&oldest_iv);
            }
        }
        self.seen.insert(iv);
        self.order.push_back((now, iv));
    }

    /// Drop entries older than `self.window` relative to `now`.
    pub fn evict_stale(&mut self, now: I)
    where
        I: std::ops::Sub<I, Output = Duration>,
    {
        while let Some(&(seen_at, iv)) = self.order.front() {
            if now - seen_at > self.window {
                self.order.pop_front();
                self.seen.remove(&iv);
            } else {
                break;
            }
        }
    }

    /// Number of IVs currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True iff no IVs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_iv_is_admitted_and_then_flagged_as_replay() {
        let mut guard: IvReplayGuard<Duration> = IvReplayGuard::with_defaults();
        let iv = [1u8; IV_LEN];
        assert!(!guard.contains(&iv));
        guard.record(iv, Duration::from_secs(1));
        assert!(guard.contains(&iv));
    }

    #[test]
    fn capacity_eviction_forgets_the_oldest_iv() {
        let mut guard: IvReplayGuard<Duration> = IvReplayGuard::new(2, Duration::from_secs(3600));
        guard.record([1u8; IV_LEN], Duration::from_secs(1));
        guard.record([2u8; IV_LEN], Duration::from_secs(2));
        guard.record([3u8; IV_LEN], Duration::from_secs(3));
        assert!(!guard.contains(&[1u8; IV_LEN]));
        assert!(guard.contains(&[2u8; IV_LEN]));
        assert!(guard.contains(&[3u8; IV_LEN]));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn window_eviction_forgets_entries_older_than_the_sliding_window() {
        let mut guard: IvReplayGuard<Duration> = IvReplayGuard::new(100, Duration::from_secs(10));
        guard.record([1u8; IV_LEN], Duration::from_secs(0));
        guard.evict_stale(Duration::from_secs(20));
        assert!(!guard.contains(&[1u8; IV_LEN]));
        assert!(guard.is_empty());
    }
}
