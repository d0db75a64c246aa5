//! Sliding-window rate-limiter state (§3, §4.2).

use std::collections::VecDeque;

/// Per-key sliding window of admission timestamps.
///
/// A key may be source-id-scoped, destination-id-scoped, or
/// content-hash-scoped; the key namespace is part of the caller
/// contract, not this type's concern. The admission logic
/// (`check`/`record`) lives in `mesh-net::rate_limiter`; this type is
/// the bare window state plus the purge/count primitives that logic
/// is built from.
#[derive(Debug, Clone)]
pub struct RateWindow<I> {
    max_requests: usize,
    window: std::time::Duration,
    times: VecDeque<I>,
}

impl<I: Copy + Ord> RateWindow<I> {
    /// Construct an empty window admitting at most `max_requests`
    /// within `window`.
    #[must_use]
    pub fn new(max_requests: usize, window: std::time::Duration) -> Self {
        Self { max_requests, window, times: VecDeque::new() }
    }

    /// The configured admission ceiling.
    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// The configured window duration.
    #[must_use]
    pub fn window(&self) -> std::time::Duration {
        self.window
    }

    /// Number of timestamps currently retained (after the caller has
    /// purged stale entries via [`Self::purge_stale`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True iff no timestamps are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Drop timestamps older than `now - self.window`, given a
    /// subtraction producing a duration comparable to `self.window`.
    pub fn purge_stale(&mut self, now: I)
    where
        I: std::ops::Sub<I, Output = std::time::Duration>,
    {
        while let Some(&front) = self.times.front() {
            if now - front > self.window {
                self.times.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether admitting one more request at `now` would stay within
    /// `max_requests` (does not mutate).
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.times.len() < self.max_requests
    }

    /// Record an admission at `now`. Callers should call
    /// [`Self::purge_stale`] and check [`Self::has_capacity`] first.
    pub fn push(&mut self, now: I) {
        self.times.push_back(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn purge_stale_drops_entries_outside_window() {
        let mut window: RateWindow<u64> = RateWindow::new(10, Duration::from_secs(60));
        window.push(0);
        window.push(30);
        window.push(100);
        window.purge_stale(120);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn capacity_respects_max_requests() {
        let mut window: RateWindow<u64> = RateWindow::new(2, Duration::from_secs(60));
        assert!(window.has_capacity());
        window.push(0);
        assert!(window.has_capacity());
        window.push(1);
        assert!(!window.has_capacity());
    }
}
