//! Sliding-window rate limiter (§4.2).
//!
//! Defaults (`max_requests=10, window_seconds=60.0`) match the
//! reference admission policy; per-key overrides are available for
//! callers that need a tighter or looser policy (e.g. content-hash-scoped
//! announce rate limiting at a different rate than source-id-scoped
//! data admission).

use std::collections::HashMap;
use std::time::Duration;

use mesh_core::RateWindow;

/// Default admission ceiling per window.
pub const DEFAULT_MAX_REQUESTS: usize = 10;

/// Default window length.
pub const DEFAULT_WINDOW_SECONDS: f64 = 60.0;

/// Per-key sliding-window rate limiter.
///
/// `check`/`record` must run under mutual exclusion at the call site
/// (§4.2 "under mutual exclusion") — this type itself is not
/// internally synchronized; locking is left to the owning node handle.
#[derive(Debug, Clone)]
pub struct RateLimiter<I> {
    default_max: usize,
    default_window: Duration,
    overrides: HashMap<String, (usize, Duration)>,
    windows: HashMap<String, RateWindow<I>>,
}

impl<I: Copy + Ord + std::ops::Sub<I, Output = Duration>> RateLimiter<I> {
    /// Construct a limiter using the default constants for any key
    /// without an explicit override.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_max: DEFAULT_MAX_REQUESTS,
            default_window: Duration::from_secs_f64(DEFAULT_WINDOW_SECONDS),
            overrides: HashMap::new(),
            windows: HashMap::new(),
        }
    }

    /// Set a per-key override, replacing the default for future
    /// windows created for `key`. Has no effect on an already-created
    /// window's limits.
    pub fn with_limit(mut self, key: impl Into<String>, max_requests: usize, window: Duration) -> Self {
        self.overrides.insert(key.into(), (max_requests, window));
        self
    }

    fn window_for(&mut self, key: &str) -> &mut RateWindow<I> {
        self.windows.entry(key.to_string()).or_insert_with(|| {
            let (max, window) =
                self.overrides.get(key).copied().unwrap_or((self.default_max, self.default_window));
            RateWindow::new(max, window)
        })
    }

    /// Check whether `key` may admit one more request at `now`. Purges
    /// stale timestamps first; if admitted, records `now`.
    pub fn check(&mut self, key: &str, now: I) -> bool {
        let window = self.window_for(key);
        window.purge_stale(now);
        if window.has_capacity() {
            window.push(now);
            true
        } else {
            false
        }
    }

    /// Record an admission for `key` without checking capacity
    /// (passive accounting, e.g. for traffic the caller admits for
    /// other reasons).
    pub fn record(&mut self, key: &str, now: I) {
        let window = self.window_for(key);
        window.purge_stale(now);
        window.push(now);
    }

    /// Drop tracked windows with no timestamps after purging against
    /// `now` (idle-window eviction; permitted but not required).
    pub fn evict_idle(&mut self, now: I) {
        for window in self.windows.values_mut() {
            window.purge_stale(now);
        }
        self.windows.retain(|_, window| !window.is_empty());
    }
}

impl<I: Copy + Ord + std::ops::Sub<I, Output = Duration>> Default for RateLimiter<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_default_max_within_window() {
        let mut limiter: RateLimiter<Duration> = RateLimiter::new();
        for i in 0..DEFAULT_MAX_REQUESTS {
            assert!(limiter.check("peer:a", Duration::from_secs(i as u64)), "admission {i} should succeed");
        }
        assert!(!limiter.check("peer:a", Duration::from_secs(DEFAULT_MAX_REQUESTS as u64)));
    }

    #[test]
    fn keys_are_independent() {
        let mut limiter: RateLimiter<Duration> = RateLimiter::new();
        for i in 0..DEFAULT_MAX_REQUESTS {
            limiter.check("peer:a", Duration::from_secs(i as u64));
        }
        assert!(limiter.check("peer:b", Duration::ZERO));
    }

    #[test]
    fn window_slides_and_readmits_after_expiry() {
        let mut limiter: RateLimiter<Duration> =
            RateLimiter::new().with_limit("content:xyz", 1, Duration::from_secs(10));
        assert!(limiter.check("content:xyz", Duration::ZERO));
        assert!(!limiter.check("content:xyz", Duration::from_secs(5)));
        assert!(limiter.check("content:xyz", Duration::from_secs(11)));
    }

    #[test]
    fn evict_idle_drops_windows_with_no_recent_activity() {
        let mut limiter: RateLimiter<Duration> =
            RateLimiter::new().with_limit("content:xyz", 1, Duration::from_secs(10));
        limiter.check("content:xyz", Duration::ZERO);
        limiter.evict_idle(Duration::from_secs(100));
        assert_eq!(limiter.windows.len(), 0);
    }

    #[test]
    fn record_accounts_without_checking_capacity() {
        let mut limiter: RateLimiter<Duration> = RateLimiter::new().with_limit("k", 1, Duration::from_secs(60));
        limiter.record("k", Duration::ZERO);
        limiter.record("k", Duration::from_secs(1));
        assert!(!limiter.check("k", Duration::from_secs(2)));
    }
}
