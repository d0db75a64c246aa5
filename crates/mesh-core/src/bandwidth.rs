//! Per-node bandwidth and uptime counters (§3).
//!
//! `record_peer_served` is carried over from the original
//! implementation's `BandwidthCounters` (`dcmx/lora/lora_node.py`):
//! tracking `unique_peers_served` as a derived counter alongside the
//! `peers_served` set, updated together in one call rather than left
//! to call sites.

use std::collections::HashSet;

/// Monotonic-within-a-period counters; reset at period boundaries.
#[derive(Debug, Clone)]
pub struct BandwidthCounters<I> {
    /// Bytes this node has uplinked within the current period.
    pub bytes_up: u64,
    /// Bytes this node has downlinked within the current period.
    pub bytes_down: u64,
    /// Seconds this node has been up within the current period.
    pub uptime_seconds: u64,
    /// Distinct peers served within the current period.
    pub peers_served: HashSet<String>,
    /// Start of the current accounting period.
    pub period_start: I,
    /// End of the current accounting period.
    pub period_end: I,
}

impl<I: Copy> BandwidthCounters<I> {
    /// Start a new, empty accounting period.
    #[must_use]
    pub fn new(period_start: I, period_end: I) -> Self {
        Self {
            bytes_up: 0,
            bytes_down: 0,
            uptime_seconds: 0,
            peers_served: HashSet::new(),
            period_start,
            period_end,
        }
    }

    /// Record bytes served to `peer`, updating `bytes_up` and the
    /// peer-served set in one call.
    pub fn record_peer_served(&mut self, peer: impl Into<String>, bytes: u64) {
        self.bytes_up += bytes;
        self.peers_served.insert(peer.into());
    }

    /// Count of distinct peers served so far this period.
    #[must_use]
    pub fn unique_peers_served(&self) -> usize {
        self.peers_served.len()
    }

    /// Reset counters for a new period, discarding the peer set.
    pub fn reset_period(&mut self, period_start: I, period_end: I) {
        self.bytes_up = 0;
        self.bytes_down = 0;
        self.uptime_seconds = 0;
        self.peers_served.clear();
        self.period_start = period_start;
        self.period_end = period_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_peer_served_updates_bytes_and_unique_count() {
        let mut counters: BandwidthCounters<u64> = BandwidthCounters::new(0, 3600);
        counters.record_peer_served("peer-a", 100);
        counters.record_peer_served("peer-b", 50);
        counters.record_peer_served("peer-a", 25);

        assert_eq!(counters.bytes_up, 175);
        assert_eq!(counters.unique_peers_served(), 2);
    }

    #[test]
    fn reset_period_clears_all_counters() {
        let mut counters: BandwidthCounters<u64> = BandwidthCounters::new(0, 3600);
        counters.record_peer_served("peer-a", 100);
        counters.bytes_down = 500;
        counters.uptime_seconds = 1000;

        counters.reset_period(3600, 7200);

        assert_eq!(counters.bytes_up, 0);
        assert_eq!(counters.bytes_down, 0);
        assert_eq!(counters.uptime_seconds, 0);
        assert_eq!(counters.unique_peers_served(), 0);
        assert_eq!(counters.period_start, 3600);
    }
}
