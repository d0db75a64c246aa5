//! One-hop neighbor table, populated from `Beacon` frames (§3, §4.3).

use std::collections::{HashMap, HashSet};

/// A neighbor's last-known beacon state.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord<I> {
    /// Neighbor's declared latitude.
    pub lat: f64,
    /// Neighbor's declared longitude.
    pub lon: f64,
    /// Self-declared bandwidth contribution, as of the last beacon.
    pub declared_bw: u64,
    /// Self-declared uptime percentage, as of the last beacon.
    pub declared_uptime: f64,
    /// Content hashes the neighbor last advertised it can serve.
    pub content_hashes: Vec<String>,
    /// Instant the last beacon from this neighbor was received.
    pub last_seen: I,
}

/// One-hop neighbors, reachable directly over the radio, and the
/// reverse content index built from their beacons.
///
/// Neighbors expire by beacon silence (§4.3 "Beacons"); a neighbor is
/// considered gone once `NEIGHBOR_TIMEOUT_MULTIPLE` beacon intervals
/// have elapsed without a fresh one.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable<I> {
    neighbors: HashMap<String, NeighborRecord<I>>,
    content_index: HashMap<String, HashSet<String>>,
}

impl<I: Copy + Ord + std::ops::Sub<I, Output = std::time::Duration>> NeighborTable<I> {
    /// Construct an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { neighbors: HashMap::new(), content_index: HashMap::new() }
    }

    /// Record a beacon from `peer`, replacing any prior record and
    /// reindexing its advertised content.
    pub fn observe_beacon(
        &mut self,
        peer: &str,
        lat: f64,
        lon: f64,
        declared_bw: u64,
        declared_uptime: f64,
        content_hashes: Vec<String>,
        now: I,
    ) {
        if let Some(previous) = self.neighbors.get(peer) {
            for hash in &previous.content_hashes {
                if let Some(providers) = self.content_index.get_mut(hash) {
                    providers.remove(peer);
                }
            }
        }

        for hash in &content_hashes {
            self.content_index.entry(hash.clone()).or_default().insert(peer.to_string());
        }

        self.neighbors.insert(
            peer.to_string(),
            NeighborRecord { lat, lon, declared_bw, declared_uptime, content_hashes, last_seen: now },
        );
    }

    /// Fetch a neighbor's current record, if any.
    #[must_use]
    pub fn get(&self, peer: &str) -> Option<&NeighborRecord<I>> {
        self.neighbors.get(peer)
    }

    /// Providers known to serve `content_hash`, from the most recent
    /// beacon each has sent.
    #[must_use]
    pub fn providers_of(&self, content_hash: &str) -> Vec<String> {
        self.content_index.get(content_hash).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    /// Neighbors whose last beacon is older than `timeout`, evicted
    /// from the table and returned by id.
    pub fn evict_stale(&mut self, now: I, timeout: std::time::Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .neighbors
            .iter()
            .filter(|(_, record)| now - record.last_seen >= timeout)
            .map(|(peer, _)| peer.clone())
            .collect();

        for peer in &stale {
            if let Some(record) = self.neighbors.remove(peer) {
                for hash in &record.content_hashes {
                    if let Some(providers) = self.content_index.get_mut(hash) {
                        providers.remove(peer);
                    }
                }
            }
        }

        stale
    }

    /// Number of tracked neighbors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// True iff no neighbors are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn beacon_indexes_content_and_is_queryable_by_hash() {
        let mut table: NeighborTable<Duration> = NeighborTable::new();
        table.observe_beacon("B", 1.0, 2.0, 100, 95.0, vec!["abc".into()], Duration::ZERO);
        assert_eq!(table.providers_of("abc"), vec!["B".to_string()]);
    }

    #[test]
    fn later_beacon_replaces_earlier_content_index_entries() {
        let mut table: NeighborTable<Duration> = NeighborTable::new();
        table.observe_beacon("B", 1.0, 2.0, 100, 95.0, vec!["abc".into()], Duration::ZERO);
        table.observe_beacon("B", 1.0, 2.0, 100, 95.0, vec!["xyz".into()], Duration::from_secs(60));
        assert!(table.providers_of("abc").is_empty());
        assert_eq!(table.providers_of("xyz"), vec!["B".to_string()]);
    }

    #[test]
    fn stale_neighbors_are_evicted_and_deindexed() {
        let mut table: NeighborTable<Duration> = NeighborTable::new();
        table.observe_beacon("B", 0.0, 0.0, 0, 0.0, vec!["abc".into()], Duration::ZERO);
        let evicted = table.evict_stale(Duration::from_secs(200), Duration::from_secs(180));
        assert_eq!(evicted, vec!["B".to_string()]);
        assert!(table.is_empty());
        assert!(table.providers_of("abc").is_empty());
    }

    #[test]
    fn fresh_neighbors_survive_eviction_scan() {
        let mut table: NeighborTable<Duration> = NeighborTable::new();
        table.observe_beacon("B", 0.0, 0.0, 0, 0.0, vec![], Duration::from_secs(100));
        let evicted = table.evict_stale(Duration::from_secs(150), Duration::from_secs(180));
        assert!(evicted.is_empty());
        assert_eq!(table.len(), 1);
    }
}
