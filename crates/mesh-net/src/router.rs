//! The mesh routing engine (§4.3): on-demand AODV-style discovery,
//! beacons, content announcements, and route-error propagation.
//!
//! `MeshRouter` is an action-pattern engine: its methods never perform
//! I/O themselves, they return [`RouterAction`] values for a driver to
//! execute (broadcast a frame, resolve a waiting caller). This keeps
//! the routing logic deterministic and unit-testable against virtual
//! time.

use std::collections::HashMap;
use std::time::Duration;

use mesh_core::{Environment, NodeIdentity, PendingDiscovery, RouteEntry, SeenDiscoverySet};
use mesh_proofs::freshness;
use mesh_proto::{decode_node_id, encode_node_id, Frame, FrameHeader, Kind, BROADCAST_ADDR};
use tracing::{debug, info};

use crate::error::RouterError;
use crate::neighbor::NeighborTable;
use crate::wire::{
    BeaconPayload, ContentAnnouncePayload, FreshnessProofWire, RouteErrorPayload, RouteReplyPayload,
    RouteRequestPayload,
};

/// Route lifetime installed on a fresh `RouteReply` (§4.3).
pub const ROUTE_LIFETIME: Duration = Duration::from_secs(300);

/// Interval between outgoing beacons (§4.3 "Beacons").
pub const BEACON_INTERVAL: Duration = Duration::from_secs(60);

/// Initial TTL stamped on an originated `RouteRequest`.
pub const MAX_TTL: u8 = 10;

/// How long a discovery waits for a reply before retrying or failing.
///
/// Not given an explicit value anywhere in the material this crate is
/// grounded on; chosen as a conventional AODV net-traversal estimate
/// (see `DESIGN.md`).
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Rebroadcast attempts made before a discovery is abandoned.
pub const MAX_DISCOVERY_RETRIES: u8 = 2;

/// Beacon silence multiple after which a neighbor is considered gone.
///
/// Not given an explicit value in the material this crate is grounded
/// on; chosen as a conventional liveness margin (see `DESIGN.md`).
pub const NEIGHBOR_TIMEOUT_MULTIPLE: u32 = 3;

fn neighbor_timeout() -> Duration {
    BEACON_INTERVAL * NEIGHBOR_TIMEOUT_MULTIPLE
}

/// An effect a driver must carry out on `MeshRouter`'s behalf.
#[derive(Debug, Clone)]
pub enum RouterAction {
    /// Transmit `frame` over the radio link. The frame's header
    /// `dst`/`BROADCAST_ADDR` already encodes who should act on it;
    /// the medium itself is broadcast (§6).
    Send(Frame),
    /// A discovery for `dest` resolved; wake `waiters`.
    DiscoveryResolved {
        /// The resolved destination.
        dest: String,
        /// Waiter tokens to resolve.
        waiters: Vec<u64>,
    },
    /// A discovery for `dest` was abandoned after exhausting retries;
    /// wake `waiters` with failure.
    DiscoveryFailed {
        /// The abandoned destination.
        dest: String,
        /// Waiter tokens to fail.
        waiters: Vec<u64>,
    },
}

/// The per-node mesh routing engine: routing table, pending
/// discoveries, discovery de-duplication, and the one-hop neighbor
/// table built from beacons.
#[derive(Debug, Clone)]
pub struct MeshRouter<I> {
    self_id: String,
    routes: HashMap<String, RouteEntry<I>>,
    pending: HashMap<String, PendingDiscovery<I>>,
    seen: SeenDiscoverySet<I>,
    neighbors: NeighborTable<I>,
}

impl<I: Copy + Ord + std::ops::Sub<I, Output = Duration> + std::ops::Add<Duration, Output = I>> MeshRouter<I> {
    /// Construct a router for `self_id`, with empty tables.
    #[must_use]
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            routes: HashMap::new(),
            pending: HashMap::new(),
            seen: SeenDiscoverySet::new(),
            neighbors: NeighborTable::new(),
        }
    }

    /// This node's id.
    #[must_use]
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// A valid route to `dest`, if one is installed.
    #[must_use]
    pub fn route_to(&self, dest: &str, now: I) -> Option<&RouteEntry<I>> {
        self.routes.get(dest).filter(|route| route.is_valid(&now))
    }

    /// Number of neighbors currently tracked.
    #[must_use]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Known providers of `content_hash`, from neighbor beacons.
    #[must_use]
    pub fn providers_of(&self, content_hash: &str) -> Vec<String> {
        self.neighbors.providers_of(content_hash)
    }

    /// Resolve a route to `dest`: if one is already valid, resolve
    /// immediately; if a discovery is already in flight, queue
    /// `waiter`; otherwise originate a `RouteRequest` broadcast.
    pub fn discover(
        &mut self,
        dest: &str,
        waiter: Option<u64>,
        identity: &mut NodeIdentity,
        now: I,
        self_lat: f64,
        self_lon: f64,
    ) -> Vec<RouterAction> {
        if self.route_to(dest, now).is_some() {
            return vec![RouterAction::DiscoveryResolved { dest: dest.to_string(), waiters: waiter.into_iter().collect() }];
        }

        if let Some(pending) = self.pending.get_mut(dest) {
            if let Some(waiter) = waiter {
                pending.add_waiter(waiter);
            }
            return vec![];
        }

        let rreq_id = identity.next_rreq_id();
        let orig_seq = u32::from(identity.next_seq());
        self.seen.insert(&self.self_id, rreq_id, now);

        let mut pending = PendingDiscovery::new(dest, rreq_id, now);
        if let Some(waiter) = waiter {
            pending.add_waiter(waiter);
        }
        self.pending.insert(dest.to_string(), pending);

        let frame = self.build_route_request(rreq_id, dest, 0, orig_seq, self_lat, self_lon, identity);
        vec![RouterAction::Send(frame)]
    }

    fn build_route_request(
        &self,
        rreq_id: u32,
        dest: &str,
        dest_seq_seen: u32,
        orig_seq: u32,
        orig_lat: f64,
        orig_lon: f64,
        identity: &NodeIdentity,
    ) -> Frame {
        let payload = RouteRequestPayload {
            rreq_id,
            dest: dest.to_string(),
            dest_seq_seen,
            orig: self.self_id.clone(),
            orig_seq,
            orig_lat,
            orig_lon,
        };
        #[allow(clippy::cast_possible_truncation)]
        let header = FrameHeader::new(
            Kind::RouteRequest,
            identity.wire_id(),
            BROADCAST_ADDR,
            orig_seq as u16,
            0,
            MAX_TTL,
        );
        let body = serde_json::to_vec(&payload).expect("route request payload always serializes");
        Frame::new(header, body)
    }

    /// Handle an inbound `RouteRequest` received from `neighbor`.
    ///
    /// Installs/refreshes a reverse route toward the originator,
    /// replies directly if this node is the destination or holds a
    /// fresh route to it, otherwise rebroadcasts with TTL decremented
    /// (dropping it if TTL has been exhausted).
    pub fn handle_route_request(
        &mut self,
        frame: &Frame,
        neighbor: &str,
        now: I,
        identity: &mut NodeIdentity,
        self_lat: f64,
        self_lon: f64,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let payload: RouteRequestPayload = serde_json::from_slice(&frame.payload)
            .map_err(|e| RouterError::MalformedPayload(e.to_string()))?;

        if !self.seen.insert(&payload.orig, payload.rreq_id, now) {
            return Ok(vec![]);
        }

        let reverse_hops = frame.header.hops().saturating_add(1);
        let install_reverse = self
            .routes
            .get(&payload.orig)
            .is_none_or(|existing| existing.should_replace(payload.orig_seq, reverse_hops));
        if install_reverse {
            debug!(dest = %payload.orig, next_hop = %neighbor, hop_count = reverse_hops, "installing reverse route");
            self.routes.insert(
                payload.orig.clone(),
                RouteEntry {
                    dest: payload.orig.clone(),
                    next_hop: neighbor.to_string(),
                    hop_count: reverse_hops,
                    dest_seq: payload.orig_seq,
                    expires_at: add_duration(now, ROUTE_LIFETIME),
                    precursors: std::collections::HashSet::new(),
                },
            );
        }

        if payload.dest == self.self_id {
            let reply = self.build_route_reply(&payload.orig, &payload.dest, 0, identity, self_lat, self_lon, now);
            return Ok(vec![RouterAction::Send(reply)]);
        }

        if let Some(route) = self.route_to(&payload.dest, now) {
            if route.dest_seq >= payload.dest_seq_seen {
                let hop_count = route.hop_count;
                let dest_seq = route.dest_seq;
                let reply = self.build_route_reply_for_intermediate(
                    &payload.orig,
                    &payload.dest,
                    dest_seq,
                    hop_count,
                    self_lat,
                    self_lon,
                    identity,
                    now,
                );
                return Ok(vec![RouterAction::Send(reply)]);
            }
        }

        let mut header = frame.header;
        if !header.advance_hop() {
            return Ok(vec![]);
        }
        let body = frame.payload.clone();
        Ok(vec![RouterAction::Send(Frame::new(header, body))])
    }

    fn build_route_reply(
        &self,
        orig: &str,
        dest: &str,
        hop_count: u8,
        identity: &mut NodeIdentity,
        dest_lat: f64,
        dest_lon: f64,
        now: I,
    ) -> Frame {
        let dest_seq = u32::from(identity.next_seq());
        self.build_route_reply_for_intermediate(orig, dest, dest_seq, hop_count, dest_lat, dest_lon, identity, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_route_reply_for_intermediate(
        &self,
        orig: &str,
        dest: &str,
        dest_seq: u32,
        hop_count: u8,
        dest_lat: f64,
        dest_lon: f64,
        identity: &mut NodeIdentity,
        now: I,
    ) -> Frame {
        let _ = now;
        let payload = RouteReplyPayload {
            dest: dest.to_string(),
            dest_seq,
            orig: orig.to_string(),
            hop_count,
            lifetime: ROUTE_LIFETIME.as_secs(),
            dest_lat,
            dest_lon,
        };
        let header = FrameHeader::new(
            Kind::RouteReply,
            identity.wire_id(),
            encode_node_id(orig),
            identity.next_seq(),
            0,
            MAX_TTL,
        );
        let body = serde_json::to_vec(&payload).expect("route reply payload always serializes");
        Frame::new(header, body)
    }

    /// Handle an inbound `RouteReply` received from `neighbor`.
    ///
    /// Installs/refreshes the forward route if `payload` is fresher,
    /// resolves a local discovery if this node is the originator, or
    /// forwards the reply one hop closer to the originator along the
    /// reverse route (failing with [`RouterError::NoReverseRoute`] if
    /// none exists, per §4.3).
    pub fn handle_route_reply(
        &mut self,
        frame: &Frame,
        neighbor: &str,
        now: I,
        identity: &mut NodeIdentity,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let payload: RouteReplyPayload = serde_json::from_slice(&frame.payload)
            .map_err(|e| RouterError::MalformedPayload(e.to_string()))?;

        let forward_hops = payload.hop_count.saturating_add(1);
        let install_forward = self
            .routes
            .get(&payload.dest)
            .is_none_or(|existing| existing.should_replace(payload.dest_seq, forward_hops));
        if install_forward {
            debug!(dest = %payload.dest, next_hop = %neighbor, hop_count = forward_hops, "installing forward route");
            self.routes.insert(
                payload.dest.clone(),
                RouteEntry {
                    dest: payload.dest.clone(),
                    next_hop: neighbor.to_string(),
                    hop_count: forward_hops,
                    dest_seq: payload.dest_seq,
                    expires_at: add_duration(now, Duration::from_secs(payload.lifetime)),
                    precursors: std::collections::HashSet::new(),
                },
            );
        }
        if payload.orig == self.self_id {
            let mut actions = Vec::new();
            if let Some(pending) = self.pending.remove(&payload.dest) {
                actions.push(RouterAction::DiscoveryResolved { dest: payload.dest, waiters: pending.waiters });
            }
            return Ok(actions);
        }

        let reverse = self
            .routes
            .get(&payload.orig)
            .ok_or_else(|| RouterError::NoReverseRoute { orig: payload.orig.clone() })?;
        let next_hop = reverse.next_hop.clone();

        // `next_hop` is who this reply is forwarded toward, i.e. the
        // node that will rely on our route to `dest` — the precursor
        // to notify if this route later breaks.
        if let Some(route) = self.routes.get_mut(&payload.dest) {
            route.precursors.insert(next_hop.clone());
        }

        let forward_payload = RouteReplyPayload { hop_count: forward_hops, ..payload };
        let header = FrameHeader::new(
            Kind::RouteReply,
            identity.wire_id(),
            encode_node_id(&next_hop),
            identity.next_seq(),
            0,
            MAX_TTL,
        );
        let body = serde_json::to_vec(&forward_payload).expect("route reply payload always serializes");
        Ok(vec![RouterAction::Send(Frame::new(header, body))])
    }

    /// Handle an inbound `RouteError` received from `neighbor`.
    ///
    /// Invalidates the local route to `unreachable_dest` only if it
    /// was routed through `neighbor` (§4.3), cascading the error to
    /// this node's own precursors.
    pub fn handle_route_error(&mut self, frame: &Frame, neighbor: &str, identity: &mut NodeIdentity) -> Vec<RouterAction> {
        let payload: RouteErrorPayload = match serde_json::from_slice(&frame.payload) {
            Ok(payload) => payload,
            Err(_) => return vec![],
        };

        let routed_through_neighbor =
            self.routes.get(&payload.unreachable_dest).is_some_and(|route| route.next_hop == neighbor);
        if !routed_through_neighbor {
            return vec![];
        }

        self.invalidate_route(&payload.unreachable_dest, payload.dest_seq, identity)
    }

    /// Remove the route to `dest` (if any) and propagate a
    /// `RouteError` to every precursor that had been using it.
    pub fn invalidate_route(&mut self, dest: &str, dest_seq: u32, identity: &mut NodeIdentity) -> Vec<RouterAction> {
        let Some(route) = self.routes.remove(dest) else {
            return vec![];
        };

        info!(dest, precursor_count = route.precursors.len(), "invalidating route");

        let payload = RouteErrorPayload { unreachable_dest: dest.to_string(), dest_seq };
        route
            .precursors
            .iter()
            .map(|precursor| {
                let header = FrameHeader::new(
                    Kind::RouteError,
                    identity.wire_id(),
                    encode_node_id(precursor),
                    identity.next_seq(),
                    0,
                    MAX_TTL,
                );
                let body = serde_json::to_vec(&payload).expect("route error payload always serializes");
                RouterAction::Send(Frame::new(header, body))
            })
            .collect()
    }

    /// Handle an inbound `Beacon`, refreshing the sender's neighbor
    /// record and reverse content index.
    pub fn handle_beacon(&mut self, frame: &Frame, now: I) -> Result<(), RouterError> {
        let payload: BeaconPayload =
            serde_json::from_slice(&frame.payload).map_err(|e| RouterError::MalformedPayload(e.to_string()))?;
        let sender = decode_node_id(&frame.header.src_bytes());
        self.neighbors.observe_beacon(
            &sender,
            payload.lat,
            payload.lon,
            payload.declared_bw,
            payload.declared_uptime,
            payload.content_hashes.into_iter().take(10).collect(),
            now,
        );
        Ok(())
    }

    /// Build this node's own beacon frame (§4.3 "Beacons"), capping
    /// advertised content hashes at 10.
    #[must_use]
    pub fn build_beacon(
        &self,
        identity: &mut NodeIdentity,
        lat: f64,
        lon: f64,
        declared_bw: u64,
        declared_uptime: f64,
        content_hashes: &[String],
    ) -> Frame {
        let payload = BeaconPayload {
            lat,
            lon,
            declared_bw,
            declared_uptime,
            content_hashes: content_hashes.iter().take(10).cloned().collect(),
        };
        let header =
            FrameHeader::new(Kind::Beacon, identity.wire_id(), BROADCAST_ADDR, identity.next_seq(), 0, 2);
        let body = serde_json::to_vec(&payload).expect("beacon payload always serializes");
        Frame::new(header, body)
    }

    /// Announce availability of `content_hash`, rate-limited on
    /// `content:<hash>`. Attaches a fresh [`mesh_proofs::FreshnessProof`]
    /// over `"broadcast:<hash>"`.
    pub fn announce<E: Environment<Instant = I>>(
        &self,
        content_hash: &str,
        identity: &mut NodeIdentity,
        rate_limiter: &mut crate::rate_limiter::RateLimiter<I>,
        env: &E,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let key = format!("content:{content_hash}");
        if !rate_limiter.check(&key, env.now()) {
            return Err(RouterError::RateLimited { key });
        }

        let proof = freshness::generate(env, &format!("broadcast:{content_hash}"), 5);
        let wire_proof = FreshnessProofWire::from(&proof);
        let payload = ContentAnnouncePayload {
            content_hash: content_hash.to_string(),
            freshness_proof: serde_json::to_value(wire_proof).expect("freshness proof always serializes"),
        };
        let header = FrameHeader::new(
            Kind::ContentAnnounce,
            identity.wire_id(),
            BROADCAST_ADDR,
            identity.next_seq(),
            0,
            MAX_TTL / 2,
        );
        let body = serde_json::to_vec(&payload).expect("content announce payload always serializes");
        Ok(vec![RouterAction::Send(Frame::new(header, body))])
    }

    /// Handle an inbound `ContentAnnounce`, verifying its freshness
    /// proof, indexing the sender as a provider on success, and
    /// re-broadcasting once if `ttl > 1 && hops < MAX_TTL` (§4.3).
    pub fn handle_content_announce(
        &mut self,
        frame: &Frame,
        neighbor: &str,
        now: I,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let payload: ContentAnnouncePayload =
            serde_json::from_slice(&frame.payload).map_err(|e| RouterError::MalformedPayload(e.to_string()))?;
        let wire_proof: FreshnessProofWire =
            serde_json::from_value(payload.freshness_proof).map_err(|e| RouterError::MalformedPayload(e.to_string()))?;

        freshness::verify_chain(&wire_proof.message_hash, &wire_proof.nonce_chain)
            .map_err(|e| RouterError::InvalidProof(e.to_string()))?;

        let (lat, lon, declared_bw, declared_uptime, mut content_hashes) = match self.neighbors.get(neighbor) {
            Some(record) => {
                (record.lat, record.lon, record.declared_bw, record.declared_uptime, record.content_hashes.clone())
            },
            None => (0.0, 0.0, 0, 0.0, Vec::new()),
        };
        if !content_hashes.contains(&payload.content_hash) {
            content_hashes.push(payload.content_hash.clone());
        }

        self.neighbors.observe_beacon(neighbor, lat, lon, declared_bw, declared_uptime, content_hashes, now);

        let mut header = frame.header;
        if header.ttl() > 1 && header.hops() < MAX_TTL {
            header.advance_hop();
            let body = frame.payload.clone();
            return Ok(vec![RouterAction::Send(Frame::new(header, body))]);
        }

        Ok(vec![])
    }

    /// Evict neighbors silent for more than
    /// [`NEIGHBOR_TIMEOUT_MULTIPLE`] beacon intervals, returning their
    /// ids.
    pub fn stale_neighbors(&mut self, now: I) -> Vec<String> {
        self.neighbors.evict_stale(now, neighbor_timeout())
    }

    /// Scan pending discoveries for timeout; rebroadcast up to
    /// [`MAX_DISCOVERY_RETRIES`] times, then abandon and fail waiters.
    pub fn check_discovery_timeouts(
        &mut self,
        now: I,
        identity: &mut NodeIdentity,
        self_lat: f64,
        self_lon: f64,
    ) -> Vec<RouterAction> {
        let timed_out: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.has_timed_out(now, DISCOVERY_TIMEOUT))
            .map(|(dest, _)| dest.clone())
            .collect();

        let mut actions = Vec::new();
        for dest in timed_out {
            let Some(mut pending) = self.pending.remove(&dest) else { continue };
            if pending.retries >= MAX_DISCOVERY_RETRIES {
                actions.push(RouterAction::DiscoveryFailed { dest, waiters: pending.waiters });
                continue;
            }

            pending.retries += 1;
            let rreq_id = identity.next_rreq_id();
            let orig_seq = u32::from(identity.next_seq());
            self.seen.insert(&self.self_id, rreq_id, now);
            let frame = self.build_route_request(rreq_id, &dest, 0, orig_seq, self_lat, self_lon, identity);
            pending.rreq_id = rreq_id;
            pending.started_at = now;
            self.pending.insert(dest, pending);
            actions.push(RouterAction::Send(frame));
        }
        actions
    }
}

fn add_duration<I: std::ops::Add<Duration, Output = I>>(now: I, duration: Duration) -> I {
    now + duration
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Clone)]
    struct FakeEnv {
        now: Duration,
        counter: std::rc::Rc<Cell<u8>>,
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
            let start = self.counter.get();
            self.counter.set(start.wrapping_add(1));
            buffer.fill(start);
        }
    }

    fn env(now: Duration) -> FakeEnv {
        FakeEnv { now, counter: std::rc::Rc::new(Cell::new(1)) }
    }

    fn identity(id: &str) -> NodeIdentity {
        NodeIdentity::new(id, [0u8; 32])
    }

    #[test]
    fn discover_broadcasts_route_request_when_no_route_known() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let mut id = identity("A");
        let actions = router.discover("C", Some(1), &mut id, Duration::ZERO, 0.0, 0.0);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], RouterAction::Send(_)));
    }

    #[test]
    fn second_discover_call_for_same_dest_just_queues_a_waiter() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let mut id = identity("A");
        router.discover("C", Some(1), &mut id, Duration::ZERO, 0.0, 0.0);
        let actions = router.discover("C", Some(2), &mut id, Duration::from_secs(1), 0.0, 0.0);
        assert!(actions.is_empty());
    }

    #[test]
    fn route_request_for_self_produces_a_route_reply() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("C");
        let mut id = identity("C");

        let req_payload = RouteRequestPayload {
            rreq_id: 1,
            dest: "C".into(),
            dest_seq_seen: 0,
            orig: "A".into(),
            orig_seq: 5,
            orig_lat: 0.0,
            orig_lon: 0.0,
        };
        let header = FrameHeader::new(Kind::RouteRequest, encode_node_id("B"), BROADCAST_ADDR, 0, 1, 9);
        let frame = Frame::new(header, serde_json::to_vec(&req_payload).unwrap());

        let actions = router.handle_route_request(&frame, "B", Duration::ZERO, &mut id, 0.0, 0.0).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], RouterAction::Send(_)));
        assert!(router.route_to("A", Duration::ZERO).is_some());
    }

    #[test]
    fn duplicate_route_request_is_dropped_silently() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("C");
        let mut id = identity("C");
        let req_payload = RouteRequestPayload {
            rreq_id: 1,
            dest: "C".into(),
            dest_seq_seen: 0,
            orig: "A".into(),
            orig_seq: 5,
            orig_lat: 0.0,
            orig_lon: 0.0,
        };
        let header = FrameHeader::new(Kind::RouteRequest, encode_node_id("B"), BROADCAST_ADDR, 0, 1, 9);
        let frame = Frame::new(header, serde_json::to_vec(&req_payload).unwrap());

        router.handle_route_request(&frame, "B", Duration::ZERO, &mut id, 0.0, 0.0).unwrap();
        let again = router.handle_route_request(&frame, "B", Duration::ZERO, &mut id, 0.0, 0.0).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn route_reply_to_originator_resolves_pending_discovery() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let mut id = identity("A");
        router.discover("C", Some(7), &mut id, Duration::ZERO, 0.0, 0.0);

        let reply_payload = RouteReplyPayload {
            dest: "C".into(),
            dest_seq: 1,
            orig: "A".into(),
            hop_count: 1,
            lifetime: 300,
            dest_lat: 0.0,
            dest_lon: 0.0,
        };
        let header = FrameHeader::new(Kind::RouteReply, encode_node_id("B"), encode_node_id("A"), 0, 1, 9);
        let frame = Frame::new(header, serde_json::to_vec(&reply_payload).unwrap());

        let actions = router.handle_route_reply(&frame, "B", Duration::from_secs(1), &mut id).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], RouterAction::DiscoveryResolved { dest, waiters } if dest == "C" && waiters == &vec![7]));
        assert!(router.route_to("C", Duration::from_secs(1)).is_some());
    }

    #[test]
    fn route_reply_without_reverse_route_is_rejected() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("X");
        let mut id = identity("X");
        let reply_payload = RouteReplyPayload {
            dest: "C".into(),
            dest_seq: 1,
            orig: "A".into(),
            hop_count: 1,
            lifetime: 300,
            dest_lat: 0.0,
            dest_lon: 0.0,
        };
        let header = FrameHeader::new(Kind::RouteReply, encode_node_id("B"), encode_node_id("X"), 0, 1, 9);
        let frame = Frame::new(header, serde_json::to_vec(&reply_payload).unwrap());

        let err = router.handle_route_reply(&frame, "B", Duration::ZERO, &mut id).unwrap_err();
        assert!(matches!(err, RouterError::NoReverseRoute { orig } if orig == "A"));
    }

    #[test]
    fn route_error_only_invalidates_when_routed_through_sender() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let mut id = identity("A");
        router.routes.insert(
            "C".into(),
            RouteEntry {
                dest: "C".into(),
                next_hop: "B".into(),
                hop_count: 2,
                dest_seq: 1,
                expires_at: Duration::from_secs(300),
                precursors: std::collections::HashSet::new(),
            },
        );

        let err_payload = RouteErrorPayload { unreachable_dest: "C".into(), dest_seq: 2 };
        let header = FrameHeader::new(Kind::RouteError, encode_node_id("D"), encode_node_id("A"), 0, 0, 9);
        let frame = Frame::new(header, serde_json::to_vec(&err_payload).unwrap());

        let actions = router.handle_route_error(&frame, "D", &mut id);
        assert!(actions.is_empty());
        assert!(router.route_to("C", Duration::ZERO).is_some());

        let header = FrameHeader::new(Kind::RouteError, encode_node_id("B"), encode_node_id("A"), 0, 0, 9);
        let frame = Frame::new(header, serde_json::to_vec(&err_payload).unwrap());
        router.handle_route_error(&frame, "B", &mut id);
        assert!(router.route_to("C", Duration::ZERO).is_none());
    }

    #[test]
    fn beacon_populates_neighbor_table() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let payload = BeaconPayload { lat: 1.0, lon: 2.0, declared_bw: 10, declared_uptime: 99.0, content_hashes: vec!["h".into()] };
        let header = FrameHeader::new(Kind::Beacon, encode_node_id("B"), BROADCAST_ADDR, 0, 0, 2);
        let frame = Frame::new(header, serde_json::to_vec(&payload).unwrap());

        router.handle_beacon(&frame, Duration::ZERO).unwrap();
        assert_eq!(router.neighbor_count(), 1);
        assert_eq!(router.providers_of("h"), vec!["B".to_string()]);
    }

    #[test]
    fn stale_neighbors_are_reported_after_timeout() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let payload = BeaconPayload { lat: 0.0, lon: 0.0, declared_bw: 0, declared_uptime: 0.0, content_hashes: vec![] };
        let header = FrameHeader::new(Kind::Beacon, encode_node_id("B"), BROADCAST_ADDR, 0, 0, 2);
        let frame = Frame::new(header, serde_json::to_vec(&payload).unwrap());
        router.handle_beacon(&frame, Duration::ZERO).unwrap();

        assert!(router.stale_neighbors(Duration::from_secs(30)).is_empty());
        assert_eq!(router.stale_neighbors(neighbor_timeout()), vec!["B".to_string()]);
    }

    #[test]
    fn announce_and_handle_round_trips_a_valid_content_proof() {
        let mut router_a: MeshRouter<Duration> = MeshRouter::new("A");
        let mut router_b: MeshRouter<Duration> = MeshRouter::new("B");
        let mut id = identity("A");
        let mut limiter: crate::rate_limiter::RateLimiter<Duration> = crate::rate_limiter::RateLimiter::new();
        let environment = env(Duration::ZERO);

        let actions = router_a.announce("hash123", &mut id, &mut limiter, &environment).unwrap();
        let RouterAction::Send(frame) = actions.into_iter().next().unwrap() else { panic!() };

        router_b.handle_content_announce(&frame, "A", Duration::ZERO).unwrap();
        assert_eq!(router_b.providers_of("hash123"), vec!["A".to_string()]);
    }

    #[test]
    fn announce_is_rate_limited_per_content_hash() {
        let mut router: MeshRouter<Duration> = MeshRouter::new("A");
        let mut id = identity("A");
        let mut limiter: crate::rate_limiter::RateLimiter<Duration> =
            crate::rate_limiter::RateLimiter::new().with_limit("content:h", 1, Duration::from_secs(60));
        let environment = env(Duration::ZERO);

        assert!(router.announce("h", &mut id, &mut limiter, &environment).is_ok());
        let err = router.announce("h", &mut id, &mut limiter, &environment).unwrap_err();
        assert!(matches!(err, RouterError::RateLimited { .. }));
    }
}
