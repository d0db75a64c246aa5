//! The node's action-pattern engine, following the same shape as
//! `mesh_net::MeshRouter`: all logic here is synchronous and I/O-free,
//! expressed as methods that return
//! [`NodeAction`]s for the binary's task loop to execute against a
//! [`crate::radio::RadioAdapter`] and [`crate::reward::RewardSink`].
//!
//! §7's recovery policy is load-bearing here: [`NodeDriver::handle_received_frame`]
//! never returns an `Err` — every receive-path failure becomes a
//! [`NodeAction::Log`] and the frame is dropped. Caller-initiated
//! operations (`discover`, `announce`, `send_data`, reward submission)
//! still surface their own errors, since a caller choosing to retry or
//! drop needs to know admission was denied (§5 backpressure).

use mesh_core::{Environment, NodeIdentity};
use mesh_net::{MeshRouter, RateLimiter, RetransmitManager, RouterAction};
use mesh_proto::{decode_node_id, encode_node_id, Frame, Kind};
use mesh_secure::quorum::{QuorumCoordinator, RewardClaim, VerifiedClaim, VerifierApproval};
use mesh_secure::{SecureMessage, SecureMessenger};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::radio::NodeTarget;
use crate::wire::{
    MintResultWire, RewardClaimWire, VerifierApprovalWire, KIND_TAG_DATA, KIND_TAG_MINT_RESULT, KIND_TAG_REWARD_CLAIM,
    KIND_TAG_VERIFIER_APPROVAL,
};

/// Severity attached to a [`NodeAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Fine-grained tracing, off by default.
    Debug,
    /// Routine state changes.
    Info,
    /// Recoverable anomalies (malformed input, rate limiting).
    Warn,
    /// A caller-visible failure that was still handled locally.
    Error,
}

/// One outcome of processing an event, for the binary to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    /// Hand an encoded frame to the radio.
    Transmit {
        /// The encoded frame bytes.
        bytes: Vec<u8>,
        /// Where to send it.
        target: NodeTarget,
    },
    /// A pending route discovery resolved; wake its waiters.
    DiscoveryResolved {
        /// The destination that is now reachable.
        dest: String,
        /// Waiter tokens registered against the discovery.
        waiters: Vec<u64>,
    },
    /// A pending route discovery was abandoned after exhausting
    /// retries; wake its waiters with a timeout outcome.
    DiscoveryFailed {
        /// The destination that could not be reached.
        dest: String,
        /// Waiter tokens registered against the discovery.
        waiters: Vec<u64>,
    },
    /// A decrypted application payload arrived from `sender`.
    DataDelivered {
        /// The peer that sent it.
        sender: String,
        /// The application-defined payload kind.
        kind_tag: String,
        /// The decrypted bytes.
        payload: Vec<u8>,
    },
    /// A reward claim reached quorum; hand it to the
    /// [`crate::reward::RewardSink`].
    VerifiedClaimReady(VerifiedClaim),
    /// Something worth recording happened; never fatal on its own.
    Log {
        /// Severity.
        level: LogLevel,
        /// Human-readable detail.
        message: String,
    },
}

fn log(level: LogLevel, message: impl Into<String>) -> NodeAction {
    NodeAction::Log { level, message: message.into() }
}

/// Derive an outgoing frame's radio target from its own header: the
/// broadcast sentinel, or the specific peer id it addresses.
fn target_of(frame: &Frame) -> NodeTarget {
    if frame.header.is_broadcast() {
        NodeTarget::Broadcast
    } else {
        NodeTarget::Peer(decode_node_id(&frame.header.dst_bytes()))
    }
}

/// Owns all per-node state: identity, the routing engine, rate
/// limiting, retransmission bookkeeping, secure sessions, and the
/// verifier quorum. One instance per running node (§9: no global
/// singletons).
pub struct NodeDriver<E: Environment> {
    identity: NodeIdentity,
    env: E,
    config: NodeConfig,
    router: MeshRouter<E::Instant>,
    rate_limiter: RateLimiter<E::Instant>,
    retransmit: RetransmitManager<E::Instant>,
    messenger: SecureMessenger<E::Instant>,
    quorum: QuorumCoordinator,
    next_approval_seq: u64,
}

impl<E: Environment> NodeDriver<E> {
    /// Construct a driver for `identity`, running against `env`.
    #[must_use]
    pub fn new(identity: NodeIdentity, env: E, config: NodeConfig) -> Self {
        let self_id = identity.node_id().to_string();
        Self {
            identity,
            env,
            config,
            router: MeshRouter::new(self_id.clone()),
            rate_limiter: RateLimiter::new(),
            retransmit: RetransmitManager::new(),
            messenger: SecureMessenger::new(self_id),
            quorum: QuorumCoordinator::new(),
            next_approval_seq: 0,
        }
    }

    /// This node's id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        self.identity.node_id()
    }

    /// Establish (or re-key) a secure session with `peer_id`.
    pub fn establish_session(&mut self, peer_id: &str, ephemeral_secret: &[u8], peer_static_hash: impl Into<String>) {
        self.messenger.establish(peer_id, ephemeral_secret, peer_static_hash);
    }

    /// Process one inbound frame off the radio. Never fails: every
    /// rejection becomes a logged, dropped frame (§7).
    pub fn handle_received_frame(&mut self, bytes: Vec<u8>) -> Vec<NodeAction> {
        let now = self.env.now();

        let frame = match Frame::decode(&bytes) {
            Ok(frame) => frame,
            Err(e) => return vec![log(LogLevel::Warn, format!("dropping undecodable frame: {e}"))],
        };

        let frame = if frame.verify() {
            frame
        } else {
            let repaired = frame.repair();
            if !repaired.verify() {
                return vec![log(LogLevel::Warn, "dropping frame with unrecoverable checksum mismatch")];
            }
            repaired
        };

        let Some(kind) = frame.header.kind() else {
            return vec![log(LogLevel::Warn, "dropping frame with unknown kind byte")];
        };

        let neighbor = decode_node_id(&frame.header.src_bytes());
        let admission_key = format!("peer:{neighbor}");
        if !self.rate_limiter.check(&admission_key, now) {
            return vec![log(LogLevel::Debug, format!("rate limited inbound frame from {neighbor}"))];
        }
        self.rate_limiter.record(&admission_key, now);

        match kind {
            Kind::RouteRequest => {
                match self.router.handle_route_request(&frame, &neighbor, now, &mut self.identity, self.config.self_lat, self.config.self_lon) {
                    Ok(actions) => self.router_frame_actions(actions),
                    Err(e) => vec![log(LogLevel::Warn, format!("route request from {neighbor} rejected: {e}"))],
                }
            },
            Kind::RouteReply => match self.router.handle_route_reply(&frame, &neighbor, now, &mut self.identity) {
                Ok(actions) => self.router_frame_actions(actions),
                Err(e) => vec![log(LogLevel::Warn, format!("route reply from {neighbor} rejected: {e}"))],
            },
            Kind::RouteError => {
                let actions = self.router.handle_route_error(&frame, &neighbor, &mut self.identity);
                self.router_frame_actions(actions)
            },
            Kind::Beacon => match self.router.handle_beacon(&frame, now) {
                Ok(()) => vec![log(LogLevel::Debug, format!("beacon refreshed from {neighbor}"))],
                Err(e) => vec![log(LogLevel::Warn, format!("beacon from {neighbor} rejected: {e}"))],
            },
            Kind::ContentAnnounce => match self.router.handle_content_announce(&frame, &neighbor, now) {
                Ok(actions) => {
                    let mut out = vec![log(LogLevel::Debug, format!("content announce indexed from {neighbor}"))];
                    out.extend(self.router_frame_actions(actions));
                    out
                },
                Err(e) => vec![log(LogLevel::Warn, format!("content announce from {neighbor} rejected: {e}"))],
            },
            Kind::Ack => {
                let acked = self.retransmit.ack(frame.header.seq());
                vec![log(LogLevel::Debug, format!("ack seq={} acknowledged={acked}", frame.header.seq()))]
            },
            Kind::Data => self.handle_data_frame(&frame, now),
            Kind::BandwidthProof | Kind::UptimeProof => {
                vec![log(LogLevel::Debug, "reward proof broadcasts are carried as secure Data payloads, ignoring raw broadcast")]
            },
        }
    }

    fn handle_data_frame(&mut self, frame: &Frame, now: E::Instant) -> Vec<NodeAction> {
        let secure_msg: SecureMessage = match serde_json::from_slice(&frame.payload) {
            Ok(msg) => msg,
            Err(e) => return vec![log(LogLevel::Warn, format!("dropping undecodable secure message: {e}"))],
        };

        let plaintext = match self.messenger.decrypt(&secure_msg, now, true) {
            Ok(plaintext) => plaintext,
            Err(e) => return vec![log(LogLevel::Warn, format!("secure message from {} rejected: {e}", secure_msg.sender))],
        };

        match secure_msg.kind_tag.as_str() {
            KIND_TAG_REWARD_CLAIM => self.handle_reward_claim(&secure_msg, &plaintext),
            KIND_TAG_VERIFIER_APPROVAL => self.handle_verifier_approval(&plaintext),
            KIND_TAG_MINT_RESULT => self.handle_mint_result(&plaintext),
            _ => vec![NodeAction::DataDelivered { sender: secure_msg.sender, kind_tag: secure_msg.kind_tag, payload: plaintext }],
        }
    }

    fn handle_reward_claim(&mut self, secure_msg: &SecureMessage, plaintext: &[u8]) -> Vec<NodeAction> {
        let wire: RewardClaimWire = match serde_json::from_slice(plaintext) {
            Ok(wire) => wire,
            Err(e) => return vec![log(LogLevel::Warn, format!("malformed reward claim from {}: {e}", secure_msg.sender))],
        };

        let proof_valid = wire.proof_payload.verify(self.config.min_bandwidth_bytes).is_ok();
        self.next_approval_seq = self.next_approval_seq.wrapping_add(1);
        let approval = VerifierApproval {
            verifier_id: self.identity.node_id().to_string(),
            claim_id: wire.claim_id.clone(),
            decision: if proof_valid { mesh_secure::quorum::ApprovalDecision::Approve } else { mesh_secure::quorum::ApprovalDecision::Reject },
            proof_valid,
            signed_at: self.next_approval_seq,
            signature: format!("sig:{}:{}", self.identity.node_id(), wire.claim_id),
        };

        let approval_wire = VerifierApprovalWire::from(&approval);
        let payload = match serde_json::to_vec(&approval_wire) {
            Ok(payload) => payload,
            Err(e) => return vec![log(LogLevel::Error, format!("failed to serialize verifier approval: {e}"))],
        };

        match self.encrypt_and_frame(&secure_msg.sender, KIND_TAG_VERIFIER_APPROVAL, &payload, None) {
            Ok(frame) => {
                let mut actions = vec![log(LogLevel::Info, format!("verified claim {} proof_valid={proof_valid}", wire.claim_id))];
                actions.extend(self.outgoing_frame_action(frame, NodeTarget::Peer(secure_msg.sender.clone())));
                actions
            },
            Err(e) => vec![log(LogLevel::Warn, format!("could not return verifier approval to {}: {e}", secure_msg.sender))],
        }
    }

    fn handle_verifier_approval(&mut self, plaintext: &[u8]) -> Vec<NodeAction> {
        let wire: VerifierApprovalWire = match serde_json::from_slice(plaintext) {
            Ok(wire) => wire,
            Err(e) => return vec![log(LogLevel::Warn, format!("malformed verifier approval: {e}"))],
        };
        let approval: VerifierApproval = wire.into();
        let claim_id = approval.claim_id.clone();
        match self.quorum.record_approval(approval) {
            Ok(Some(verified)) => vec![log(LogLevel::Info, format!("claim {claim_id} reached quorum")), NodeAction::VerifiedClaimReady(verified)],
            Ok(None) => vec![log(LogLevel::Debug, format!("recorded approval for claim {claim_id}"))],
            Err(e) => vec![log(LogLevel::Warn, format!("approval for claim {claim_id} rejected: {e}"))],
        }
    }

    fn handle_mint_result(&mut self, plaintext: &[u8]) -> Vec<NodeAction> {
        let wire: MintResultWire = match serde_json::from_slice(plaintext) {
            Ok(wire) => wire,
            Err(e) => return vec![log(LogLevel::Warn, format!("malformed mint result: {e}"))],
        };
        let claim_id = wire.claim_id.clone();
        match self.quorum.finalize(wire.into()) {
            Ok(()) => vec![log(LogLevel::Info, format!("claim {claim_id} finalized"))],
            Err(e) => vec![log(LogLevel::Warn, format!("mint result for claim {claim_id} rejected: {e}"))],
        }
    }

    /// Encode `frame` and turn it into a `Transmit` action, or a `Log`
    /// action if encoding fails (frames built by this node should
    /// never exceed `MAX_FRAME_SIZE`, but §7 treats that as a
    /// programmer error to report, not to panic on).
    fn outgoing_frame_action(&self, frame: Frame, target: NodeTarget) -> Vec<NodeAction> {
        match frame.encode() {
            Ok(bytes) => vec![NodeAction::Transmit { bytes, target }],
            Err(e) => vec![log(LogLevel::Error, format!("failed to encode outgoing frame: {e}"))],
        }
    }

    /// Originate (or join) a route discovery for `dest`.
    pub fn discover(&mut self, dest: &str, waiter: Option<u64>) -> Vec<NodeAction> {
        let now = self.env.now();
        let actions =
            self.router.discover(dest, waiter, &mut self.identity, now, self.config.self_lat, self.config.self_lon);
        self.router_frame_actions(actions)
    }

    /// Broadcast a content announcement for `content_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`mesh_net::RouterError::RateLimited`] if the
    /// per-content announce window denies admission (§5 backpressure:
    /// the caller decides whether to drop or retry).
    pub fn announce(&mut self, content_hash: &str) -> Result<Vec<NodeAction>, NodeError> {
        let actions = self.router.announce(content_hash, &mut self.identity, &mut self.rate_limiter, &self.env)?;
        Ok(self.router_frame_actions(actions))
    }

    /// Build and transmit this node's own beacon.
    pub fn beacon(&mut self, content_hashes: &[String]) -> Vec<NodeAction> {
        let frame = self.router.build_beacon(
            &mut self.identity,
            self.config.self_lat,
            self.config.self_lon,
            self.config.declared_bandwidth,
            self.config.declared_uptime,
            content_hashes,
        );
        self.outgoing_frame_action(frame, NodeTarget::Broadcast)
    }

    /// Resend any retransmit-table entries whose timer is due.
    pub fn retransmit_due(&mut self) -> Vec<NodeAction> {
        let now = self.env.now();
        self.retransmit
            .due(now)
            .into_iter()
            .map(|bytes| {
                let target = mesh_proto::FrameHeader::from_bytes(&bytes)
                    .map(|header| if header.is_broadcast() { NodeTarget::Broadcast } else { NodeTarget::Peer(decode_node_id(&header.dst_bytes())) })
                    .unwrap_or(NodeTarget::Broadcast);
                NodeAction::Transmit { bytes, target }
            })
            .collect()
    }

    /// Scan pending discoveries for timeout, rebroadcasting or
    /// abandoning them per `mesh_net`'s retry policy.
    pub fn check_discovery_timeouts(&mut self) -> Vec<NodeAction> {
        let now = self.env.now();
        let actions =
            self.router.check_discovery_timeouts(now, &mut self.identity, self.config.self_lat, self.config.self_lon);
        self.router_frame_actions(actions)
    }

    /// Evict neighbors silent past the stale threshold, returning
    /// their ids for the caller to log or act on.
    pub fn stale_neighbors(&mut self) -> Vec<String> {
        let now = self.env.now();
        self.router.stale_neighbors(now)
    }

    /// Encrypt `payload` for `peer_id` and wrap it into an outbound
    /// `Data` frame, tracking it for retransmission.
    ///
    /// # Errors
    ///
    /// Returns [`mesh_secure::SecureError::NoSession`] if no session
    /// with `peer_id` has been established.
    pub fn send_data(&mut self, peer_id: &str, payload: &[u8]) -> Result<Vec<NodeAction>, NodeError> {
        let frame = self.encrypt_and_frame(peer_id, KIND_TAG_DATA, payload, None)?;
        Ok(self.frame_into_transmit_and_track(frame, NodeTarget::Peer(peer_id.to_string())))
    }

    /// Submit a reward claim to each of `verifiers` over its
    /// established secure session.
    pub fn submit_reward_claim(&mut self, claim: &RewardClaim, verifiers: &[String]) -> Vec<NodeAction> {
        let wire = RewardClaimWire::from(claim);
        let payload = match serde_json::to_vec(&wire) {
            Ok(payload) => payload,
            Err(e) => return vec![log(LogLevel::Error, format!("failed to serialize reward claim: {e}"))],
        };

        let mut actions = Vec::new();
        for verifier in verifiers {
            match self.encrypt_and_frame(verifier, KIND_TAG_REWARD_CLAIM, &payload, None) {
                Ok(frame) => actions.extend(self.outgoing_frame_action(frame, NodeTarget::Peer(verifier.clone()))),
                Err(e) => actions.push(log(LogLevel::Warn, format!("could not submit claim to {verifier}: {e}"))),
            }
        }
        actions
    }

    /// Apply a mint confirmation, finalizing the referenced claim.
    pub fn confirm_mint(&mut self, result: mesh_secure::quorum::MintResult) -> Vec<NodeAction> {
        let claim_id = result.claim_id.clone();
        match self.quorum.finalize(result) {
            Ok(()) => vec![log(LogLevel::Info, format!("claim {claim_id} finalized"))],
            Err(e) => vec![log(LogLevel::Warn, format!("mint confirmation for {claim_id} rejected: {e}"))],
        }
    }

    fn encrypt_and_frame(
        &mut self,
        peer_id: &str,
        kind_tag: &str,
        payload: &[u8],
        proof: Option<mesh_secure::ProofWire>,
    ) -> Result<Frame, mesh_secure::SecureError> {
        let secure_msg = self.messenger.encrypt(&self.env, peer_id, kind_tag, payload, proof)?;
        let body = serde_json::to_vec(&secure_msg).unwrap_or_default();
        let header = mesh_proto::FrameHeader::new(
            Kind::Data,
            self.identity.wire_id(),
            encode_node_id(peer_id),
            self.identity.next_seq(),
            0,
            mesh_net::router::MAX_TTL,
        );
        Ok(Frame::new(header, body))
    }

    fn frame_into_transmit_and_track(&mut self, frame: Frame, target: NodeTarget) -> Vec<NodeAction> {
        let now = self.env.now();
        match frame.encode() {
            Ok(bytes) => {
                self.retransmit.track(frame.header.seq(), bytes.clone(), now);
                vec![NodeAction::Transmit { bytes, target }]
            },
            Err(e) => vec![log(LogLevel::Error, format!("failed to encode outgoing frame: {e}"))],
        }
    }

    /// Turn `RouterAction::Send` frames into `Transmit` actions,
    /// deriving each frame's target from its own header rather than a
    /// caller-supplied one (the router addresses replies/broadcasts
    /// itself).
    fn router_frame_actions(&self, actions: Vec<RouterAction>) -> Vec<NodeAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                RouterAction::Send(frame) => {
                    let target = target_of(&frame);
                    out.extend(self.outgoing_frame_action(frame, target));
                },
                RouterAction::DiscoveryResolved { dest, waiters } => out.push(NodeAction::DiscoveryResolved { dest, waiters }),
                RouterAction::DiscoveryFailed { dest, waiters } => out.push(NodeAction::DiscoveryFailed { dest, waiters }),
            }
        }
        out
    }
}
