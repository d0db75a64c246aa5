//! JSON payload shapes for routing control frames (§3, §6).
//!
//! Control frame kinds (`RouteRequest`, `RouteReply`, `RouteError`,
//! `Beacon`, `ContentAnnounce`) carry JSON bodies in [`Frame::payload`](mesh_proto::Frame::payload).
//! These structs are the Rust-side shape of those bodies (§3).

use serde::{Deserialize, Serialize};

/// `RouteRequest` payload, broadcast while discovering a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequestPayload {
    /// Route-request id, unique per `(orig, rreq_id)` pair.
    pub rreq_id: u32,
    /// Destination the request is discovering a route to.
    pub dest: String,
    /// Freshest destination sequence number the originator has seen.
    pub dest_seq_seen: u32,
    /// Originating node.
    pub orig: String,
    /// Originator's current sequence number.
    pub orig_seq: u32,
    /// Originator's latitude, for proximity-aware routing.
    pub orig_lat: f64,
    /// Originator's longitude.
    pub orig_lon: f64,
}

/// `RouteReply` payload, unicast back along the reverse route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReplyPayload {
    /// Destination this reply resolves a route to.
    pub dest: String,
    /// The destination's current sequence number.
    pub dest_seq: u32,
    /// Originator the reply is travelling back toward.
    pub orig: String,
    /// Hop count from the replier to `dest`.
    pub hop_count: u8,
    /// Route lifetime, in seconds, from the moment of reply.
    pub lifetime: u64,
    /// Destination latitude.
    pub dest_lat: f64,
    /// Destination longitude.
    pub dest_lon: f64,
}

/// `RouteError` payload, reporting an unreachable destination upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteErrorPayload {
    /// The destination that became unreachable.
    pub unreachable_dest: String,
    /// The unreachable destination's sequence number, incremented by one.
    pub dest_seq: u32,
}

/// `Beacon` payload, broadcast every `BEACON_INTERVAL_SECONDS` at TTL 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconPayload {
    /// Beacon sender's latitude.
    pub lat: f64,
    /// Beacon sender's longitude.
    pub lon: f64,
    /// Self-declared bandwidth contribution.
    pub declared_bw: u64,
    /// Self-declared uptime percentage.
    pub declared_uptime: f64,
    /// Up to 10 content hashes this node can currently serve.
    pub content_hashes: Vec<String>,
}

/// `ContentAnnounce` payload, advertising a piece of available content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnnouncePayload {
    /// Hash of the announced content.
    pub content_hash: String,
    /// A freshness proof over `"broadcast:<hash>"`, JSON-encoded.
    pub freshness_proof: serde_json::Value,
}

/// The wire-relevant subset of a [`mesh_proofs::FreshnessProof`]: the
/// hash chain and message binding, without the generic commitment (a
/// content announcement's freshness is judged by chain validity alone,
/// not a commitment age window — see [`mesh_proofs::freshness::verify_chain`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessProofWire {
    /// Hash of the announced message (here, `"broadcast:<hash>"`).
    pub message_hash: String,
    /// `sha256(message_hash || nonce_chain[0])`.
    pub timestamp_proof: String,
    /// Hash chain satisfying `chain[i+1] == sha256(chain[i])`.
    pub nonce_chain: Vec<String>,
}

impl<I> From<&mesh_proofs::FreshnessProof<I>> for FreshnessProofWire {
    fn from(proof: &mesh_proofs::FreshnessProof<I>) -> Self {
        Self {
            message_hash: proof.message_hash.clone(),
            timestamp_proof: proof.timestamp_proof.clone(),
            nonce_chain: proof.nonce_chain.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_request_round_trips_through_json() {
        let payload = RouteRequestPayload {
            rreq_id: 42,
            dest: "C".into(),
            dest_seq_seen: 0,
            orig: "A".into(),
            orig_seq: 1,
            orig_lat: 37.7,
            orig_lon: -122.4,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: RouteRequestPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn beacon_caps_at_ten_content_hashes_by_caller_contract() {
        let payload =
            BeaconPayload { lat: 0.0, lon: 0.0, declared_bw: 0, declared_uptime: 0.0, content_hashes: vec![] };
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: BeaconPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.content_hashes.len(), 0);
    }
}
