//! Node identity (§3).

use mesh_proto::encode_node_id;

/// Immutable per-process node identity.
///
/// Created at startup, destroyed at shutdown. Owns the counters used
/// to mint fresh sequence numbers and route-request ids; these are
/// the only mutable fields, and they only ever increase.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    node_id: String,
    static_secret: [u8; 32],
    next_seq: u16,
    next_rreq_id: u32,
}

impl NodeIdentity {
    /// Construct an identity from a textual node id and a 32-byte
    /// static secret. The id is truncated to 16 bytes on the wire;
    /// callers should keep it short enough to survive that.
    #[must_use]
    pub fn new(node_id: impl Into<String>, static_secret: [u8; 32]) -> Self {
        Self { node_id: node_id.into(), static_secret, next_seq: 0, next_rreq_id: 0 }
    }

    /// This node's textual id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// This node's id truncated/null-padded to the 16-byte wire form.
    #[must_use]
    pub fn wire_id(&self) -> [u8; 16] {
        encode_node_id(&self.node_id)
    }

    /// The static secret, used to derive per-peer session keys.
    #[must_use]
    pub fn static_secret(&self) -> &[u8; 32] {
        &self.static_secret
    }

    /// Mint the next outgoing 16-bit frame sequence number, wrapping
    /// on overflow (sequence numbers are a freshness hint, not a
    /// unique identifier, so wraparound is acceptable).
    pub fn next_seq(&mut self) -> u16 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Mint the next outgoing 32-bit route-request id.
    pub fn next_rreq_id(&mut self) -> u32 {
        let id = self.next_rreq_id;
        self.next_rreq_id = self.next_rreq_id.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let mut id = NodeIdentity::new("node-a", [0u8; 32]);
        assert_eq!(id.next_seq(), 0);
        assert_eq!(id.next_seq(), 1);
        assert_eq!(id.next_seq(), 2);
    }

    #[test]
    fn rreq_ids_increase_independently_of_seq() {
        let mut id = NodeIdentity::new("node-a", [0u8; 32]);
        id.next_seq();
        assert_eq!(id.next_rreq_id(), 0);
        assert_eq!(id.next_rreq_id(), 1);
    }

    #[test]
    fn wire_id_round_trips_through_encode() {
        let id = NodeIdentity::new("node-a", [0u8; 32]);
        assert_eq!(id.wire_id(), encode_node_id("node-a"));
    }

    #[test]
    fn seq_wraps_on_overflow() {
        let mut id = NodeIdentity::new("node-a", [0u8; 32]);
        for _ in 0..=u16::MAX {
            id.next_seq();
        }
        assert_eq!(id.next_seq(), 0);
    }
}
