//! Fixed 45-byte frame header (Big Endian wire order).
//!
//! Layout (§4.1):
//!
//! ```text
//! offset  size  field
//! 0       1     kind
//! 1       2     seq         (u16, big-endian)
//! 3       1     hops
//! 4       1     ttl
//! 5       16    src         (ASCII, null-padded)
//! 21      16    dst         (ASCII, null-padded; all-0xFF = broadcast)
//! 37      8     checksum    (first 8 bytes of sha256(header||src||dst||payload))
//! ```
//!
//! `fec_len` and the variable FEC/payload tail are not part of this
//! fixed struct — see [`crate::Frame`].

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    errors::{ProtocolError, Result},
    kind::Kind,
};

/// 16-byte node-id field reserved entirely for 0xFF, used to mark a
/// frame's destination as "all neighbors" rather than a specific node.
pub const BROADCAST_ADDR: [u8; 16] = [0xFF; 16];

/// Fixed 45-byte frame header.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    kind: u8,
    seq: [u8; 2],
    hops: u8,
    ttl: u8,
    src: [u8; 16],
    dst: [u8; 16],
    checksum: [u8; 8],
}

impl FrameHeader {
    /// Serialized size of the fixed header, in bytes.
    pub const SIZE: usize = 45;

    /// Build a new header. `checksum` is left zeroed — callers must
    /// call [`crate::Frame::new`], which computes and fills it.
    #[must_use]
    pub fn new(kind: Kind, src: [u8; 16], dst: [u8; 16], seq: u16, hops: u8, ttl: u8) -> Self {
        Self { kind: kind.to_u8(), seq: seq.to_be_bytes(), hops, ttl, src, dst, checksum: [0; 8] }
    }

    /// Parse a header from the front of `bytes`. Does not consume
    /// `bytes` — the caller is responsible for slicing off the
    /// remaining FEC/payload tail.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTooShort`] if fewer than
    /// [`Self::SIZE`] bytes are available, or
    /// [`ProtocolError::UnknownKind`] if the `kind` byte is not a
    /// recognized variant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, _rest) = Self::ref_from_prefix(bytes).map_err(|_| {
            ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() }
        })?;

        if Kind::from_u8(header.kind).is_none() {
            return Err(ProtocolError::UnknownKind(header.kind));
        }

        Ok(*header)
    }

    /// Serialize to the fixed 45-byte wire representation.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Frame kind. Always `Some` for a header constructed via
    /// [`Self::from_bytes`] or [`Self::new`].
    #[must_use]
    pub fn kind(&self) -> Option<Kind> {
        Kind::from_u8(self.kind)
    }

    /// Sequence number.
    #[must_use]
    pub fn seq(&self) -> u16 {
        u16::from_be_bytes(self.seq)
    }

    /// Hop count accumulated so far.
    #[must_use]
    pub fn hops(&self) -> u8 {
        self.hops
    }

    /// Remaining time-to-live.
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    /// Raw, null-padded source address bytes.
    #[must_use]
    pub fn src_bytes(&self) -> [u8; 16] {
        self.src
    }

    /// Raw, null-padded destination address bytes.
    #[must_use]
    pub fn dst_bytes(&self) -> [u8; 16] {
        self.dst
    }

    /// Whether this frame is addressed to the broadcast sentinel.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.dst == BROADCAST_ADDR
    }

    /// Checksum as carried on the wire.
    #[must_use]
    pub fn checksum(&self) -> [u8; 8] {
        self.checksum
    }

    /// Set the checksum field (used by [`crate::Frame::new`] after
    /// computing the digest).
    pub fn set_checksum(&mut self, checksum: [u8; 8]) {
        self.checksum = checksum;
    }

    /// Increment hop count and decrement TTL (both saturating),
    /// returning whether the frame may still be forwarded (`ttl > 0`
    /// after decrement).
    #[must_use]
    pub fn advance_hop(&mut self) -> bool {
        self.hops = self.hops.saturating_add(1);
        self.ttl = self.ttl.saturating_sub(1);
        self.ttl > 0
    }

    /// Bytes covering `kind || seq || hops || ttl` — the "header"
    /// term in the checksum formula `sha256(header||src||dst||payload)`.
    #[must_use]
    pub(crate) fn checksum_prefix(&self) -> [u8; 5] {
        let mut out = [0u8; 5];
        out[0] = self.kind;
        out[1..3].copy_from_slice(&self.seq);
        out[3] = self.hops;
        out[4] = self.ttl;
        out
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("kind", &self.kind())
            .field("seq", &self.seq())
            .field("hops", &self.hops())
            .field("ttl", &self.ttl())
            .field("broadcast", &self.is_broadcast())
            .finish_non_exhaustive()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

/// Encode a node-id string into the 16-byte null-padded wire field.
/// Truncates identifiers longer than 16 bytes.
#[must_use]
pub fn encode_node_id(id: &str) -> [u8; 16] {
    let mut out = [0u8; 16];
    let bytes = id.as_bytes();
    let len = bytes.len().min(16);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Decode a 16-byte null-padded wire field into a string, stripping
/// trailing NUL padding. Non-UTF8 content is replaced lossily rather
/// than rejected — malformed incoming frames must never panic.
#[must_use]
pub fn decode_node_id(bytes: &[u8; 16]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(16);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn header_size_is_45() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
    }

    #[test]
    fn node_id_round_trip() {
        let encoded = encode_node_id("node-a");
        assert_eq!(decode_node_id(&encoded), "node-a");
    }

    #[test]
    fn node_id_truncates_long_ids() {
        let long = "a".repeat(32);
        let encoded = encode_node_id(&long);
        assert_eq!(decode_node_id(&encoded), "a".repeat(16));
    }

    #[test]
    fn rejects_short_buffer() {
        let buf = [0u8; 10];
        assert!(matches!(
            FrameHeader::from_bytes(&buf),
            Err(ProtocolError::FrameTooShort { expected: 45, actual: 10 })
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut buf = [0u8; FrameHeader::SIZE];
        buf[0] = 0xAB;
        assert!(matches!(FrameHeader::from_bytes(&buf), Err(ProtocolError::UnknownKind(0xAB))));
    }

    #[test]
    fn advance_hop_stops_at_zero_ttl() {
        let mut header =
            FrameHeader::new(Kind::RouteRequest, encode_node_id("a"), encode_node_id("b"), 1, 0, 1);
        assert!(!header.advance_hop());
        assert_eq!(header.ttl(), 0);
        assert_eq!(header.hops(), 1);
    }

    proptest! {
        #[test]
        fn header_round_trip(
            kind_byte in prop::sample::select(vec![1u8,2,3,4,5,6,7,8,9]),
            seq in any::<u16>(),
            hops in any::<u8>(),
            ttl in any::<u8>(),
        ) {
            let kind = Kind::from_u8(kind_byte).unwrap();
            let header = FrameHeader::new(kind, encode_node_id("a"), encode_node_id("b"), seq, hops, ttl);
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).unwrap();
            prop_assert_eq!(parsed.seq(), seq);
            prop_assert_eq!(parsed.hops(), hops);
            prop_assert_eq!(parsed.ttl(), ttl);
            prop_assert_eq!(parsed.kind(), Some(kind));
        }
    }
}
