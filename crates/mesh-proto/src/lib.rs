//! Wire framing and forward error correction for the meshcore radio link.
//!
//! A [`Frame`] is the unit of transmission over the narrowband radio
//! adapter: a small fixed header (kind, sequencing, routing addresses,
//! checksum), an optional FEC parity block, and a variable-length
//! payload. Frames never exceed 200 bytes on the wire — the hard
//! payload ceiling of the underlying radio link.
//!
//! This crate only handles structural framing. It does not interpret
//! payload contents (JSON control frames, CBOR, ciphertext); callers in
//! `mesh-net` and `mesh-secure` own that.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod fec;
mod frame;
mod header;
mod kind;

pub use errors::{ProtocolError, Result};
pub use fec::{fec_decode, fec_encode};
pub use frame::Frame;
pub use header::{decode_node_id, encode_node_id, FrameHeader, BROADCAST_ADDR};
pub use kind::Kind;

/// Maximum serialized frame size in bytes, the hard payload ceiling of
/// the radio link.
pub const MAX_FRAME_SIZE: usize = 200;

/// Size of the fixed frame header before the variable FEC/payload tail.
pub const HEADER_SIZE: usize = FrameHeader::SIZE;
