//! Complete wire frame: fixed header + FEC block + payload.

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::{
    MAX_FRAME_SIZE,
    errors::{ProtocolError, Result},
    fec,
    header::FrameHeader,
};

/// A complete protocol frame as transmitted over the radio adapter.
///
/// Wire layout: `[header: 45 bytes] [fec_len: u16 BE] [fec: variable]
/// [payload: variable]`, bounded to [`MAX_FRAME_SIZE`] bytes total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Fixed frame header.
    pub header: FrameHeader,
    /// FEC parity + truncated checksum block (see [`fec::fec_encode`]).
    pub fec: Bytes,
    /// Application/control payload.
    pub payload: Bytes,
}

impl Frame {
    /// Build a frame, computing its FEC block and checksum from
    /// `payload`.
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let (_, fec_bytes) = fec::fec_encode(&payload);
        let checksum = compute_checksum(&header, &payload);
        header.set_checksum(checksum);

        Self { header, fec: Bytes::from(fec_bytes), payload }
    }

    /// Serialize the frame to wire bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FrameTooLarge`] if the encoded frame would
    /// exceed [`MAX_FRAME_SIZE`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let total = FrameHeader::SIZE + 2 + self.fec.len() + self.payload.len();
        if total > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge { size: total, max: MAX_FRAME_SIZE });
        }

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&self.header.to_bytes());
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.fec.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.fec);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse a frame from wire bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FrameTooShort`] if the buffer is truncated at
    /// any point (fixed header, `fec_len` field, or the declared
    /// FEC/payload tail).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let after_header = &bytes[FrameHeader::SIZE..];
        if after_header.len() < 2 {
            return Err(ProtocolError::FrameTooShort {
                expected: FrameHeader::SIZE + 2,
                actual: bytes.len(),
            });
        }

        let fec_len = u16::from_be_bytes([after_header[0], after_header[1]]) as usize;
        let tail = &after_header[2..];
        if tail.len() < fec_len {
            return Err(ProtocolError::FrameTooShort {
                expected: FrameHeader::SIZE + 2 + fec_len,
                actual: bytes.len(),
            });
        }

        let (fec_bytes, payload) = tail.split_at(fec_len);

        Ok(Self {
            header,
            fec: Bytes::copy_from_slice(fec_bytes),
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Recompute the checksum over the current header/payload and
    /// compare against the checksum carried in the header.
    #[must_use]
    pub fn verify(&self) -> bool {
        compute_checksum(&self.header, &self.payload) == self.header.checksum()
    }

    /// Attempt FEC repair of the payload in place, returning a new
    /// frame with the repaired payload and a recomputed header
    /// checksum. No-op (returns a clone) if the checksum already
    /// verifies or repair fails.
    #[must_use]
    pub fn repair(&self) -> Self {
        if self.verify() {
            return self.clone();
        }

        let repaired = fec::fec_decode(&self.payload, &self.fec);
        if repaired == self.payload.as_ref() {
            return self.clone();
        }

        let mut header = self.header;
        let checksum = compute_checksum(&header, &repaired);
        header.set_checksum(checksum);

        Self { header, fec: self.fec.clone(), payload: Bytes::from(repaired) }
    }
}

fn compute_checksum(header: &FrameHeader, payload: &[u8]) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(header.checksum_prefix());
    hasher.update(header.src_bytes());
    hasher.update(header.dst_bytes());
    hasher.update(payload);
    let digest = hasher.finalize();

    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}
