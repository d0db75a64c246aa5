//! XOR-stripe forward error correction (§4.1, §9 "Open questions").
//!
//! This is deliberately a weak code: it recovers only isolated
//! single-byte corruption within one payload, not burst errors. A
//! stronger code (Reed–Solomon) would be a drop-in replacement behind
//! [`fec_encode`]/[`fec_decode`] without touching callers.

use sha2::{Digest, Sha256};

/// Length, in bytes, of the truncated integrity checksum appended to
/// the parity block.
const CHECKSUM_LEN: usize = 4;

/// Nibble-swap a byte: high and low nibbles exchanged.
fn nibble_swap(b: u8) -> u8 {
    (b >> 4) | ((b & 0x0F) << 4)
}

/// Parity block length for a payload of the given size:
/// `max(4, ceil(len * 0.25))`.
#[must_use]
pub fn parity_len(payload_len: usize) -> usize {
    let scaled = (payload_len * 25).div_ceil(100);
    scaled.max(4)
}

/// Produce the FEC block for `payload`.
///
/// The FEC block is `parity_len(payload.len())` parity bytes followed
/// by a 4-byte truncated SHA-256 checksum of `payload`. Each payload
/// byte at index `i` is XOR-striped into parity position `i %
/// parity_len`, and a nibble-swapped copy is striped into position
/// `(i + 1) % parity_len`. Returns `(payload, fec)` — the payload is
/// handed back unchanged for call-site convenience.
#[must_use]
pub fn fec_encode(payload: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let len = parity_len(payload.len());
    let mut parity = vec![0u8; len];

    for (i, &b) in payload.iter().enumerate() {
        parity[i % len] ^= b;
        parity[(i + 1) % len] ^= nibble_swap(b);
    }

    let checksum = Sha256::digest(payload);
    parity.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    (payload.to_vec(), parity)
}

/// Attempt to recover `payload` given its accompanying `fec` block.
///
/// If the checksum carried in `fec` already matches `payload`, it is
/// returned unchanged. Otherwise this tries, for each byte position
/// `i`, reconstructing that byte by inverting both XOR stripes it
/// participates in (the primary stripe at slot `i % parity_len` and
/// the neighboring stripe that received `i`'s nibble-swapped copy),
/// assuming every *other* byte is correct, and accepts the first
/// candidate whose checksum matches. This exactly recovers any
/// single-byte substitution. On failure — more than one byte
/// corrupted, or a malformed/empty `fec` block — the original
/// (possibly still-corrupt) `payload` is returned unchanged; callers
/// decide whether to drop the frame.
#[must_use]
pub fn fec_decode(payload: &[u8], fec: &[u8]) -> Vec<u8> {
    if fec.len() < CHECKSUM_LEN {
        return payload.to_vec();
    }

    let (parity, checksum) = fec.split_at(fec.len() - CHECKSUM_LEN);
    let matches = |candidate: &[u8]| -> bool {
        let digest = Sha256::digest(candidate);
        digest[..CHECKSUM_LEN] == *checksum
    };

    if matches(payload) {
        return payload.to_vec();
    }

    if parity.is_empty() {
        return payload.to_vec();
    }

    let len = parity.len();
    for i in 0..payload.len() {
        let slot = i % len;

        // Contribution to parity[slot] from every byte other than `i`:
        // primary stripes (k % len == slot) plus nibble-swapped
        // secondary stripes ((k + 1) % len == slot).
        let mut known = parity[slot];
        for (k, &b) in payload.iter().enumerate() {
            if k == i {
                continue;
            }
            if k % len == slot {
                known ^= b;
            }
            if (k + 1) % len == slot {
                known ^= nibble_swap(b);
            }
        }

        let mut candidate = payload.to_vec();
        candidate[i] = known;
        if matches(&candidate) {
            return candidate;
        }
    }

    payload.to_vec()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn scenario_s1_single_byte_repair() {
        let payload = b"hello world";
        assert_eq!(parity_len(payload.len()), 4);

        let (_, fec) = fec_encode(payload);
        assert_eq!(fec.len(), 4 + CHECKSUM_LEN);

        let mut corrupted = payload.to_vec();
        corrupted[3] ^= 0xFF;
        assert_ne!(&corrupted[..], &payload[..]);

        let repaired = fec_decode(&corrupted, &fec);
        assert_eq!(repaired, payload);
    }

    #[test]
    fn unmodified_payload_round_trips() {
        let payload = b"the quick brown fox";
        let (_, fec) = fec_encode(payload);
        assert_eq!(fec_decode(payload, &fec), payload);
    }

    #[test]
    fn empty_payload() {
        let payload: &[u8] = b"";
        let (_, fec) = fec_encode(payload);
        assert_eq!(fec_decode(payload, &fec), payload);
    }

    #[test]
    fn unrecoverable_corruption_returns_input_unchanged() {
        // Corrupt every byte -> no single-substitution candidate can match.
        let payload = b"abcdefgh";
        let (_, fec) = fec_encode(payload);
        let corrupted: Vec<u8> = payload.iter().map(|b| b ^ 0xFF).collect();
        let result = fec_decode(&corrupted, &fec);
        assert_eq!(result, corrupted);
    }

    proptest! {
        #[test]
        fn round_trip_without_corruption(payload in prop::collection::vec(any::<u8>(), 0..64)) {
            let (_, fec) = fec_encode(&payload);
            prop_assert_eq!(fec_decode(&payload, &fec), payload);
        }

        #[test]
        fn single_byte_substitution_recovers_or_is_unrelated(
            payload in prop::collection::vec(any::<u8>(), 1..64),
            pos_seed in any::<usize>(),
            flip in 1u8..=255u8,
        ) {
            let pos = pos_seed % payload.len();
            let (_, fec) = fec_encode(&payload);

            let mut corrupted = payload.clone();
            corrupted[pos] ^= flip;

            let result = fec_decode(&corrupted, &fec);
            // Must be either the fully repaired original or the untouched
            // corrupted input -- never some unrelated byte string.
            prop_assert!(result == payload || result == corrupted);
        }
    }
}
