//! Errors surfaced by proof construction and verification (§4.4, §7).

use thiserror::Error;

/// Errors a verifier can raise when rejecting a proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The commitment was issued more than one hour ago.
    #[error("commitment expired: issued {age_secs}s ago, limit is {limit_secs}s")]
    CommitmentExpired {
        /// Age of the commitment in seconds.
        age_secs: u64,
        /// The freshness limit in seconds.
        limit_secs: u64,
    },

    /// A claimed numeric field fell outside its allowed range.
    #[error("claim out of range: {field} = {value}, expected {expected}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value, rendered as text.
        value: String,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },

    /// A hash chain failed to verify end to end.
    #[error("hash chain broken at index {index}")]
    ChainBreak {
        /// Index of the first link that failed to verify.
        index: usize,
    },

    /// A ring signature's declared size fell outside `[5, 1000]`.
    #[error("ring size {size} out of range [5, 1000]")]
    RingSizeOutOfRange {
        /// The offending ring size.
        size: u32,
    },

    /// A hex field did not have the expected width.
    #[error("structural width mismatch: {field} expected {expected_hex_chars} hex chars, got {actual_hex_chars}")]
    StructuralWidth {
        /// Name of the offending field.
        field: &'static str,
        /// Expected width in hex characters.
        expected_hex_chars: usize,
        /// Actual width in hex characters.
        actual_hex_chars: usize,
    },

    /// Challenge and response vectors disagreed in length, or a
    /// similar parallel-vector mismatch.
    #[error("vector length mismatch: {a_name} has {a_len}, {b_name} has {b_len}")]
    VectorLengthMismatch {
        /// Name of the first vector.
        a_name: &'static str,
        /// Length of the first vector.
        a_len: usize,
        /// Name of the second vector.
        b_name: &'static str,
        /// Length of the second vector.
        b_len: usize,
    },
}
