//! Error types for frame parsing and FEC.

use thiserror::Error;

/// Result alias for fallible `mesh-proto` operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors surfaced while decoding or validating a [`crate::Frame`].
///
/// Decoding never panics on adversarial input: every malformed-input
/// path returns one of these variants rather than indexing out of
/// bounds or unwrapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer shorter than the fixed header, or truncated before the
    /// declared FEC/payload tail.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum bytes required to continue parsing.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Unrecognized `kind` byte.
    #[error("unknown frame kind: {0:#04x}")]
    UnknownKind(u8),

    /// Declared `fec_len` implies a payload/FEC split that would
    /// overflow the frame or the maximum wire size.
    #[error("frame too large: {size} bytes exceeds the {max}-byte radio ceiling")]
    FrameTooLarge {
        /// Computed total size.
        size: usize,
        /// Maximum permitted size.
        max: usize,
    },
}
