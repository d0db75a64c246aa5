//! Meshcore cryptographic primitives.
//!
//! Pure functions with deterministic outputs wherever possible; callers
//! provide random bytes (IVs, nonces, commitment nonces) so behavior is
//! reproducible under test.
//!
//! # Key lifecycle
//!
//! ```text
//! ephemeral secret + hash(self_id || peer_id) salt
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA256 (100k iterations) → session_key (32 bytes)
//!        │
//!        ▼
//! AES-256-GCM (96-bit IV, per-encrypt) → ciphertext + tag
//! ```
//!
//! # Security
//!
//! - Session keys are derived with a work factor (100k PBKDF2
//!   iterations) expensive enough to deter offline brute force of a
//!   weak ephemeral secret, matching §3's `SessionContext` contract.
//! - AEAD tag verification uses the `aes-gcm` crate's constant-time
//!   comparison; this crate never implements its own tag comparison.
//! - Key material implementing [`zeroize::Zeroize`] is wiped on drop.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod hash;
pub mod kdf;

pub use aead::{AeadError, SealedMessage, open, seal};
pub use hash::merkle_root;
pub use kdf::derive_session_key;

/// AEAD key size in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// AEAD nonce (IV) size in bytes (96-bit).
pub const IV_LEN: usize = 12;

/// AEAD authentication tag size in bytes (128-bit), included in the
/// ciphertext emitted by [`aead::seal`].
pub const TAG_LEN: usize = 16;
