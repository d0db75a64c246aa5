//! AES-256-GCM sealing/opening for secure session messages (§4.5).

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use thiserror::Error;

use crate::{IV_LEN, KEY_LEN};

/// Errors from AEAD sealing/opening.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AeadError {
    /// Authentication tag did not verify, or the ciphertext was
    /// otherwise malformed. Never distinguishes which, to avoid
    /// leaking an oracle.
    #[error("AEAD authentication failed")]
    AuthenticationFailed,
}

/// A sealed (encrypted + authenticated) message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// 96-bit IV used for this encryption. Must never repeat under the
    /// same session key (§3, §8 invariant #5).
    pub iv: [u8; IV_LEN],
    /// Ciphertext with the 128-bit GCM tag appended (the `aes-gcm`
    /// crate's standard combined output).
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `key` using the caller-supplied `iv`.
///
/// The caller is responsible for IV uniqueness per `(peer, session
/// key)` — see `mesh-secure`'s replay/session tracking, which is the
/// layer that owns that invariant.
#[must_use]
pub fn seal(key: &[u8; KEY_LEN], iv: [u8; IV_LEN], plaintext: &[u8]) -> SealedMessage {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(&iv);

    let Ok(ciphertext) = cipher.encrypt(nonce, plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail with valid key/nonce sizes");
    };

    SealedMessage { iv, ciphertext }
}

/// Decrypt and authenticate a [`SealedMessage`] under `key`.
///
/// # Errors
///
/// [`AeadError::AuthenticationFailed`] if the tag does not verify
/// (wrong key, tampered ciphertext, or wrong IV).
pub fn open(key: &[u8; KEY_LEN], message: &SealedMessage) -> Result<Vec<u8>, AeadError> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(&message.iv);

    cipher.decrypt(nonce, message.ciphertext.as_slice()).map_err(|_| AeadError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn key(seed: u8) -> [u8; KEY_LEN] {
        [seed; KEY_LEN]
    }

    #[test]
    fn seal_then_open_round_trips() {
        let k = key(1);
        let iv = [2u8; IV_LEN];
        let sealed = seal(&k, iv, b"route discovery payload");
        let opened = open(&k, &sealed).unwrap();
        assert_eq!(opened, b"route discovery payload");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = seal(&key(1), [0u8; IV_LEN], b"secret");
        let result = open(&key(2), &sealed);
        assert_eq!(result, Err(AeadError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let k = key(9);
        let mut sealed = seal(&k, [7u8; IV_LEN], b"payload");
        sealed.ciphertext[0] ^= 0xFF;
        assert_eq!(open(&k, &sealed), Err(AeadError::AuthenticationFailed));
    }

    #[test]
    fn different_ivs_produce_different_ciphertexts() {
        let k = key(3);
        let a = seal(&k, [0u8; IV_LEN], b"same plaintext");
        let b = seal(&k, [1u8; IV_LEN], b"same plaintext");
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    proptest! {
        #[test]
        fn round_trip_is_identity(plaintext in prop::collection::vec(any::<u8>(), 0..256), iv_seed in any::<u8>()) {
            let k = key(0x42);
            let sealed = seal(&k, [iv_seed; IV_LEN], &plaintext);
            let opened = open(&k, &sealed).unwrap();
            prop_assert_eq!(opened, plaintext);
        }
    }
}
