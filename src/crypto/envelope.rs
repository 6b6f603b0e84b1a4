//! AEAD Seal / Open
//!
//! ChaCha20-Poly1305 framing for one hop: a fresh random 12-byte nonce is
//! prepended to the ciphertext-plus-tag so the whole thing travels as a
//! single opaque blob. The hop's domain tag rides as associated data, which
//! binds the ciphertext to its channel: a blob sealed for the meter->fog
//! hop cannot be opened on the fog->cloud hop.
//!
//! **CRITICAL**: an AEAD nonce must never repeat under the same key. `seal`
//! draws a fresh nonce from the OS RNG on every call.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::error::CryptoError;

/// Domain tag binding ciphertexts to the meter->fog hop.
pub const SM_FN_TAG: &[u8] = b"SM-FN";
/// Domain tag binding ciphertexts to the fog->cloud hop.
pub const FN_CS_TAG: &[u8] = b"FN-CS";

/// AEAD nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Poly1305 authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key`, bound to `domain_tag`.
///
/// Returns `nonce || ciphertext || tag` as one blob for transport. The
/// nonce is freshly random per call.
///
/// # Errors
///
/// Fails only if the key is not 32 bytes; encryption itself cannot fail
/// with valid inputs.
pub fn seal(key: &[u8; 32], plaintext: &[u8], domain_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|e| CryptoError::KeyDerivationFailed {
            reason: format!("cipher init: {}", e),
        })?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: domain_tag,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed {
            reason: format!("encryption failed: {}", e),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `nonce || ciphertext || tag` blob bound to `domain_tag`.
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] when the blob is too short to
/// contain a nonce and tag, the authentication tag does not verify, or the
/// domain tag differs from the one used at seal time. A mismatched domain
/// tag models a message replayed into the wrong hop and is rejected whole;
/// no partial plaintext is ever returned.
pub fn open(key: &[u8; 32], blob: &[u8], domain_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::DecryptionFailed {
            reason: format!(
                "blob too short: {} bytes, need at least {}",
                blob.len(),
                NONCE_LEN + TAG_LEN
            ),
        });
    }

    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|e| CryptoError::KeyDerivationFailed {
            reason: format!("cipher init: {}", e),
        })?;

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: domain_tag,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed {
            reason: "authentication tag mismatch or wrong domain tag".to_string(),
        })
}
