// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Detached Ed25519 Signatures
//!
//! Signatures are always produced and verified over the decrypted
//! *plaintext*, never the ciphertext. A forged signature therefore cannot
//! be substituted onto a message without first breaking AEAD integrity.
//!
//! Signing lives on [`SigningKeyPair`](crate::crypto::keys::SigningKeyPair);
//! this module owns the wire-side verification path, where the public key
//! arrives as untrusted bytes.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use super::error::CryptoError;

/// Verify a 64-byte detached signature over `plaintext` under a peer's raw
/// 32-byte public key.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidSignature`] when the key bytes are not a
/// valid Ed25519 point, the signature bytes have the wrong length, or the
/// signature does not verify over the plaintext.
pub fn verify_signature(
    public_key_bytes: &[u8],
    plaintext: &[u8],
    signature_bytes: &[u8],
) -> Result<(), CryptoError> {
    let key_bytes: [u8; 32] =
        public_key_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature {
                reason: format!(
                    "signing public key: expected 32 bytes, got {}",
                    public_key_bytes.len()
                ),
            })?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidSignature {
            reason: format!("signing public key not a valid point: {}", e),
        })?;

    let sig_bytes: [u8; 64] =
        signature_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature {
                reason: format!(
                    "signature: expected 64 bytes, got {}",
                    signature_bytes.len()
                ),
            })?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(plaintext, &signature)
        .map_err(|_| CryptoError::InvalidSignature {
            reason: "signature does not verify over plaintext".to_string(),
        })
}
