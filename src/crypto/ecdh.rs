// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Channel Key Derivation
//!
//! Derives the symmetric channel key for one hop from the local X25519
//! private scalar and the peer's wire-decoded public key:
//!
//! ```text
//! channel_key = HKDF-SHA256(X25519(local_priv, peer_pub),
//!                           salt = none,
//!                           info = "secure-fog-comm",
//!                           length = 32)
//! ```
//!
//! The derivation is pure: the same two public keys always produce the same
//! channel key, so both sides of a hop arrive at one secret. Keys are
//! recomputed per operation and never cached across messages.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::error::CryptoError;

/// Fixed HKDF context label. Distinct from any wire value; both endpoints
/// of every hop must agree on it.
const KDF_CONTEXT: &[u8] = b"secure-fog-comm";

/// Derive a 32-byte symmetric channel key from the local private scalar and
/// a peer's raw public key bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPeerKey`] when `peer_public_bytes` is not
/// 32 bytes or encodes a low-order point (the exchange would yield an
/// all-zero shared secret). Wire input is validated before use, never
/// trusted blindly.
pub fn derive_channel_key(
    local_secret: &StaticSecret,
    peer_public_bytes: &[u8],
) -> Result<[u8; 32], CryptoError> {
    // 1. Validate the peer public key length before touching the curve.
    let peer_bytes: [u8; 32] =
        peer_public_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPeerKey {
                reason: format!("expected 32 bytes, got {}", peer_public_bytes.len()),
            })?;
    let peer_public = X25519PublicKey::from(peer_bytes);

    // 2. Diffie-Hellman. A non-contributory result means the peer supplied
    //    a low-order point; reject it rather than derive a predictable key.
    let shared = local_secret.diffie_hellman(&peer_public);
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidPeerKey {
            reason: "low-order point (non-contributory exchange)".to_string(),
        });
    }

    // 3. Expand to the 32-byte channel key under the fixed context label.
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut channel_key = [0u8; 32];
    hkdf.expand(KDF_CONTEXT, &mut channel_key)
        .map_err(|e| CryptoError::KeyDerivationFailed {
            reason: e.to_string(),
        })?;

    Ok(channel_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::ConfidentialityKeyPair;

    #[test]
    fn test_key_agreement_symmetry() {
        let a = ConfidentialityKeyPair::generate();
        let b = ConfidentialityKeyPair::generate();

        let k_ab = derive_channel_key(a.secret(), &b.public_bytes()).unwrap();
        let k_ba = derive_channel_key(b.secret(), &a.public_bytes()).unwrap();
        assert_eq!(k_ab, k_ba, "both sides must derive the same channel key");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = ConfidentialityKeyPair::generate();
        let b = ConfidentialityKeyPair::generate();

        let k1 = derive_channel_key(a.secret(), &b.public_bytes()).unwrap();
        let k2 = derive_channel_key(a.secret(), &b.public_bytes()).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_wrong_length_peer_key_rejected() {
        let a = ConfidentialityKeyPair::generate();
        let err = derive_channel_key(a.secret(), &[0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPeerKey { .. }));
    }

    #[test]
    fn test_low_order_peer_key_rejected() {
        let a = ConfidentialityKeyPair::generate();
        // The identity point is the canonical low-order input.
        let err = derive_channel_key(a.secret(), &[0u8; 32]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPeerKey { .. }));
    }

    #[test]
    fn test_different_peers_yield_different_keys() {
        let a = ConfidentialityKeyPair::generate();
        let b = ConfidentialityKeyPair::generate();
        let c = ConfidentialityKeyPair::generate();

        let k_ab = derive_channel_key(a.secret(), &b.public_bytes()).unwrap();
        let k_ac = derive_channel_key(a.secret(), &c.public_bytes()).unwrap();
        assert_ne!(k_ab, k_ac);
    }
}
