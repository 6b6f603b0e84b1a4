// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint Key Pairs
//!
//! Two independent key pairs per endpoint role:
//!
//! - `ConfidentialityKeyPair`: X25519 keys for channel key agreement.
//!   Generated once per process lifetime; the private scalar never leaves
//!   the owning endpoint and is never persisted.
//! - `SigningKeyPair`: Ed25519 keys for detached signatures over plaintext.
//!   The meter signs on the meter->fog hop; the fog signs on the fog->cloud
//!   hop.
//!
//! Key generation uses the OS random number generator. Entropy exhaustion
//! is the only process-fatal failure in the system.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::error::CryptoError;

/// X25519 key pair for confidentiality (channel key agreement).
pub struct ConfidentialityKeyPair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl ConfidentialityKeyPair {
    /// Generates a fresh key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Returns the private scalar for key agreement.
    ///
    /// Only `derive_channel_key` should consume this; never log or
    /// serialize it.
    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Derive the symmetric channel key shared with a peer.
    ///
    /// Convenience over [`derive_channel_key`](super::ecdh::derive_channel_key)
    /// that keeps the private scalar inside this type.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPeerKey`] for malformed or degenerate
    /// peer key bytes.
    pub fn channel_key_with(&self, peer_public_bytes: &[u8]) -> Result<[u8; 32], CryptoError> {
        super::ecdh::derive_channel_key(&self.secret, peer_public_bytes)
    }

    /// Raw 32-byte public key, as exported to peers.
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Base64-encoded public key, as published at `GET /public-key`.
    #[must_use]
    pub fn public_b64(&self) -> String {
        BASE64.encode(self.public.as_bytes())
    }
}

impl fmt::Debug for ConfidentialityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        let bytes = self.public.as_bytes();
        write!(
            f,
            "ConfidentialityKeyPair(pub {:02x}{:02x}{:02x}{:02x}...)",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}

/// Ed25519 key pair for plaintext authenticity.
pub struct SigningKeyPair {
    signing: SigningKey,
}

impl SigningKeyPair {
    /// Generates a fresh signing key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Signs a plaintext, returning the 64-byte detached signature.
    #[must_use]
    pub fn sign(&self, plaintext: &[u8]) -> [u8; 64] {
        self.signing.sign(plaintext).to_bytes()
    }

    /// Public verification key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Raw 32-byte public key bytes for the wire envelope.
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.public_bytes();
        write!(
            f,
            "SigningKeyPair(pub {:02x}{:02x}{:02x}{:02x}...)",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}
