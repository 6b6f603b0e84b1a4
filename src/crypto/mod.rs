// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Channel Crypto
//!
//! Cryptographic primitives for the telemetry relay's per-hop secure
//! channels:
//!
//! - **Keys**: X25519 confidentiality key pairs and Ed25519 signing key
//!   pairs, one set per endpoint identity per process lifetime
//! - **ECDH**: channel key derivation (X25519 + HKDF-SHA256 under a fixed
//!   context label)
//! - **Envelope**: ChaCha20-Poly1305 seal/open with the hop's domain tag as
//!   associated data
//! - **Signature**: detached Ed25519 signatures over plaintext
//!
//! ## Security Considerations
//!
//! - Private key material lives in memory only and is never persisted
//! - AEAD nonces are freshly random per seal and never reused under a key
//! - Wire-decoded public keys are validated before use
//! - Signatures verify over decrypted plaintext, never ciphertext

pub mod ecdh;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod signature;

pub use ecdh::derive_channel_key;
pub use envelope::{open, seal, FN_CS_TAG, NONCE_LEN, SM_FN_TAG, TAG_LEN};
pub use error::CryptoError;
pub use keys::{ConfidentialityKeyPair, SigningKeyPair};
pub use signature::verify_signature;
