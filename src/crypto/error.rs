// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Failure classes for the channel-crypto layer. Every variant carries the
//! specific reason so rejections can be logged without re-deriving context.
//!
//! - **InvalidPeerKey**: wire-decoded public key bytes are not a usable key
//! - **DecryptionFailed**: AEAD open failed (tag mismatch, wrong domain tag,
//!   truncated blob)
//! - **InvalidSignature**: detached signature does not verify over plaintext
//! - **KeyDerivationFailed**: HKDF expansion failed (should not happen with
//!   a 32-byte output length)

use thiserror::Error;

/// Error type for key agreement, AEAD, and signature operations.
#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    /// Peer public key bytes from the wire are malformed or degenerate.
    ///
    /// Raised on wrong length or when the Diffie-Hellman exchange produces
    /// a non-contributory (all-zero) shared secret, which indicates a
    /// low-order point was supplied.
    #[error("invalid peer public key: {reason}")]
    InvalidPeerKey { reason: String },

    /// AEAD decryption failed.
    ///
    /// Covers authentication tag mismatch, a domain tag that differs from
    /// the one used at seal time, and blobs too short to contain a nonce
    /// and tag.
    #[error("decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    /// Ed25519 signature verification failed.
    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },

    /// HKDF key derivation failed.
    #[error("key derivation failed: {reason}")]
    KeyDerivationFailed { reason: String },
}
