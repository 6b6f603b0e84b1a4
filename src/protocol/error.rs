// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Protocol Error Taxonomy
//!
//! Every way a request can be rejected, in one enum. All per-request errors
//! are local to that request: they produce a rejection response and never
//! touch the reading buffer, the replay cache, or other in-flight requests.
//! Freshness checks (`StaleOrFutureTimestamp`, `ReplayDetected`) always run
//! before buffering, never after.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Rejection reasons for the relay and sink inbound pipelines.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// Sender's confidentiality public key failed validation.
    #[error("invalid peer key: {0}")]
    InvalidPeerKey(String),

    /// AEAD open failed (tag mismatch or wrong domain tag).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Detached signature does not verify over the plaintext.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Claimed timestamp falls outside the allowed clock-skew window.
    #[error("stale or future timestamp: claimed {claimed_ts_ms}, now {now_ms}")]
    StaleOrFutureTimestamp { claimed_ts_ms: i64, now_ms: i64 },

    /// Nonce token was already seen inside the replay window.
    #[error("replay detected")]
    ReplayDetected,

    /// Envelope field missing, undecodable, or the decrypted payload does
    /// not parse.
    #[error("malformed envelope field '{field}': {reason}")]
    MalformedEnvelope { field: String, reason: String },

    /// Forwarding to the upstream sink failed (relay-only). Logged, never
    /// fatal to the relay process.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl ProtocolError {
    /// Helper for envelope decode failures.
    pub fn malformed(field: &str, reason: impl ToString) -> Self {
        Self::MalformedEnvelope {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<CryptoError> for ProtocolError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPeerKey { reason } => ProtocolError::InvalidPeerKey(reason),
            CryptoError::DecryptionFailed { reason } => ProtocolError::DecryptionFailed(reason),
            CryptoError::InvalidSignature { reason } => ProtocolError::InvalidSignature(reason),
            CryptoError::KeyDerivationFailed { reason } => ProtocolError::InvalidPeerKey(reason),
        }
    }
}
