//! Wire Envelopes
//!
//! JSON bodies for the two hops, binary fields as standard base64 strings.
//! Decoding is strict: bad base64 or a wrong decoded length is a
//! `MalformedEnvelope` rejection, never a panic. Missing fields are caught
//! by serde before the handler runs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::error::ProtocolError;

/// `POST /exchange` body, meter -> fog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterEnvelope {
    /// Meter's X25519 public key (base64, 32 raw bytes).
    pub meter_public: String,
    /// Meter's Ed25519 public key (base64, 32 raw bytes).
    pub meter_sig_pub: String,
    /// Claimed send time, ms since epoch.
    pub ts: i64,
    /// Anti-replay nonce token (base64, 16 raw random bytes). Distinct from
    /// the AEAD nonce inside `encrypted_data`.
    pub nonce: String,
    /// Detached Ed25519 signature over the plaintext (base64, 64 raw bytes).
    pub signature: String,
    /// AEAD blob: 12-byte nonce || ciphertext || 16-byte tag (base64).
    pub encrypted_data: String,
}

/// `POST /data` body, fog -> cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateEnvelope {
    /// Fog's X25519 public key (base64, 32 raw bytes).
    pub fog_public: String,
    /// Fog's Ed25519 public key (base64, 32 raw bytes).
    pub fog_sig_pub: String,
    /// Detached Ed25519 signature over the aggregate plaintext (base64).
    pub signature: String,
    /// AEAD blob (base64).
    pub message: String,
}

/// `GET /public-key` response from the fog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FogPublicKey {
    pub fog_public: String,
}

/// `GET /public-key` response from the cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudPublicKey {
    pub cloud_public: String,
}

/// Decode a base64 field into raw bytes.
pub fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, ProtocolError> {
    BASE64
        .decode(value)
        .map_err(|e| ProtocolError::malformed(field, e))
}

/// Decode a base64 field that must contain exactly `N` raw bytes.
pub fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N], ProtocolError> {
    let bytes = decode_field(field, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        ProtocolError::malformed(field, format!("expected {} bytes, got {}", N, bytes.len()))
    })
}

/// Encode raw bytes for a wire field.
#[must_use]
pub fn encode_field(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
