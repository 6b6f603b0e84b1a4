// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Cloud Collector (sink endpoint)
//!
//! Terminates the fog->cloud channel: derives the channel key from its own
//! private key and the fog's public key, opens the envelope under the
//! `FN-CS` domain tag, verifies the fog's signature over the decrypted
//! plaintext, and accepts the aggregate. Freshness enforcement is
//! relay-side only; this hop carries no replay cache.

use crate::crypto::{open, verify_signature, ConfidentialityKeyPair, FN_CS_TAG};
use crate::protocol::{decode_field, decode_fixed, Aggregate, AggregateEnvelope, ProtocolError};

/// The cloud collector's state: one confidentiality key pair per run.
pub struct CloudCollector {
    keys: ConfidentialityKeyPair,
}

impl CloudCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: ConfidentialityKeyPair::generate(),
        }
    }

    /// Base64 confidentiality public key, published at `GET /public-key`.
    #[must_use]
    pub fn public_key_b64(&self) -> String {
        self.keys.public_b64()
    }

    /// Process one inbound aggregate envelope from the fog.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedEnvelope`] on undecodable fields,
    /// [`ProtocolError::InvalidPeerKey`] / [`ProtocolError::DecryptionFailed`]
    /// / [`ProtocolError::InvalidSignature`] from the channel pipeline.
    pub fn handle_data(&self, envelope: &AggregateEnvelope) -> Result<Aggregate, ProtocolError> {
        let fog_public: [u8; 32] = decode_fixed("fog_public", &envelope.fog_public)?;
        let fog_sig_pub: [u8; 32] = decode_fixed("fog_sig_pub", &envelope.fog_sig_pub)?;
        let signature: [u8; 64] = decode_fixed("signature", &envelope.signature)?;
        let blob = decode_field("message", &envelope.message)?;

        let channel_key = self.keys.channel_key_with(&fog_public)?;
        let plaintext = open(&channel_key, &blob, FN_CS_TAG)?;

        verify_signature(&fog_sig_pub, &plaintext, &signature)?;

        let aggregate: Aggregate = serde_json::from_slice(&plaintext)
            .map_err(|e| ProtocolError::malformed("plaintext", e))?;

        tracing::info!(
            relay_id = %aggregate.relay_id,
            sample_count = aggregate.sample_count,
            avg_power = aggregate.avg_power,
            avg_voltage = aggregate.avg_voltage,
            "✅ accepted aggregate"
        );
        Ok(aggregate)
    }

    /// Raw public key bytes, for wiring a relay to this sink in tests.
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        self.keys.public_bytes()
    }
}

impl Default for CloudCollector {
    fn default() -> Self {
        Self::new()
    }
}
