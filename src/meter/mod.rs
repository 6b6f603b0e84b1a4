// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Smart Meter (edge endpoint)
//!
//! Per-run identity: one X25519 key pair, one Ed25519 signing key pair, and
//! the fog's public key fetched once at startup. The channel key is derived
//! once per run (same two public keys always derive the same key).
//!
//! Per reading: serialize, sign the plaintext, seal under the `SM-FN`
//! domain tag, and assemble the wire envelope with a fresh 16-byte nonce
//! token and the current timestamp. Transport failures are logged, not
//! retried.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, Rng, RngCore};
use reqwest::Client;

use crate::crypto::{seal, ConfidentialityKeyPair, SigningKeyPair, SM_FN_TAG};
use crate::protocol::{
    decode_fixed, encode_field, now_ms, FogPublicKey, MeterEnvelope, ProtocolError, Reading,
};

/// One smart meter's per-run identity and channel state.
pub struct Meter {
    meter_id: String,
    keys: ConfidentialityKeyPair,
    signing: SigningKeyPair,
    channel_key: [u8; 32],
}

impl Meter {
    /// Create a meter with fresh keys, bound to the fog's public key.
    ///
    /// # Errors
    ///
    /// Fails if `fog_public` is a degenerate curve point.
    pub fn new(meter_id: impl Into<String>, fog_public: &[u8; 32]) -> Result<Self, ProtocolError> {
        let keys = ConfidentialityKeyPair::generate();
        let channel_key = keys.channel_key_with(fog_public)?;
        Ok(Self {
            meter_id: meter_id.into(),
            keys,
            signing: SigningKeyPair::generate(),
            channel_key,
        })
    }

    #[must_use]
    pub fn meter_id(&self) -> &str {
        &self.meter_id
    }

    /// Produce one randomized sample, simulator-style.
    #[must_use]
    pub fn sample(&self) -> Reading {
        let mut rng = rand::thread_rng();
        Reading {
            meter_id: self.meter_id.clone(),
            power_usage: round_to(rng.gen_range(4.5..6.5), 2),
            voltage: round_to(rng.gen_range(210.0..250.0), 1),
            timestamp_ms: now_ms(),
        }
    }

    /// Sign, seal, and envelope one reading for the meter->fog hop.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedEnvelope`] if the reading fails to
    /// serialize (should not happen for well-formed readings).
    pub fn envelope_for(&self, reading: &Reading) -> Result<MeterEnvelope, ProtocolError> {
        let plaintext =
            serde_json::to_vec(reading).map_err(|e| ProtocolError::malformed("reading", e))?;

        let signature = self.signing.sign(&plaintext);
        let blob = seal(&self.channel_key, &plaintext, SM_FN_TAG)?;

        let mut nonce_token = [0u8; 16];
        OsRng.fill_bytes(&mut nonce_token);

        Ok(MeterEnvelope {
            meter_public: encode_field(&self.keys.public_bytes()),
            meter_sig_pub: encode_field(&self.signing.public_bytes()),
            ts: now_ms(),
            nonce: encode_field(&nonce_token),
            signature: encode_field(&signature),
            encrypted_data: encode_field(&blob),
        })
    }

    /// Sample, envelope, and POST one reading to the fog.
    ///
    /// Transport failure is logged and swallowed; the next interval sends a
    /// fresh reading.
    pub async fn send_reading(&self, client: &Client, fog_url: &str) {
        let reading = self.sample();
        let envelope = match self.envelope_for(&reading) {
            Ok(env) => env,
            Err(e) => {
                tracing::error!(meter_id = %self.meter_id, error = %e, "failed to build envelope");
                return;
            }
        };

        let url = format!("{}/exchange", fog_url);
        match client.post(&url).json(&envelope).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(
                    meter_id = %self.meter_id,
                    power_kwh = reading.power_usage,
                    "sent reading"
                );
            }
            Ok(resp) => {
                tracing::warn!(meter_id = %self.meter_id, status = %resp.status(), "fog rejected reading");
            }
            Err(e) => {
                tracing::warn!(meter_id = %self.meter_id, error = %e, "failed to reach fog");
            }
        }
    }
}

/// Fetch the fog's confidentiality public key once at startup.
pub async fn fetch_fog_public(client: &Client, fog_url: &str) -> Result<[u8; 32]> {
    let url = format!("{}/public-key", fog_url);
    let resp: FogPublicKey = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("fetching fog public key from {}", url))?
        .json()
        .await
        .context("decoding fog public key response")?;

    let bytes = decode_fixed::<32>("fog_public", &resp.fog_public)
        .map_err(|e| anyhow::anyhow!("fog published a malformed public key: {}", e))?;
    Ok(bytes)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
