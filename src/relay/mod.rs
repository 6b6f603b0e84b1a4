// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Fog Aggregator (relay endpoint)
//!
//! Terminates many inbound meter channels and one upstream channel to the
//! cloud collector. Every inbound envelope walks the pipeline
//!
//! ```text
//! Received -> KeyDerived -> Decrypted -> SignatureVerified
//!          -> FreshnessChecked -> Buffered
//! ```
//!
//! and any failed step short-circuits to a rejection without touching the
//! buffer or replay cache. A periodic task, decoupled from request
//! handling, drains the buffer, folds it into an [`Aggregate`], signs and
//! seals it under the fog->cloud channel key, and forwards it upstream.
//!
//! The reading buffer and the freshness guard are the only shared mutable
//! state; each sits behind its own lock, held only for the critical section
//! and never across network I/O.

pub mod buffer;
pub mod forwarder;

use std::collections::VecDeque;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::FogConfig;
use crate::crypto::{open, seal, verify_signature, ConfidentialityKeyPair, SigningKeyPair};
use crate::crypto::{FN_CS_TAG, SM_FN_TAG};
use crate::protocol::{
    decode_field, decode_fixed, encode_field, now_ms, Aggregate, AggregateEnvelope,
    FreshnessGuard, MeterEnvelope, ProtocolError, Reading,
};

pub use buffer::ReadingBuffer;
pub use forwarder::forward_with_retry;

/// The fog aggregator's state: per-run identity, buffered readings,
/// anti-replay state, and the upstream dead-letter queue.
pub struct FogNode {
    keys: ConfidentialityKeyPair,
    signing: SigningKeyPair,
    config: FogConfig,
    cloud_public: [u8; 32],
    buffer: ReadingBuffer,
    freshness: Mutex<FreshnessGuard>,
    dead_letters: Mutex<VecDeque<AggregateEnvelope>>,
    http: Client,
}

impl FogNode {
    /// Build a fog node with fresh per-run identity keys.
    ///
    /// `cloud_public` is the sink's confidentiality public key, fetched
    /// once at startup.
    pub fn new(config: FogConfig, cloud_public: [u8; 32]) -> Result<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        let freshness = FreshnessGuard::new(config.max_skew_ms, config.replay_cache_cap);

        Ok(Self {
            keys: ConfidentialityKeyPair::generate(),
            signing: SigningKeyPair::generate(),
            config,
            cloud_public,
            buffer: ReadingBuffer::new(),
            freshness: Mutex::new(freshness),
            dead_letters: Mutex::new(VecDeque::new()),
            http,
        })
    }

    /// Base64 confidentiality public key, published at `GET /public-key`.
    #[must_use]
    pub fn public_key_b64(&self) -> String {
        self.keys.public_b64()
    }

    /// Process one inbound meter envelope.
    ///
    /// Returns the buffered reading on success so callers can log it.
    ///
    /// # Errors
    ///
    /// Any [`ProtocolError`] from the pipeline. Rejections never reach the
    /// buffer, and freshness rejections never record the nonce.
    pub async fn handle_exchange(&self, envelope: &MeterEnvelope) -> Result<Reading, ProtocolError> {
        // Strict wire decode first; anything undecodable is malformed.
        let meter_public: [u8; 32] = decode_fixed("meter_public", &envelope.meter_public)?;
        let meter_sig_pub: [u8; 32] = decode_fixed("meter_sig_pub", &envelope.meter_sig_pub)?;
        let signature: [u8; 64] = decode_fixed("signature", &envelope.signature)?;
        let _nonce_bytes: [u8; 16] = decode_fixed("nonce", &envelope.nonce)?;
        let blob = decode_field("encrypted_data", &envelope.encrypted_data)?;

        // KeyDerived -> Decrypted: open under the meter->fog domain tag.
        let channel_key = self.keys.channel_key_with(&meter_public)?;
        let plaintext = open(&channel_key, &blob, SM_FN_TAG)?;

        // SignatureVerified: always over the decrypted plaintext.
        verify_signature(&meter_sig_pub, &plaintext, &signature)?;

        // FreshnessChecked: skew window, then nonce uniqueness.
        {
            let mut guard = self.freshness.lock().await;
            guard.check_and_record(&envelope.nonce, envelope.ts, now_ms())?;
        }

        // Buffered.
        let reading: Reading = serde_json::from_slice(&plaintext)
            .map_err(|e| ProtocolError::malformed("plaintext", e))?;
        self.buffer.push(reading.clone()).await;

        tracing::info!(
            meter_id = %reading.meter_id,
            power_kwh = reading.power_usage,
            voltage = reading.voltage,
            "📩 buffered meter reading"
        );
        Ok(reading)
    }

    /// One aggregation tick: retry dead letters, then drain and forward.
    pub async fn flush_tick(&self) {
        self.retry_dead_letters().await;

        let readings = self.buffer.drain().await;
        let Some(aggregate) = Aggregate::from_readings(&self.config.fog_id, &readings, now_ms())
        else {
            return;
        };

        tracing::info!(
            sample_count = aggregate.sample_count,
            avg_power = aggregate.avg_power,
            avg_voltage = aggregate.avg_voltage,
            "📦 aggregated readings for the cloud"
        );

        match self.seal_aggregate(&aggregate) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => tracing::error!(error = %e, "failed to seal aggregate"),
        }
    }

    /// Sign and seal an aggregate under the fog->cloud channel.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidPeerKey`] if the configured cloud public key
    /// is degenerate.
    pub fn seal_aggregate(&self, aggregate: &Aggregate) -> Result<AggregateEnvelope, ProtocolError> {
        let plaintext = serde_json::to_vec(aggregate)
            .map_err(|e| ProtocolError::malformed("aggregate", e))?;

        let channel_key = self.keys.channel_key_with(&self.cloud_public)?;
        let signature = self.signing.sign(&plaintext);
        let blob = seal(&channel_key, &plaintext, FN_CS_TAG)?;

        Ok(AggregateEnvelope {
            fog_public: encode_field(&self.keys.public_bytes()),
            fog_sig_pub: encode_field(&self.signing.public_bytes()),
            signature: encode_field(&signature),
            message: encode_field(&blob),
        })
    }

    /// Run the periodic aggregation task until `shutdown` fires.
    ///
    /// Cancellation is cooperative: an in-flight tick finishes its drain
    /// and forward before the task exits.
    pub async fn run_aggregator(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.aggregate_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("aggregation task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush_tick().await;
                }
            }
        }
    }

    async fn dispatch(&self, envelope: AggregateEnvelope) {
        match forward_with_retry(&self.http, &self.config.cloud_url, &envelope).await {
            Ok(()) => tracing::info!("✅ forwarded aggregate to cloud"),
            Err(e) => {
                tracing::warn!(error = %e, "upstream unavailable, dead-lettering aggregate");
                self.push_dead_letter(envelope).await;
            }
        }
    }

    async fn retry_dead_letters(&self) {
        loop {
            let next = {
                let mut queue = self.dead_letters.lock().await;
                queue.pop_front()
            };
            let Some(envelope) = next else { break };

            if let Err(e) =
                forward_with_retry(&self.http, &self.config.cloud_url, &envelope).await
            {
                tracing::warn!(error = %e, "dead-letter retry failed, keeping queued");
                let mut queue = self.dead_letters.lock().await;
                queue.push_front(envelope);
                break;
            }
            tracing::info!("✅ delivered dead-lettered aggregate");
        }
    }

    /// Queue a failed aggregate, dropping the oldest entry at capacity so
    /// memory stays bounded.
    pub async fn push_dead_letter(&self, envelope: AggregateEnvelope) {
        let mut queue = self.dead_letters.lock().await;
        if queue.len() >= self.config.dead_letter_cap {
            queue.pop_front();
            tracing::warn!(
                cap = self.config.dead_letter_cap,
                "dead-letter queue full, dropped oldest aggregate"
            );
        }
        queue.push_back(envelope);
    }

    /// Readings currently buffered (diagnostics and tests).
    pub async fn buffered(&self) -> usize {
        self.buffer.len().await
    }

    /// Dead-lettered aggregates currently queued.
    pub async fn dead_lettered(&self) -> usize {
        self.dead_letters.lock().await.len()
    }

    /// Drain the buffer directly (used by tests that bypass the timer).
    pub async fn drain_buffer(&self) -> Vec<Reading> {
        self.buffer.drain().await
    }

    #[must_use]
    pub fn fog_id(&self) -> &str {
        &self.config.fog_id
    }
}
