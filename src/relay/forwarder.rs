// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Upstream Forwarder
//!
//! Delivers sealed aggregates to the cloud collector with bounded retry:
//! up to [`MAX_ATTEMPTS`] tries per flush, exponential backoff from
//! [`BACKOFF_BASE`]. Aggregates that still fail land in the relay's
//! dead-letter queue and ride along on later ticks.

use std::time::Duration;

use reqwest::Client;

use crate::protocol::{AggregateEnvelope, ProtocolError};

/// Attempts per forwarding call before giving up on this tick.
pub const MAX_ATTEMPTS: u32 = 3;
/// First-retry backoff; doubles per attempt.
pub const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// POST a sealed aggregate to the sink's `/data` endpoint.
///
/// # Errors
///
/// Returns [`ProtocolError::UpstreamUnavailable`] once all attempts have
/// failed (network error or non-2xx response). The caller decides whether
/// to dead-letter the envelope; nothing here is fatal to the relay.
pub async fn forward_with_retry(
    client: &Client,
    cloud_url: &str,
    envelope: &AggregateEnvelope,
) -> Result<(), ProtocolError> {
    let url = format!("{}/data", cloud_url);
    let mut backoff = BACKOFF_BASE;
    let mut last_error = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match client.post(&url).json(envelope).send().await {
            Ok(resp) if resp.status().is_success() => {
                if attempt > 1 {
                    tracing::info!(attempt, "forwarded aggregate after retry");
                }
                return Ok(());
            }
            Ok(resp) => {
                last_error = format!("sink responded {}", resp.status());
            }
            Err(e) => {
                last_error = e.to_string();
            }
        }

        if attempt < MAX_ATTEMPTS {
            tracing::warn!(attempt, error = %last_error, "forwarding failed, backing off");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }

    Err(ProtocolError::UpstreamUnavailable(last_error))
}
