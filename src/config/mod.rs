// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Process Configuration
//!
//! Environment-driven configuration with defaults for all three processes.
//! Values come from the environment (a `.env` file is honored at startup);
//! unparseable values fall back to the default rather than aborting.

use std::env;
use std::str::FromStr;
use std::time::Duration;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Fog aggregator configuration.
#[derive(Debug, Clone)]
pub struct FogConfig {
    pub port: u16,
    pub cloud_url: String,
    pub fog_id: String,
    /// Maximum allowed |now - claimed_ts| on inbound meter envelopes.
    pub max_skew_ms: i64,
    pub replay_cache_cap: usize,
    pub aggregate_interval: Duration,
    pub http_timeout: Duration,
    pub dead_letter_cap: usize,
}

impl FogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_or("FOG_PORT", 8001),
            cloud_url: env_or("CLOUD_URL", "http://127.0.0.1:8002".to_string()),
            fog_id: env_or("FOG_ID", "FN-01".to_string()),
            max_skew_ms: env_or("MAX_SKEW_MS", 10_000),
            replay_cache_cap: env_or("REPLAY_CACHE_CAP", 5_000),
            aggregate_interval: Duration::from_secs(env_or("AGGREGATE_INTERVAL_SECS", 10)),
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 5)),
            dead_letter_cap: env_or("DEAD_LETTER_CAP", 64),
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            cloud_url: "http://127.0.0.1:8002".to_string(),
            fog_id: "FN-01".to_string(),
            max_skew_ms: 10_000,
            replay_cache_cap: 5_000,
            aggregate_interval: Duration::from_secs(10),
            http_timeout: Duration::from_secs(5),
            dead_letter_cap: 64,
        }
    }
}

/// Cloud collector configuration.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub port: u16,
}

impl CloudConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_or("CLOUD_PORT", 8002),
        }
    }
}

/// Meter simulator configuration.
#[derive(Debug, Clone)]
pub struct MeterSimConfig {
    pub fog_url: String,
    pub num_meters: usize,
    pub send_interval: Duration,
    pub http_timeout: Duration,
}

impl MeterSimConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            fog_url: env_or("FOG_URL", "http://127.0.0.1:8001".to_string()),
            num_meters: env_or("NUM_METERS", 10),
            send_interval: Duration::from_secs(env_or("SEND_INTERVAL_SECS", 5)),
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 5)),
        }
    }
}
