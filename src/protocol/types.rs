// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Telemetry Data Model
//!
//! `Reading` is produced by a meter, buffered by the fog relay, and folded
//! into an `Aggregate` by the relay's periodic task. Both travel only as
//! AEAD-sealed plaintext; neither is ever persisted.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, per the wire `ts` field.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// One meter sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub meter_id: String,
    /// Power usage in kWh.
    pub power_usage: f64,
    /// Line voltage in V.
    pub voltage: f64,
    pub timestamp_ms: i64,
}

/// Periodic roll-up of buffered readings, forwarded fog -> cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub relay_id: String,
    pub sample_count: usize,
    pub avg_power: f64,
    pub avg_voltage: f64,
    pub timestamp_ms: i64,
}

impl Aggregate {
    /// Fold a drained snapshot of readings into an aggregate.
    ///
    /// Returns `None` for an empty snapshot (the relay skips the tick).
    /// Averages are rounded for the wire: power to 2 decimals, voltage to 1.
    #[must_use]
    pub fn from_readings(relay_id: &str, readings: &[Reading], timestamp_ms: i64) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }
        let n = readings.len() as f64;
        let avg_power = readings.iter().map(|r| r.power_usage).sum::<f64>() / n;
        let avg_voltage = readings.iter().map(|r| r.voltage).sum::<f64>() / n;

        Some(Self {
            relay_id: relay_id.to_string(),
            sample_count: readings.len(),
            avg_power: round_to(avg_power, 2),
            avg_voltage: round_to(avg_voltage, 1),
            timestamp_ms,
        })
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
