// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Freshness Guard
//!
//! Relay-side defense against stale and replayed envelopes. Two checks, in
//! order:
//!
//! 1. the claimed timestamp must fall within the clock-skew window, and
//! 2. the nonce token must not have been seen before.
//!
//! Accepted tokens are recorded in a bounded, in-memory replay cache keyed
//! by `(nonce_token -> claimed_ts_ms)`. On every insert, entries whose
//! timestamp has fallen outside the skew window are purged: an envelope
//! carrying such a timestamp fails the skew check regardless, so dropping
//! them never reopens a replay window. A hard capacity bound remains as a
//! memory backstop. Nothing is ever persisted.

use std::collections::HashMap;

use super::error::ProtocolError;

/// Default clock-skew window in milliseconds.
pub const DEFAULT_SKEW_WINDOW_MS: i64 = 10_000;
/// Default replay-cache capacity backstop.
pub const DEFAULT_CACHE_CAPACITY: usize = 5_000;

/// Anti-replay state for one relay. Owned by the relay endpoint and
/// accessed under its lock; this type itself is single-threaded.
#[derive(Debug)]
pub struct FreshnessGuard {
    skew_window_ms: i64,
    capacity: usize,
    seen: HashMap<String, i64>,
}

impl FreshnessGuard {
    #[must_use]
    pub fn new(skew_window_ms: i64, capacity: usize) -> Self {
        Self {
            skew_window_ms,
            capacity,
            seen: HashMap::new(),
        }
    }

    /// Validate an envelope's freshness and record its nonce token.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::StaleOrFutureTimestamp`] when
    ///   `|now_ms - claimed_ts_ms|` exceeds the skew window
    /// - [`ProtocolError::ReplayDetected`] when the token is already cached
    pub fn check_and_record(
        &mut self,
        nonce_token: &str,
        claimed_ts_ms: i64,
        now_ms: i64,
    ) -> Result<(), ProtocolError> {
        if (now_ms - claimed_ts_ms).abs() > self.skew_window_ms {
            return Err(ProtocolError::StaleOrFutureTimestamp {
                claimed_ts_ms,
                now_ms,
            });
        }
        if self.seen.contains_key(nonce_token) {
            return Err(ProtocolError::ReplayDetected);
        }

        self.purge_expired(now_ms);
        if self.seen.len() >= self.capacity {
            // Memory backstop. Purging should keep the cache well below
            // capacity under normal clock behavior.
            tracing::warn!(
                capacity = self.capacity,
                "replay cache at capacity after purge, clearing"
            );
            self.seen.clear();
        }
        self.seen.insert(nonce_token.to_string(), claimed_ts_ms);
        Ok(())
    }

    /// Drop tokens whose claimed timestamp can no longer pass the skew
    /// check.
    fn purge_expired(&mut self, now_ms: i64) {
        let window = self.skew_window_ms;
        self.seen.retain(|_, ts| (now_ms - *ts).abs() <= window);
    }

    /// Number of tokens currently cached.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.seen.len()
    }
}

impl Default for FreshnessGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SKEW_WINDOW_MS, DEFAULT_CACHE_CAPACITY)
    }
}
