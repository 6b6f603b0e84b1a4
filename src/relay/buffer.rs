// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Reading Buffer
//!
//! Shared buffer of decrypted, authenticated readings awaiting aggregation.
//! The container lives behind this type's own lock and is never exposed:
//! the inbound handler may only `push`, the aggregation task may only
//! `drain`. `drain` snapshots and clears in one critical section, so no
//! reading is double-counted or lost between snapshot and clear.

use std::mem;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::protocol::Reading;

/// Owned, lock-internal buffer of pending readings.
#[derive(Clone, Default)]
pub struct ReadingBuffer {
    inner: Arc<Mutex<Vec<Reading>>>,
}

impl ReadingBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one authenticated reading.
    pub async fn push(&self, reading: Reading) {
        let mut buf = self.inner.lock().await;
        buf.push(reading);
    }

    /// Atomically snapshot and clear the buffer.
    pub async fn drain(&self) -> Vec<Reading> {
        let mut buf = self.inner.lock().await;
        mem::take(&mut *buf)
    }

    /// Number of buffered readings.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
