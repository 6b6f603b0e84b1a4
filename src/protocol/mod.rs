// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Telemetry Relay Protocol
//!
//! The transport-agnostic pieces of the protocol: the telemetry data model,
//! the JSON wire envelopes with their strict decoders, the relay-side
//! freshness guard, and the rejection taxonomy.

pub mod error;
pub mod freshness;
pub mod types;
pub mod wire;

pub use error::ProtocolError;
pub use freshness::{FreshnessGuard, DEFAULT_CACHE_CAPACITY, DEFAULT_SKEW_WINDOW_MS};
pub use types::{now_ms, Aggregate, Reading};
pub use wire::{
    decode_field, decode_fixed, encode_field, AggregateEnvelope, CloudPublicKey, FogPublicKey,
    MeterEnvelope,
};
