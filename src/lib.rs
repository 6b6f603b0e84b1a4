// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! MeterMesh: a secure telemetry relay for a three-tier sensor network.
//!
//! Smart meters sign and encrypt readings to a fog aggregator, which
//! verifies, buffers, and periodically re-encrypts aggregates to a cloud
//! collector. Each hop runs an ephemeral X25519/HKDF channel with
//! ChaCha20-Poly1305 framing bound to a per-hop domain tag; the edge hop
//! additionally enforces signature authenticity and anti-replay.

pub mod api;
pub mod config;
pub mod crypto;
pub mod meter;
pub mod protocol;
pub mod relay;
pub mod sink;

pub use config::{CloudConfig, FogConfig, MeterSimConfig};
pub use crypto::{ConfidentialityKeyPair, CryptoError, SigningKeyPair};
pub use meter::Meter;
pub use protocol::{Aggregate, FreshnessGuard, MeterEnvelope, ProtocolError, Reading};
pub use relay::FogNode;
pub use sink::CloudCollector;
