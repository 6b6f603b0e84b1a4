// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Relay-side freshness enforcement through the full inbound pipeline.

use metermesh::{
    config::FogConfig, meter::Meter, protocol::ProtocolError, relay::FogNode,
    ConfidentialityKeyPair,
};

fn test_node() -> FogNode {
    let cloud = ConfidentialityKeyPair::generate();
    FogNode::new(FogConfig::default(), cloud.public_bytes()).unwrap()
}

#[tokio::test]
async fn fresh_envelope_is_accepted_and_buffered() {
    let node = test_node();
    let meter = Meter::new("M-001", &decode_fog_public(&node)).unwrap();

    let envelope = meter.envelope_for(&meter.sample()).unwrap();
    assert!(node.handle_exchange(&envelope).await.is_ok());
    assert_eq!(node.buffered().await, 1);
}

#[tokio::test]
async fn replayed_envelope_is_rejected() {
    let node = test_node();
    let meter = Meter::new("M-001", &decode_fog_public(&node)).unwrap();

    let envelope = meter.envelope_for(&meter.sample()).unwrap();
    node.handle_exchange(&envelope).await.unwrap();

    // Byte-identical replay: fresh timestamp, seen nonce.
    let err = node.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ReplayDetected));
    assert_eq!(node.buffered().await, 1, "replay must not reach the buffer");
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let node = test_node();
    let meter = Meter::new("M-001", &decode_fog_public(&node)).unwrap();

    // The outer ts is unauthenticated wire metadata; skew it past the window.
    let mut envelope = meter.envelope_for(&meter.sample()).unwrap();
    envelope.ts -= 60_000;

    let err = node.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::StaleOrFutureTimestamp { .. }));
    assert_eq!(node.buffered().await, 0);
}

#[tokio::test]
async fn future_timestamp_is_rejected() {
    let node = test_node();
    let meter = Meter::new("M-001", &decode_fog_public(&node)).unwrap();

    let mut envelope = meter.envelope_for(&meter.sample()).unwrap();
    envelope.ts += 60_000;

    let err = node.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::StaleOrFutureTimestamp { .. }));
}

#[tokio::test]
async fn distinct_fresh_nonces_are_both_accepted() {
    let node = test_node();
    let meter = Meter::new("M-001", &decode_fog_public(&node)).unwrap();

    let first = meter.envelope_for(&meter.sample()).unwrap();
    let second = meter.envelope_for(&meter.sample()).unwrap();
    assert_ne!(first.nonce, second.nonce);

    assert!(node.handle_exchange(&first).await.is_ok());
    assert!(node.handle_exchange(&second).await.is_ok());
    assert_eq!(node.buffered().await, 2);
}

fn decode_fog_public(node: &FogNode) -> [u8; 32] {
    metermesh::protocol::decode_fixed("fog_public", &node.public_key_b64()).unwrap()
}
