// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Relay pipeline tests: rejection short-circuits, aggregation semantics,
//! upstream dead-lettering, and the full meter -> fog -> cloud scenario.

use std::sync::Arc;
use std::time::Duration;

use metermesh::{
    api::cloud_router,
    config::FogConfig,
    meter::Meter,
    protocol::{decode_fixed, encode_field, now_ms, Aggregate, ProtocolError, Reading},
    relay::FogNode,
    sink::CloudCollector,
    SigningKeyPair,
};

fn fog_public(node: &FogNode) -> [u8; 32] {
    decode_fixed("fog_public", &node.public_key_b64()).unwrap()
}

fn reading(meter_id: &str, power: f64, voltage: f64) -> Reading {
    Reading {
        meter_id: meter_id.to_string(),
        power_usage: power,
        voltage,
        timestamp_ms: now_ms(),
    }
}

fn paired_fog_and_cloud(config: FogConfig) -> (FogNode, CloudCollector) {
    let cloud = CloudCollector::new();
    let fog = FogNode::new(config, cloud.public_bytes()).unwrap();
    (fog, cloud)
}

#[tokio::test]
async fn tampered_ciphertext_never_reaches_the_buffer() {
    let (fog, _cloud) = paired_fog_and_cloud(FogConfig::default());
    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();

    let mut envelope = meter.envelope_for(&meter.sample()).unwrap();
    let mut blob = metermesh::protocol::decode_field("encrypted_data", &envelope.encrypted_data).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    envelope.encrypted_data = encode_field(&blob);

    let err = fog.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
    assert_eq!(fog.buffered().await, 0);
}

#[tokio::test]
async fn substituted_signing_key_is_rejected() {
    let (fog, _cloud) = paired_fog_and_cloud(FogConfig::default());
    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();

    // An attacker swaps in their own signing public key without being able
    // to re-sign the AEAD-protected plaintext they cannot read.
    let mut envelope = meter.envelope_for(&meter.sample()).unwrap();
    let attacker = SigningKeyPair::generate();
    envelope.meter_sig_pub = encode_field(&attacker.public_bytes());

    let err = fog.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidSignature(_)));
}

#[tokio::test]
async fn malformed_fields_are_rejected_as_malformed_envelope() {
    let (fog, _cloud) = paired_fog_and_cloud(FogConfig::default());
    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();

    let good = meter.envelope_for(&meter.sample()).unwrap();

    let mut short_key = good.clone();
    short_key.meter_public = encode_field(&[0u8; 16]);
    assert!(matches!(
        fog.handle_exchange(&short_key).await.unwrap_err(),
        ProtocolError::MalformedEnvelope { .. }
    ));

    let mut bad_b64 = good.clone();
    bad_b64.signature = "!!not base64!!".to_string();
    assert!(matches!(
        fog.handle_exchange(&bad_b64).await.unwrap_err(),
        ProtocolError::MalformedEnvelope { .. }
    ));

    let mut short_nonce = good;
    short_nonce.nonce = encode_field(&[0u8; 8]);
    assert!(matches!(
        fog.handle_exchange(&short_nonce).await.unwrap_err(),
        ProtocolError::MalformedEnvelope { .. }
    ));
}

#[tokio::test]
async fn degenerate_peer_key_is_rejected() {
    let (fog, _cloud) = paired_fog_and_cloud(FogConfig::default());
    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();

    let mut envelope = meter.envelope_for(&meter.sample()).unwrap();
    envelope.meter_public = encode_field(&[0u8; 32]);

    let err = fog.handle_exchange(&envelope).await.unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidPeerKey(_)));
}

#[tokio::test]
async fn aggregation_drains_and_averages_the_buffer() {
    let (fog, _cloud) = paired_fog_and_cloud(FogConfig::default());
    let public = fog_public(&fog);

    for (power, voltage) in [(5.0, 220.0), (6.0, 230.0), (5.5, 225.0)] {
        let meter = Meter::new("M-avg", &public).unwrap();
        let envelope = meter
            .envelope_for(&reading("M-avg", power, voltage))
            .unwrap();
        fog.handle_exchange(&envelope).await.unwrap();
    }
    assert_eq!(fog.buffered().await, 3);

    let snapshot = fog.drain_buffer().await;
    let aggregate = Aggregate::from_readings(fog.fog_id(), &snapshot, now_ms()).unwrap();

    assert_eq!(aggregate.sample_count, 3);
    assert_eq!(aggregate.avg_power, 5.5);
    assert_eq!(aggregate.avg_voltage, 225.0);
    assert_eq!(fog.buffered().await, 0, "drain must clear the buffer");
}

#[tokio::test]
async fn end_to_end_reading_survives_both_hops() {
    let (fog, cloud) = paired_fog_and_cloud(FogConfig::default());
    let meter = Meter::new("M-007", &fog_public(&fog)).unwrap();

    // Meter -> fog: signed, sealed, buffered.
    assert_eq!(fog.buffered().await, 0);
    let envelope = meter
        .envelope_for(&reading("M-007", 5.2, 231.0))
        .unwrap();
    fog.handle_exchange(&envelope).await.unwrap();
    assert_eq!(fog.buffered().await, 1);

    // Fog -> cloud: aggregate of one, re-sealed under the upstream channel.
    let snapshot = fog.drain_buffer().await;
    let aggregate = Aggregate::from_readings(fog.fog_id(), &snapshot, now_ms()).unwrap();
    let upstream = fog.seal_aggregate(&aggregate).unwrap();

    let accepted = cloud.handle_data(&upstream).unwrap();
    assert_eq!(accepted.sample_count, 1);
    assert_eq!(accepted.avg_power, 5.2);
    assert_eq!(accepted.avg_voltage, 231.0);
    assert_eq!(accepted.relay_id, "FN-01");
}

#[tokio::test]
async fn cloud_rejects_tampered_upstream_envelopes() {
    let (fog, cloud) = paired_fog_and_cloud(FogConfig::default());
    let aggregate = Aggregate::from_readings(
        fog.fog_id(),
        &[reading("M-001", 5.0, 230.0)],
        now_ms(),
    )
    .unwrap();
    let good = fog.seal_aggregate(&aggregate).unwrap();

    // Forged fog signature.
    let mut forged = good.clone();
    forged.fog_sig_pub = encode_field(&SigningKeyPair::generate().public_bytes());
    assert!(matches!(
        cloud.handle_data(&forged).unwrap_err(),
        ProtocolError::InvalidSignature(_)
    ));

    // Tampered ciphertext.
    let mut tampered = good;
    let mut blob = metermesh::protocol::decode_field("message", &tampered.message).unwrap();
    blob[20] ^= 0x01;
    tampered.message = encode_field(&blob);
    assert!(matches!(
        cloud.handle_data(&tampered).unwrap_err(),
        ProtocolError::DecryptionFailed(_)
    ));
}

#[tokio::test]
async fn flush_tick_delivers_over_http() {
    // Real cloud server on an ephemeral port.
    let collector = Arc::new(CloudCollector::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = {
        let router = cloud_router(Arc::clone(&collector));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        })
    };

    let config = FogConfig {
        cloud_url: format!("http://{}", addr),
        ..FogConfig::default()
    };
    let fog = FogNode::new(config, collector.public_bytes()).unwrap();
    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();

    let envelope = meter.envelope_for(&reading("M-001", 5.0, 230.0)).unwrap();
    fog.handle_exchange(&envelope).await.unwrap();

    fog.flush_tick().await;
    assert_eq!(fog.buffered().await, 0);
    assert_eq!(fog.dead_lettered().await, 0, "delivery should not dead-letter");

    server.abort();
}

#[tokio::test]
async fn unreachable_sink_dead_letters_the_aggregate() {
    // Nothing listens on this port; every attempt fails fast.
    let config = FogConfig {
        cloud_url: "http://127.0.0.1:9".to_string(),
        http_timeout: Duration::from_millis(250),
        ..FogConfig::default()
    };
    let (fog, _cloud) = {
        let cloud = CloudCollector::new();
        (FogNode::new(config, cloud.public_bytes()).unwrap(), cloud)
    };

    let meter = Meter::new("M-001", &fog_public(&fog)).unwrap();
    let envelope = meter.envelope_for(&reading("M-001", 5.0, 230.0)).unwrap();
    fog.handle_exchange(&envelope).await.unwrap();

    fog.flush_tick().await;
    assert_eq!(fog.dead_lettered().await, 1);
    assert_eq!(fog.buffered().await, 0);
}

#[tokio::test]
async fn dead_letter_queue_is_capped() {
    let config = FogConfig {
        dead_letter_cap: 2,
        ..FogConfig::default()
    };
    let (fog, _cloud) = paired_fog_and_cloud(config);

    let aggregate = Aggregate::from_readings(
        fog.fog_id(),
        &[reading("M-001", 5.0, 230.0)],
        now_ms(),
    )
    .unwrap();

    for _ in 0..5 {
        let envelope = fog.seal_aggregate(&aggregate).unwrap();
        fog.push_dead_letter(envelope).await;
    }
    assert_eq!(fog.dead_lettered().await, 2, "oldest entries must be dropped");
}
