// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Channel-crypto property tests: round-trip, tamper rejection, key
//! agreement symmetry, signature authenticity, and AEAD nonce freshness.

use std::collections::HashSet;

use metermesh::crypto::{
    open, seal, verify_signature, ConfidentialityKeyPair, CryptoError, SigningKeyPair, FN_CS_TAG,
    NONCE_LEN, SM_FN_TAG,
};
use rand::{rngs::OsRng, RngCore};

fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

#[test]
fn round_trip_across_plaintext_sizes_and_tags() {
    let key = random_key();
    let plaintexts: [&[u8]; 4] = [
        b"",
        b"x",
        b"{\"meter_id\":\"M-001\",\"power_usage\":5.2}",
        &[0xAB; 4096],
    ];

    for plaintext in plaintexts {
        for tag in [SM_FN_TAG, FN_CS_TAG] {
            let blob = seal(&key, plaintext, tag).unwrap();
            let opened = open(&key, &blob, tag).unwrap();
            assert_eq!(opened, plaintext);
        }
    }
}

#[test]
fn any_flipped_bit_is_rejected_whole() {
    let key = random_key();
    let blob = seal(&key, b"tamper target", SM_FN_TAG).unwrap();

    // Flipping a bit anywhere (nonce, ciphertext, or tag region) must make
    // open fail; corrupted plaintext is never returned.
    for idx in 0..blob.len() {
        let mut mutated = blob.clone();
        mutated[idx] ^= 0x01;
        let err = open(&key, &mutated, SM_FN_TAG).unwrap_err();
        assert!(
            matches!(err, CryptoError::DecryptionFailed { .. }),
            "byte {} flip should fail decryption",
            idx
        );
    }
}

#[test]
fn wrong_domain_tag_is_rejected() {
    let key = random_key();
    let blob = seal(&key, b"bound to SM-FN", SM_FN_TAG).unwrap();
    assert!(open(&key, &blob, FN_CS_TAG).is_err());
    assert!(open(&key, &blob, b"SM-FM").is_err());
}

#[test]
fn wrong_key_is_rejected() {
    let blob = seal(&random_key(), b"payload", SM_FN_TAG).unwrap();
    assert!(open(&random_key(), &blob, SM_FN_TAG).is_err());
}

#[test]
fn key_agreement_is_symmetric() {
    for _ in 0..16 {
        let a = ConfidentialityKeyPair::generate();
        let b = ConfidentialityKeyPair::generate();

        let k_ab = a.channel_key_with(&b.public_bytes()).unwrap();
        let k_ba = b.channel_key_with(&a.public_bytes()).unwrap();
        assert_eq!(k_ab, k_ba);
    }
}

#[test]
fn derived_key_seals_across_the_pair() {
    // A message sealed under one side's derivation opens under the other's.
    let a = ConfidentialityKeyPair::generate();
    let b = ConfidentialityKeyPair::generate();

    let k_a = a.channel_key_with(&b.public_bytes()).unwrap();
    let k_b = b.channel_key_with(&a.public_bytes()).unwrap();

    let blob = seal(&k_a, b"cross-pair", SM_FN_TAG).unwrap();
    assert_eq!(open(&k_b, &blob, SM_FN_TAG).unwrap(), b"cross-pair");
}

#[test]
fn signature_verifies_only_under_signer_key_and_message() {
    let signer = SigningKeyPair::generate();
    let other = SigningKeyPair::generate();
    let message = b"authentic reading";

    let sig = signer.sign(message);
    assert!(verify_signature(&signer.public_bytes(), message, &sig).is_ok());
    assert!(verify_signature(&other.public_bytes(), message, &sig).is_err());
    assert!(verify_signature(&signer.public_bytes(), b"authentic reading!", &sig).is_err());

    let mut mutated_sig = sig;
    mutated_sig[10] ^= 0x40;
    assert!(verify_signature(&signer.public_bytes(), message, &mutated_sig).is_err());
}

#[test]
fn ten_thousand_seals_use_distinct_nonces() {
    let key = random_key();
    let mut nonces = HashSet::with_capacity(10_000);

    for _ in 0..10_000 {
        let blob = seal(&key, b"same payload", SM_FN_TAG).unwrap();
        let nonce: [u8; NONCE_LEN] = blob[..NONCE_LEN].try_into().unwrap();
        assert!(nonces.insert(nonce), "AEAD nonce reuse detected");
    }
}
