// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

use proptest::prelude::*;
use qkd_core::otp::{self, OneTimePad};
use qkd_core::session::ProtocolRunner;
use qkd_core::{Error, FINAL_KEY_BITS};

#[test]
fn encrypt_reference_vector() {
    let key = [1, 0, 1, 0, 1, 0, 1, 0];
    let payload = otp::encrypt("A", &key).unwrap();
    assert_eq!(payload.message_bits, vec![0, 1, 0, 0, 0, 0, 0, 1]);
    assert_eq!(payload.cipher_bits, vec![1, 1, 1, 0, 1, 0, 1, 1]);
    assert_eq!(payload.cipher_hex, "EB");
    assert_eq!(payload.key_bits, key.to_vec());
}

#[test]
fn empty_key_fails_with_configuration_error() {
    let err = otp::encrypt("secret", &[]).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.is_user_error());
}

#[test]
fn invalid_hex_fails_with_decoding_error() {
    let err = otp::decrypt("GG", &[1]).unwrap_err();
    assert!(matches!(err, Error::Decoding(_)));
    assert!(err.to_string().contains("GG"));
}

#[test]
fn round_trip_with_derived_key() {
    let runner = ProtocolRunner::default();
    let mut result = runner.run(256, false).unwrap();
    while result.final_key.is_empty() {
        result = runner.run(256, false).unwrap();
    }
    assert_eq!(result.final_key.len(), FINAL_KEY_BITS);

    // Force a leading 1 so the hex form keeps every bit
    let mut key = result.final_key.clone();
    key[0] = 1;

    let pad = OneTimePad::new(key).unwrap();
    let payload = pad.encrypt("Quantum keys, classical pad!").unwrap();
    assert_eq!(pad.decrypt(&payload.cipher_hex).unwrap(), "Quantum keys, classical pad!");
}

#[test]
fn leading_zero_cipher_bit_breaks_round_trip() {
    // Known limitation: with key[0] = 0 the cipher starts with the 0 bit of an
    // ASCII character, which the hex encoding drops.
    let key = [0, 1, 1, 0];
    let payload = otp::encrypt("Hello", &key).unwrap();
    assert_eq!(payload.cipher_bits[0], 0);
    assert_ne!(otp::decrypt(&payload.cipher_hex, &key).unwrap(), "Hello");
}

proptest! {
    #[test]
    fn printable_ascii_round_trips_when_first_cipher_bit_is_one(
        message in "[ -~]{1,64}",
        tail in prop::collection::vec(0u8..=1, 0..40),
    ) {
        let mut key = vec![1u8];
        key.extend(tail);

        let payload = otp::encrypt(&message, &key).unwrap();
        prop_assert_eq!(payload.message_bits.len(), message.len() * 8);
        prop_assert_eq!(payload.cipher_bits[0], 1);
        prop_assert_eq!(otp::decrypt(&payload.cipher_hex, &key).unwrap(), message);
    }

    #[test]
    fn lowercase_hex_is_accepted(
        message in "[ -~]{1,16}",
        tail in prop::collection::vec(0u8..=1, 0..8),
    ) {
        let mut key = vec![1u8];
        key.extend(tail);
        let payload = otp::encrypt(&message, &key).unwrap();
        let lower = payload.cipher_hex.to_lowercase();
        prop_assert_eq!(otp::decrypt(&lower, &key).unwrap(), message);
    }
}
