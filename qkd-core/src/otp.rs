// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! One-time pad keyed by a BB84-derived bit string
//!
//! Text is encoded as 8 bits per character, most significant bit first, and XORed
//! against the key repeated cyclically. Cipher text travels as the uppercase hex
//! form of the cipher bit string read as one big-endian integer.
//!
//! # Known limitation
//!
//! Hex-from-integer conversion drops leading zero bits. When the first cipher bit
//! is 0, decryption sees a shorter bit string, the key falls out of alignment and
//! the plaintext does not round-trip. The round trip is exact whenever the first
//! cipher bit is 1.

use crate::channel::Bit;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Everything produced by one encryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherPayload {
    /// 8 bits per character
    pub message_bits: Vec<Bit>,
    pub key_bits: Vec<Bit>,
    pub cipher_bits: Vec<Bit>,
    /// Uppercase, no leading zero digits
    pub cipher_hex: String,
}

/// XOR cipher over a non-empty key
#[derive(Debug, Clone)]
pub struct OneTimePad {
    key: Vec<Bit>,
}

impl OneTimePad {
    /// Create a pad, rejecting empty or non-binary keys
    pub fn new(key: impl Into<Vec<Bit>>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::Config("No secure key available".to_string()));
        }
        if let Some(pos) = key.iter().position(|&b| b > 1) {
            return Err(Error::Validation(format!(
                "Key entry {} at position {} is not a bit",
                key[pos], pos
            )));
        }
        Ok(Self { key })
    }

    pub fn key(&self) -> &[Bit] {
        &self.key
    }

    /// XOR `bits` against the cyclically repeated key
    pub fn apply(&self, bits: &[Bit]) -> Vec<Bit> {
        bits.iter()
            .enumerate()
            .map(|(i, &b)| b ^ self.key[i % self.key.len()])
            .collect()
    }

    pub fn encrypt(&self, message: &str) -> Result<CipherPayload> {
        let message_bits = text_to_bits(message)?;
        let cipher_bits = self.apply(&message_bits);
        let cipher_hex = bits_to_hex(&cipher_bits);

        debug!(
            "Encrypted {} message bits with {}-bit key",
            message_bits.len(),
            self.key.len()
        );

        Ok(CipherPayload {
            message_bits,
            key_bits: self.key.clone(),
            cipher_bits,
            cipher_hex,
        })
    }

    pub fn decrypt(&self, cipher_hex: &str) -> Result<String> {
        let cipher_bits = hex_to_bits(cipher_hex)?;
        let plain_bits = self.apply(&cipher_bits);
        Ok(bits_to_text(&plain_bits))
    }
}

/// Encrypt `message` under `key`
pub fn encrypt(message: &str, key: &[Bit]) -> Result<CipherPayload> {
    OneTimePad::new(key)?.encrypt(message)
}

/// Decrypt uppercase or lowercase hex `cipher_hex` under `key`
pub fn decrypt(cipher_hex: &str, key: &[Bit]) -> Result<String> {
    OneTimePad::new(key)?.decrypt(cipher_hex)
}

/// 8 bits per character, big-endian; code points above U+00FF are rejected
pub fn text_to_bits(text: &str) -> Result<Vec<Bit>> {
    let mut bits = Vec::with_capacity(text.len() * 8);
    for c in text.chars() {
        let code = u8::try_from(u32::from(c)).map_err(|_| {
            Error::Validation(format!(
                "Character '{}' (U+{:04X}) does not fit in 8 bits",
                c,
                u32::from(c)
            ))
        })?;
        bits.extend((0..8).rev().map(|shift| (code >> shift) & 1));
    }
    Ok(bits)
}

/// Group bits into 8-bit characters from the front, dropping a short tail
pub fn bits_to_text(bits: &[Bit]) -> String {
    bits.chunks_exact(8)
        .map(|byte| char::from(byte.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))))
        .collect()
}

/// Hex of the bit string as a big-endian integer, without leading zero digits
pub fn bits_to_hex(bits: &[Bit]) -> String {
    let significant = match bits.iter().position(|&b| b == 1) {
        Some(first_one) => &bits[first_one..],
        None => return "0".to_string(),
    };

    let pad = (4 - significant.len() % 4) % 4;
    let padded: Vec<Bit> = std::iter::repeat(0)
        .take(pad)
        .chain(significant.iter().copied())
        .collect();

    padded
        .chunks(4)
        .map(|nibble| {
            let value = nibble.iter().fold(0usize, |acc, &b| (acc << 1) | b as usize);
            HEX_DIGITS[value] as char
        })
        .collect()
}

/// Parse hex as a big-endian integer and return its minimal binary form.
///
/// Surrounding whitespace and a `0x` prefix are accepted. Zero is a single 0 bit.
pub fn hex_to_bits(hex: &str) -> Result<Vec<Bit>> {
    let trimmed = hex.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(Error::Decoding(format!(
            "Invalid hexadecimal literal: '{}'",
            hex
        )));
    }

    let mut bits = Vec::with_capacity(digits.len() * 4);
    for c in digits.chars() {
        let value = c.to_digit(16).ok_or_else(|| {
            Error::Decoding(format!(
                "Invalid hexadecimal digit '{}' in '{}'",
                c, hex
            ))
        })?;
        bits.extend((0..4).rev().map(|shift| ((value >> shift) & 1) as Bit));
    }

    match bits.iter().position(|&b| b == 1) {
        Some(first_one) => Ok(bits.split_off(first_one)),
        None => Ok(vec![0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        let payload = encrypt("A", &[1, 0, 1, 0, 1, 0, 1, 0]).unwrap();
        assert_eq!(payload.message_bits, vec![0, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(payload.cipher_bits, vec![1, 1, 1, 0, 1, 0, 1, 1]);
        assert_eq!(payload.cipher_hex, "EB");
        assert_eq!(decrypt("EB", &[1, 0, 1, 0, 1, 0, 1, 0]).unwrap(), "A");
    }

    #[test]
    fn test_key_reused_cyclically() {
        let payload = encrypt("AB", &[1]).unwrap();
        // every bit flipped: !0x41 = 0xBE, !0x42 = 0xBD
        assert_eq!(payload.cipher_hex, "BEBD");
        assert_eq!(decrypt(&payload.cipher_hex, &[1]).unwrap(), "AB");
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        assert!(matches!(encrypt("hi", &[]), Err(Error::Config(_))));
        assert!(matches!(decrypt("EB", &[]), Err(Error::Config(_))));
    }

    #[test]
    fn test_non_binary_key_rejected() {
        assert!(matches!(encrypt("hi", &[1, 2]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_invalid_hex_is_decoding_error() {
        assert!(matches!(decrypt("GG", &[1]), Err(Error::Decoding(_))));
        assert!(matches!(decrypt("", &[1]), Err(Error::Decoding(_))));
        assert!(matches!(decrypt("0x", &[1]), Err(Error::Decoding(_))));
    }

    #[test]
    fn test_wide_characters_rejected() {
        assert!(matches!(text_to_bits("π"), Err(Error::Validation(_))));
        assert_eq!(text_to_bits("é").unwrap(), vec![1, 1, 1, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_leading_zero_bits_are_lost() {
        // key bit 0 leaves the leading 0 of 'A' in place, so hex drops it
        let payload = encrypt("AB", &[0]).unwrap();
        assert_eq!(payload.cipher_hex, "4142");
        let decrypted = decrypt(&payload.cipher_hex, &[0]).unwrap();
        assert_ne!(decrypted, "AB");
        assert_eq!(decrypted, "\u{82}");

        let payload = encrypt("A", &[0]).unwrap();
        assert_eq!(decrypt(&payload.cipher_hex, &[0]).unwrap(), "");
    }

    #[test]
    fn test_hex_codec_edges() {
        assert_eq!(bits_to_hex(&[]), "0");
        assert_eq!(bits_to_hex(&[0, 0, 0]), "0");
        assert_eq!(bits_to_hex(&[1, 0, 1]), "5");
        assert_eq!(bits_to_hex(&[0, 0, 0, 1, 1, 1, 1, 1]), "1F");
        assert_eq!(hex_to_bits("0").unwrap(), vec![0]);
        assert_eq!(hex_to_bits(" 0x1f ").unwrap(), vec![1, 1, 1, 1, 1]);
        assert_eq!(hex_to_bits("eb").unwrap(), hex_to_bits("EB").unwrap());
    }

    #[test]
    fn test_empty_message() {
        let payload = encrypt("", &[1, 0]).unwrap();
        assert!(payload.message_bits.is_empty());
        assert_eq!(payload.cipher_hex, "0");
        assert_eq!(decrypt(&payload.cipher_hex, &[1, 0]).unwrap(), "");
    }

    #[test]
    fn test_bits_to_text_drops_partial_tail() {
        let mut bits = text_to_bits("Hi").unwrap();
        bits.extend([1, 0, 1]);
        assert_eq!(bits_to_text(&bits), "Hi");
    }
}
