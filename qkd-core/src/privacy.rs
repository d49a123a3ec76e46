// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Privacy amplification
//!
//! Compresses Alice's sifted key through SHA-256 so that any partial knowledge Eve
//! gathered about individual sifted bits does not carry over to the final key.
//! No information reconciliation runs first: residual mismatches between Alice's
//! and Bob's sifted keys survive into the hash input on Alice's side only.

use crate::channel::Bit;
use crate::FINAL_KEY_BITS;
use sha2::{Digest, Sha256};

/// Render a bit sequence as the ASCII string of `'0'` and `'1'` characters
pub fn bit_string(bits: &[Bit]) -> String {
    bits.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}

/// Expand bytes into bits, most significant bit first
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<Bit> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
        .collect()
}

/// Derive the final key from a sifted key.
///
/// Returns the first [`FINAL_KEY_BITS`] bits of `SHA-256(bit_string(sifted))`, read
/// from the fixed-width 256-bit digest. An empty sifted key yields an empty key.
pub fn amplify(sifted: &[Bit]) -> Vec<Bit> {
    if sifted.is_empty() {
        return Vec::new();
    }

    let digest = Sha256::digest(bit_string(sifted).as_bytes());
    let mut bits = bytes_to_bits(&digest);
    bits.truncate(FINAL_KEY_BITS);
    bits
}
