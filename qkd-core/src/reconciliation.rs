// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Cascade-style parity report over a sifted key pair
//!
//! Splits the sifted positions into consecutive blocks whose size depends on the
//! observed error rate, then compares Alice's and Bob's parity per block. The
//! report only locates disagreement; it never flips a bit, and the final key is
//! derived from Alice's sifted bits regardless.

use crate::channel::Bit;
use crate::{session, Error, Result};
use serde::{Deserialize, Serialize};

/// Block size for a given error rate in percent
pub fn block_size(error_rate_percent: f64) -> usize {
    if error_rate_percent <= 1.0 {
        72
    } else if error_rate_percent <= 5.0 {
        14
    } else if error_rate_percent <= 10.0 {
        7
    } else {
        4
    }
}

fn parity(bits: &[Bit]) -> Bit {
    bits.iter().fold(0, |acc, &b| acc ^ (b & 1))
}

/// One block of the parity comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityBlock {
    /// 1-based first position, inclusive
    pub start: usize,
    /// 1-based last position, inclusive
    pub end: usize,
    pub alice_parity: Bit,
    pub bob_parity: Bit,
    pub mismatch: bool,
}

/// Result of comparing block parities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityReport {
    /// Error rate in percent that selected the block size
    pub error_rate_percent: f64,
    pub block_size: usize,
    pub blocks: Vec<ParityBlock>,
}

impl ParityReport {
    /// Blocks whose parities disagree
    pub fn mismatched_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.mismatch).count()
    }
}

/// Compare parities of consecutive blocks of the two sifted keys
pub fn parity_report(alice_key: &[Bit], bob_key: &[Bit]) -> Result<ParityReport> {
    if alice_key.len() != bob_key.len() {
        return Err(Error::Validation(format!(
            "Sifted keys differ in length: {} vs {}",
            alice_key.len(),
            bob_key.len()
        )));
    }

    let error_rate_percent = session::qber(alice_key, bob_key) * 100.0;
    let k = block_size(error_rate_percent);

    let blocks = alice_key
        .chunks(k)
        .zip(bob_key.chunks(k))
        .enumerate()
        .map(|(i, (alice, bob))| {
            let alice_parity = parity(alice);
            let bob_parity = parity(bob);
            ParityBlock {
                start: i * k + 1,
                end: i * k + alice.len(),
                alice_parity,
                bob_parity,
                mismatch: alice_parity != bob_parity,
            }
        })
        .collect();

    Ok(ParityReport {
        error_rate_percent,
        block_size: k,
        blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_ranges() {
        assert_eq!(block_size(0.0), 72);
        assert_eq!(block_size(1.0), 72);
        assert_eq!(block_size(3.2), 14);
        assert_eq!(block_size(5.0), 14);
        assert_eq!(block_size(7.5), 7);
        assert_eq!(block_size(10.0), 7);
        assert_eq!(block_size(25.0), 4);
    }

    #[test]
    fn test_clean_key_has_no_parity_errors() {
        let key = vec![1, 0, 1, 1, 0, 0, 1, 0, 1];
        let report = parity_report(&key, &key).unwrap();
        assert_eq!(report.block_size, 72);
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].start, 1);
        assert_eq!(report.blocks[0].end, 9);
        assert_eq!(report.mismatched_blocks(), 0);
    }

    #[test]
    fn test_single_error_located() {
        // 1 error in 8 bits = 12.5%, block size 4
        let alice = vec![1, 0, 1, 1, 0, 0, 1, 0];
        let bob = vec![1, 0, 1, 1, 0, 1, 1, 0];
        let report = parity_report(&alice, &bob).unwrap();

        assert_eq!(report.block_size, 4);
        assert_eq!(report.blocks.len(), 2);
        assert!(!report.blocks[0].mismatch);
        assert!(report.blocks[1].mismatch);
        assert_eq!((report.blocks[1].start, report.blocks[1].end), (5, 8));
        assert_eq!(report.blocks[1].alice_parity, 1);
        assert_eq!(report.blocks[1].bob_parity, 0);
    }

    #[test]
    fn test_short_final_block() {
        let alice = vec![0, 0, 0, 0, 0, 1];
        let bob = vec![1, 0, 0, 0, 0, 1];
        let report = parity_report(&alice, &bob).unwrap();
        assert_eq!(report.block_size, 4);
        assert_eq!((report.blocks[1].start, report.blocks[1].end), (5, 6));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(matches!(
            parity_report(&[1, 0], &[1]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_empty_keys() {
        let report = parity_report(&[], &[]).unwrap();
        assert!(report.blocks.is_empty());
        assert_eq!(report.error_rate_percent, 0.0);
    }
}
