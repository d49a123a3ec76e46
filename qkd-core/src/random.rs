// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Cryptographically secure randomness for the protocol parties
//!
//! Every party (Alice, Bob, Eve) draws from a [`RandomSource`]. The trait is
//! blanket-implemented for every `RngCore + CryptoRng`, so production code hands
//! the process-wide [`OsRng`] to each session while tests can pass a seeded
//! `StdRng` for reproducible runs. Statistical PRNGs without the `CryptoRng`
//! marker are rejected at compile time.

use crate::channel::{Basis, Bit};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

/// Source of independent uniform draws
pub trait RandomSource {
    /// Returns 0 or 1 with probability 0.5 each
    fn bit(&mut self) -> Bit;

    /// Returns either basis with probability 0.5 each
    fn basis(&mut self) -> Basis;

    /// Returns an integer in `[0, n)`, or `None` when the range is empty
    fn uniform_int(&mut self, n: u64) -> Option<u64>;

    /// Returns `true` with probability `p`, clamped to `[0, 1]`
    fn chance(&mut self, p: f64) -> bool;

    /// Draws `n` independent bits
    fn bits(&mut self, n: usize) -> Vec<Bit> {
        (0..n).map(|_| self.bit()).collect()
    }

    /// Draws `n` independent bases
    fn bases(&mut self, n: usize) -> Vec<Basis> {
        (0..n).map(|_| self.basis()).collect()
    }
}

impl<R: RngCore + CryptoRng> RandomSource for R {
    fn bit(&mut self) -> Bit {
        self.gen_range(0..=1)
    }

    fn basis(&mut self) -> Basis {
        if self.gen::<bool>() {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    fn uniform_int(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        Some(self.gen_range(0..n))
    }

    fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.gen_bool(p.clamp(0.0, 1.0))
    }
}

/// The process-wide secure generator.
///
/// `OsRng` is a zero-sized handle onto the operating system's CSPRNG, so every
/// caller gets an independent view with no shared seeding state. Safe to use
/// from any number of concurrent sessions.
pub fn system() -> OsRng {
    OsRng
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bits_are_binary() {
        let mut rng = StdRng::seed_from_u64(7);
        let bits = rng.bits(1000);
        assert_eq!(bits.len(), 1000);
        assert!(bits.iter().all(|&b| b <= 1));
    }

    #[test]
    fn test_bit_balance() {
        let mut rng = system();
        let ones: usize = rng.bits(10_000).iter().map(|&b| b as usize).sum();
        // 10 sigma on either side of 5000
        assert!((4500..=5500).contains(&ones), "ones = {}", ones);
    }

    #[test]
    fn test_basis_balance() {
        let mut rng = StdRng::seed_from_u64(11);
        let diagonal = rng
            .bases(10_000)
            .into_iter()
            .filter(|b| *b == Basis::Diagonal)
            .count();
        assert!((4500..=5500).contains(&diagonal), "diagonal = {}", diagonal);
    }

    #[test]
    fn test_uniform_int_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = rng.uniform_int(6).unwrap();
            assert!(v < 6);
        }
        assert_eq!(rng.uniform_int(1), Some(0));
        assert_eq!(rng.uniform_int(0), None);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(rng.chance(1.0));
        assert!(!rng.chance(0.0));
        assert!(rng.chance(2.5));
        assert!(!rng.chance(-1.0));
        assert!(!rng.chance(f64::NAN));
    }
}
