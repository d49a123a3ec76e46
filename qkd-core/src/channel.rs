// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Single-qubit channel: encoding a classical bit into a basis and measuring it
//!
//! Two interchangeable backends realize the BB84 measurement statistics:
//!
//! - [`BornRuleChannel`] samples the outcome directly: certain when the bases
//!   match, a fair coin when they do not.
//! - [`StateVectorChannel`] prepares a two-amplitude state with X and H gates and
//!   measures it in the computational basis after rotating into the measuring basis.
//!
//! Callers depend only on the statistical contract, never on the mechanism.

use crate::{random::RandomSource, Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

/// A classical bit, always 0 or 1
pub type Bit = u8;

/// Tolerance used when snapping outcome probabilities to 0 or 1
const PROBABILITY_EPSILON: f64 = 1e-12;

/// Measurement basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Computational basis, `|0>` / `|1>`
    #[serde(rename = "+")]
    Rectilinear,
    /// Hadamard basis, `|+>` / `|->`
    #[serde(rename = "x")]
    Diagonal,
}

impl Basis {
    /// Symbolic tag used on the wire
    pub fn symbol(&self) -> &'static str {
        match self {
            Basis::Rectilinear => "+",
            Basis::Diagonal => "x",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A qubit prepared so that measuring in `basis` yields `bit` with certainty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedQubit {
    pub bit: Bit,
    pub basis: Basis,
}

/// Which backend realizes measurements
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementBackend {
    /// Direct probability sample
    BornRule,
    /// Two-amplitude state-vector simulation
    StateVector,
}

impl Default for MeasurementBackend {
    fn default() -> Self {
        Self::BornRule
    }
}

impl MeasurementBackend {
    /// Instantiate the channel for this backend
    pub fn channel(self) -> Box<dyn QubitChannel> {
        match self {
            MeasurementBackend::BornRule => Box::new(BornRuleChannel),
            MeasurementBackend::StateVector => Box::new(StateVectorChannel),
        }
    }
}

/// Prepare-and-measure contract shared by all backends
pub trait QubitChannel: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Prepare `bit` in `basis`
    fn encode(&self, bit: Bit, basis: Basis) -> PreparedQubit {
        PreparedQubit { bit: bit & 1, basis }
    }

    /// Measure a prepared qubit in `basis`.
    ///
    /// Matching bases return the encoded bit; mismatched bases return a uniform bit.
    /// An error means the backend failed and is never retried.
    fn measure(
        &self,
        qubit: &PreparedQubit,
        basis: Basis,
        rng: &mut dyn RandomSource,
    ) -> Result<Bit>;
}

impl<C: QubitChannel + ?Sized> QubitChannel for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn encode(&self, bit: Bit, basis: Basis) -> PreparedQubit {
        (**self).encode(bit, basis)
    }

    fn measure(
        &self,
        qubit: &PreparedQubit,
        basis: Basis,
        rng: &mut dyn RandomSource,
    ) -> Result<Bit> {
        (**self).measure(qubit, basis, rng)
    }
}

/// Samples measurement outcomes directly from the Born-rule probabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct BornRuleChannel;

impl QubitChannel for BornRuleChannel {
    fn name(&self) -> &'static str {
        "born_rule"
    }

    fn measure(
        &self,
        qubit: &PreparedQubit,
        basis: Basis,
        rng: &mut dyn RandomSource,
    ) -> Result<Bit> {
        if qubit.basis == basis {
            Ok(qubit.bit)
        } else {
            Ok(rng.bit())
        }
    }
}

/// Real amplitudes of a single qubit; X and H never introduce a phase
#[derive(Debug, Clone, Copy, PartialEq)]
struct StateVector {
    zero: f64,
    one: f64,
}

impl StateVector {
    fn ground() -> Self {
        Self { zero: 1.0, one: 0.0 }
    }

    fn apply_x(&mut self) {
        std::mem::swap(&mut self.zero, &mut self.one);
    }

    fn apply_h(&mut self) {
        let (a, b) = (self.zero, self.one);
        self.zero = FRAC_1_SQRT_2 * (a + b);
        self.one = FRAC_1_SQRT_2 * (a - b);
    }

    fn norm_sqr(&self) -> f64 {
        self.zero * self.zero + self.one * self.one
    }

    /// Probability of reading 1 in the computational basis
    fn probability_one(&self) -> f64 {
        let p = self.one * self.one / self.norm_sqr();
        if p < PROBABILITY_EPSILON {
            0.0
        } else if p > 1.0 - PROBABILITY_EPSILON {
            1.0
        } else {
            p
        }
    }
}

/// Simulates each photon as a one-qubit circuit
#[derive(Debug, Clone, Copy, Default)]
pub struct StateVectorChannel;

impl StateVectorChannel {
    fn prepare(qubit: &PreparedQubit) -> StateVector {
        let mut state = StateVector::ground();
        if qubit.bit == 1 {
            state.apply_x();
        }
        if qubit.basis == Basis::Diagonal {
            state.apply_h();
        }
        state
    }
}

impl QubitChannel for StateVectorChannel {
    fn name(&self) -> &'static str {
        "state_vector"
    }

    fn measure(
        &self,
        qubit: &PreparedQubit,
        basis: Basis,
        rng: &mut dyn RandomSource,
    ) -> Result<Bit> {
        let mut state = Self::prepare(qubit);
        if basis == Basis::Diagonal {
            state.apply_h();
        }

        let norm = state.norm_sqr();
        if !norm.is_finite() || (norm - 1.0).abs() > 1e-9 {
            return Err(Error::Measurement(format!(
                "State is not normalized. Norm squared: {}",
                norm
            )));
        }

        Ok(rng.chance(state.probability_one()) as Bit)
    }
}
