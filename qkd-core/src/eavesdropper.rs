// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Intercept-resend eavesdropper
//!
//! Eve measures every photon in a basis of her own choosing and forwards a fresh
//! photon carrying her result in her basis. Whenever her basis differs from
//! Alice's she randomizes the state, which is what makes her visible in the QBER.

use crate::channel::{Basis, Bit, PreparedQubit, QubitChannel};
use crate::{random::RandomSource, Result};
use tracing::debug;

/// One photon as seen by Eve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptedPhotonRecord {
    pub index: usize,
    /// What Alice sent
    pub original: PreparedQubit,
    pub eve_basis: Basis,
    pub eve_bit: Bit,
}

impl InterceptedPhotonRecord {
    /// The photon Eve resends to Bob
    pub fn forwarded(&self) -> PreparedQubit {
        PreparedQubit {
            bit: self.eve_bit,
            basis: self.eve_basis,
        }
    }

    /// True when Eve's basis differed from Alice's and the state was disturbed
    pub fn disturbed(&self) -> bool {
        self.eve_basis != self.original.basis
    }
}

/// Outcome of a full interception pass
#[derive(Debug, Clone, Default)]
pub struct Interception {
    pub records: Vec<InterceptedPhotonRecord>,
}

impl Interception {
    /// Photons forwarded downstream, in transmission order
    pub fn forwarded(&self) -> Vec<PreparedQubit> {
        self.records.iter().map(|r| r.forwarded()).collect()
    }

    /// Number of photons whose state Eve disturbed
    pub fn disturbed_count(&self) -> usize {
        self.records.iter().filter(|r| r.disturbed()).count()
    }
}

/// The intercept-resend attack
#[derive(Debug, Clone, Copy, Default)]
pub struct InterceptResend;

impl InterceptResend {
    /// Measure every photon in an independently drawn basis and replace it with
    /// Eve's own preparation.
    pub fn intercept(
        &self,
        channel: &dyn QubitChannel,
        photons: &[PreparedQubit],
        rng: &mut dyn RandomSource,
    ) -> Result<Interception> {
        let mut records = Vec::with_capacity(photons.len());

        for (index, photon) in photons.iter().enumerate() {
            let eve_basis = rng.basis();
            let eve_bit = channel.measure(photon, eve_basis, rng)?;
            records.push(InterceptedPhotonRecord {
                index,
                original: *photon,
                eve_basis,
                eve_bit,
            });
        }

        let interception = Interception { records };
        debug!(
            "Eve intercepted {} photons, disturbed {}",
            photons.len(),
            interception.disturbed_count()
        );
        Ok(interception)
    }
}
