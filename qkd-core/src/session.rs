// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! BB84 protocol session
//!
//! A [`Bb84Session`] walks one protocol run through its states:
//!
//! ```text
//! Created ─> Encoded ─> (Intercepted) ─> Measured ─> Sifted ─> Evaluated ─┬─> Aborted
//!                                                                         └─> Keyed
//! ```
//!
//! [`ProtocolRunner`] drives a session end to end and returns an immutable
//! [`SessionResult`]. Sessions own no generator; every draw comes from the
//! [`RandomSource`] passed in.

use crate::channel::{Basis, Bit, PreparedQubit, QubitChannel};
use crate::eavesdropper::InterceptResend;
use crate::{privacy, random, Error, RandomSource, Result, QBER_ABORT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a protocol run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Encoded,
    Intercepted,
    Measured,
    Sifted,
    Evaluated,
    Aborted,
    Keyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::Encoded => "encoded",
            SessionState::Intercepted => "intercepted",
            SessionState::Measured => "measured",
            SessionState::Sifted => "sifted",
            SessionState::Evaluated => "evaluated",
            SessionState::Aborted => "aborted",
            SessionState::Keyed => "keyed",
        };
        f.write_str(name)
    }
}

/// One photon on the Alice-to-Bob link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonRecord {
    pub index: usize,
    pub encoded_bit: Bit,
    pub encoding_basis: Basis,
    pub measuring_basis: Basis,
    pub measured_bit: Bit,
}

impl PhotonRecord {
    /// Whether this photon survives sifting
    pub fn bases_match(&self) -> bool {
        self.encoding_basis == self.measuring_basis
    }
}

/// Everything a single run produces.
///
/// Field names double as the JSON wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub alice_bits: Vec<Bit>,
    pub alice_bases: Vec<Basis>,
    pub bob_bases: Vec<Basis>,
    pub bob_results: Vec<Bit>,
    /// Alice's sifted key
    pub alice_key: Vec<Bit>,
    /// Bob's sifted key, index-aligned with `alice_key`
    pub bob_key: Vec<Bit>,
    pub qber: f64,
    pub aborted: bool,
    /// 31 bits when keyed, empty otherwise
    pub final_key: Vec<Bit>,
    pub eve_present: bool,
}

impl SessionResult {
    /// The result of a run with no photons
    pub fn empty(eve_present: bool) -> Self {
        Self {
            alice_bits: Vec::new(),
            alice_bases: Vec::new(),
            bob_bases: Vec::new(),
            bob_results: Vec::new(),
            alice_key: Vec::new(),
            bob_key: Vec::new(),
            qber: 0.0,
            aborted: false,
            final_key: Vec::new(),
            eve_present,
        }
    }

    /// Photons sent
    pub fn photon_count(&self) -> usize {
        self.alice_bits.len()
    }

    pub fn sifted_len(&self) -> usize {
        self.alice_key.len()
    }

    /// Mismatched positions in the sifted key
    pub fn error_count(&self) -> usize {
        count_mismatches(&self.alice_key, &self.bob_key)
    }

    /// Alice-to-Bob view of every photon.
    ///
    /// The encoded pair is always Alice's; an eavesdropper never appears here.
    pub fn photon_records(&self) -> Vec<PhotonRecord> {
        self.alice_bits
            .iter()
            .zip(&self.alice_bases)
            .zip(self.bob_bases.iter().zip(&self.bob_results))
            .enumerate()
            .map(
                |(index, ((&encoded_bit, &encoding_basis), (&measuring_basis, &measured_bit)))| {
                    PhotonRecord {
                        index,
                        encoded_bit,
                        encoding_basis,
                        measuring_basis,
                        measured_bit,
                    }
                },
            )
            .collect()
    }
}

fn count_mismatches(a: &[Bit], b: &[Bit]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Fraction of mismatched sifted pairs; 0 for an empty sifted key
pub fn qber(alice_key: &[Bit], bob_key: &[Bit]) -> f64 {
    if alice_key.is_empty() {
        return 0.0;
    }
    count_mismatches(alice_key, bob_key) as f64 / alice_key.len() as f64
}

/// Keep `(alice_bit, bob_bit)` wherever the bases agree, in transmission order.
///
/// Only bases are compared here, never bit values.
pub fn sift(
    alice_bits: &[Bit],
    alice_bases: &[Basis],
    bob_bases: &[Basis],
    bob_results: &[Bit],
) -> (Vec<Bit>, Vec<Bit>) {
    alice_bases
        .iter()
        .zip(bob_bases)
        .zip(alice_bits.iter().zip(bob_results))
        .filter(|((a, b), _)| a == b)
        .map(|(_, (&alice, &bob))| (alice, bob))
        .unzip()
}

/// A single protocol run in progress
pub struct Bb84Session<'a> {
    channel: &'a dyn QubitChannel,
    state: SessionState,
    eve_present: bool,
    alice_bits: Vec<Bit>,
    alice_bases: Vec<Basis>,
    /// What Bob actually receives: Alice's photons, or Eve's replacements
    in_flight: Vec<PreparedQubit>,
    bob_bases: Vec<Basis>,
    bob_results: Vec<Bit>,
    alice_key: Vec<Bit>,
    bob_key: Vec<Bit>,
    qber: f64,
    final_key: Vec<Bit>,
}

impl<'a> Bb84Session<'a> {
    pub fn new(channel: &'a dyn QubitChannel) -> Self {
        Self {
            channel,
            state: SessionState::Created,
            eve_present: false,
            alice_bits: Vec::new(),
            alice_bases: Vec::new(),
            in_flight: Vec::new(),
            bob_bases: Vec::new(),
            bob_results: Vec::new(),
            alice_key: Vec::new(),
            bob_key: Vec::new(),
            qber: 0.0,
            final_key: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn expect_state(&self, allowed: &[SessionState], step: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "Cannot {} a session in state '{}'",
                step, self.state
            )))
        }
    }

    /// Alice draws `n` bits and `n` bases and prepares her photons
    pub fn encode(&mut self, n: usize, rng: &mut dyn RandomSource) -> Result<()> {
        self.expect_state(&[SessionState::Created], "encode")?;

        self.alice_bits = rng.bits(n);
        self.alice_bases = rng.bases(n);
        self.in_flight = self
            .alice_bits
            .iter()
            .zip(&self.alice_bases)
            .map(|(&bit, &basis)| self.channel.encode(bit, basis))
            .collect();

        self.state = SessionState::Encoded;
        debug!("Alice encoded {} photons", n);
        Ok(())
    }

    /// Eve measures every photon and forwards her own in its place
    pub fn intercept(&mut self, rng: &mut dyn RandomSource) -> Result<()> {
        self.expect_state(&[SessionState::Encoded], "intercept")?;

        let interception = InterceptResend.intercept(self.channel, &self.in_flight, rng)?;
        self.in_flight = interception.forwarded();
        self.eve_present = true;

        self.state = SessionState::Intercepted;
        Ok(())
    }

    /// Bob draws his bases and measures whatever arrives
    pub fn measure(&mut self, rng: &mut dyn RandomSource) -> Result<()> {
        self.expect_state(&[SessionState::Encoded, SessionState::Intercepted], "measure")?;

        let bob_bases = rng.bases(self.in_flight.len());
        let bob_results = self
            .in_flight
            .iter()
            .zip(&bob_bases)
            .map(|(photon, &basis)| self.channel.measure(photon, basis, rng))
            .collect::<Result<Vec<_>>>()?;

        self.bob_bases = bob_bases;
        self.bob_results = bob_results;
        self.state = SessionState::Measured;
        debug!("Bob measured {} photons", self.bob_results.len());
        Ok(())
    }

    /// Public basis reconciliation
    pub fn sift(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Measured], "sift")?;

        let (alice_key, bob_key) = sift(
            &self.alice_bits,
            &self.alice_bases,
            &self.bob_bases,
            &self.bob_results,
        );
        self.alice_key = alice_key;
        self.bob_key = bob_key;

        self.state = SessionState::Sifted;
        debug!(
            "Sifted {} of {} photons",
            self.alice_key.len(),
            self.alice_bits.len()
        );
        Ok(())
    }

    /// Estimate the QBER and decide whether to abort
    pub fn evaluate(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Sifted], "evaluate")?;

        self.qber = qber(&self.alice_key, &self.bob_key);
        self.state = SessionState::Evaluated;

        if self.qber > QBER_ABORT_THRESHOLD {
            warn!(
                "QBER {:.3} exceeds threshold {:.2}, aborting",
                self.qber, QBER_ABORT_THRESHOLD
            );
            self.state = SessionState::Aborted;
        }
        Ok(())
    }

    /// Privacy amplification over Alice's sifted key
    pub fn amplify(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Evaluated], "amplify")?;

        self.final_key = privacy::amplify(&self.alice_key);
        self.state = SessionState::Keyed;
        Ok(())
    }

    /// Freeze the session into its result
    pub fn finish(self) -> Result<SessionResult> {
        self.expect_state(&[SessionState::Aborted, SessionState::Keyed], "finish")?;

        Ok(SessionResult {
            alice_bits: self.alice_bits,
            alice_bases: self.alice_bases,
            bob_bases: self.bob_bases,
            bob_results: self.bob_results,
            alice_key: self.alice_key,
            bob_key: self.bob_key,
            qber: self.qber,
            aborted: self.state == SessionState::Aborted,
            final_key: self.final_key,
            eve_present: self.eve_present,
        })
    }
}

/// Runs complete BB84 sessions over a measurement backend
pub struct ProtocolRunner<C: QubitChannel = Box<dyn QubitChannel>> {
    channel: C,
}

impl<C: QubitChannel> ProtocolRunner<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Name of the backend in use
    pub fn backend(&self) -> &'static str {
        self.channel.name()
    }

    /// Run a session with `n` photons using the operating system's CSPRNG
    pub fn run(&self, n: usize, eavesdropping: bool) -> Result<SessionResult> {
        self.run_with(n, eavesdropping, &mut random::system())
    }

    /// Run a session with `n` photons, drawing every random choice from `rng`
    #[instrument(skip(self, rng), fields(backend = self.channel.name()))]
    pub fn run_with(
        &self,
        n: usize,
        eavesdropping: bool,
        rng: &mut dyn RandomSource,
    ) -> Result<SessionResult> {
        if n == 0 {
            debug!("No photons requested, returning empty session");
            return Ok(SessionResult::empty(eavesdropping));
        }

        let mut session = Bb84Session::new(&self.channel);
        session.encode(n, rng)?;
        if eavesdropping {
            session.intercept(rng)?;
        }
        session.measure(rng)?;
        session.sift()?;
        session.evaluate()?;
        if session.state() == SessionState::Evaluated {
            session.amplify()?;
        }

        let result = session.finish()?;
        info!(
            photons = n,
            sifted = result.sifted_len(),
            qber = result.qber,
            aborted = result.aborted,
            "BB84 session complete"
        );
        Ok(result)
    }
}

impl Default for ProtocolRunner<Box<dyn QubitChannel>> {
    fn default() -> Self {
        Self::new(crate::channel::MeasurementBackend::default().channel())
    }
}
