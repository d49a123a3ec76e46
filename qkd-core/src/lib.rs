// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! BB84 Core Library
//!
//! This crate provides the protocol core of the BB84 quantum key distribution simulator:
//! qubit preparation and measurement, the intercept-resend eavesdropper, the sifting and
//! QBER pipeline, privacy amplification, and the one-time pad driven by the derived key.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `random`: Cryptographically secure bits, bases and bounded integers
//! - `channel`: Single-qubit encoding and basis-dependent measurement
//! - `eavesdropper`: Intercept-resend attack model
//! - `session`: The BB84 state machine and protocol runner
//! - `privacy`: Hash-based privacy amplification
//! - `reconciliation`: Cascade-style block parity report
//! - `otp`: One-time pad cipher with text, bit and hex codecs
//! - `config`: Gateway configuration with validation
//! - `metrics`: Counters and Prometheus rendering
//! - `error`: Unified error types
//!
//! # Data flow
//!
//! ```text
//! RandomSource ──> Bb84Session ──(QubitChannel, optional InterceptResend)──> final key ──> otp
//! ```

pub mod channel;
pub mod config;
pub mod eavesdropper;
pub mod error;
pub mod metrics;
pub mod otp;
pub mod privacy;
pub mod random;
pub mod reconciliation;
pub mod session;

pub use channel::{Basis, Bit, PreparedQubit, QubitChannel};
pub use error::{Error, Result};
pub use random::RandomSource;
pub use session::{ProtocolRunner, SessionResult};

/// Library version reported by the gateway
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Photons sent when a request does not name a count
pub const DEFAULT_PHOTON_COUNT: usize = 20;

/// Largest photon count the gateway accepts per run
pub const MAX_PHOTON_COUNT: usize = 100_000;

/// Sessions whose QBER exceeds this fraction are aborted
pub const QBER_ABORT_THRESHOLD: f64 = 0.15;

/// Length of the key produced by privacy amplification
pub const FINAL_KEY_BITS: usize = 31;
