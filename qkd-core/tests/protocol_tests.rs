// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

use proptest::prelude::*;
use qkd_core::channel::{BornRuleChannel, MeasurementBackend, StateVectorChannel};
use qkd_core::session::{self, ProtocolRunner};
use qkd_core::{FINAL_KEY_BITS, QBER_ABORT_THRESHOLD};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn clean_channel_qber_is_zero_over_many_runs() {
    let runner = ProtocolRunner::new(BornRuleChannel);
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..50 {
        let result = runner.run_with(200, false, &mut rng).unwrap();
        assert_eq!(result.qber, 0.0);
        assert!(!result.aborted);
    }
}

#[test]
fn intercept_resend_qber_approaches_one_quarter() {
    for backend in [MeasurementBackend::BornRule, MeasurementBackend::StateVector] {
        let runner = ProtocolRunner::new(backend.channel());
        let mut rng = StdRng::seed_from_u64(77);

        let mut errors = 0usize;
        let mut sifted = 0usize;
        for _ in 0..20 {
            let result = runner.run_with(2000, true, &mut rng).unwrap();
            errors += result.error_count();
            sifted += result.sifted_len();
        }

        let qber = errors as f64 / sifted as f64;
        assert!(
            (qber - 0.25).abs() < 0.02,
            "{}: pooled qber = {}",
            runner.backend(),
            qber
        );
    }
}

#[test]
fn sifted_length_is_about_half() {
    let runner = ProtocolRunner::new(StateVectorChannel);
    let mut rng = StdRng::seed_from_u64(31);
    let result = runner.run_with(10_000, false, &mut rng).unwrap();

    let ratio = result.sifted_len() as f64 / 10_000.0;
    assert!((ratio - 0.5).abs() < 0.03, "ratio = {}", ratio);
}

#[test]
fn system_random_runs_produce_keys() {
    let runner = ProtocolRunner::default();
    let result = runner.run(64, false).unwrap();
    assert_eq!(result.photon_count(), 64);
    assert_eq!(result.alice_bases.len(), 64);
    assert_eq!(result.bob_results.len(), 64);
    if result.sifted_len() > 0 {
        assert_eq!(result.final_key.len(), FINAL_KEY_BITS);
    }
}

#[test]
fn empty_runs_are_identical() {
    let runner = ProtocolRunner::default();
    let a = runner.run(0, false).unwrap();
    let b = runner.run(0, false).unwrap();
    assert_eq!(a, b);
    assert!(a.alice_bits.is_empty() && a.bob_key.is_empty());
    assert_eq!(a.qber, 0.0);
    assert!(!a.aborted);
    assert!(a.final_key.is_empty());
}

proptest! {
    #[test]
    fn session_invariants_hold(n in 0usize..300, eve in any::<bool>(), seed in any::<u64>()) {
        let runner = ProtocolRunner::new(BornRuleChannel);
        let mut rng = StdRng::seed_from_u64(seed);
        let result = runner.run_with(n, eve, &mut rng).unwrap();

        prop_assert_eq!(result.alice_bits.len(), n);
        prop_assert_eq!(result.bob_bases.len(), n);
        prop_assert_eq!(result.alice_key.len(), result.bob_key.len());

        let matching = result
            .alice_bases
            .iter()
            .zip(&result.bob_bases)
            .filter(|(a, b)| a == b)
            .count();
        prop_assert_eq!(result.sifted_len(), matching);

        let (alice_key, bob_key) = session::sift(
            &result.alice_bits,
            &result.alice_bases,
            &result.bob_bases,
            &result.bob_results,
        );
        prop_assert_eq!(&alice_key, &result.alice_key);
        prop_assert_eq!(&bob_key, &result.bob_key);

        prop_assert!((0.0..=1.0).contains(&result.qber));
        prop_assert_eq!(result.aborted, result.qber > QBER_ABORT_THRESHOLD);
        prop_assert_eq!(
            !result.final_key.is_empty(),
            !result.aborted && !result.alice_key.is_empty()
        );
        if !result.final_key.is_empty() {
            prop_assert_eq!(result.final_key.len(), FINAL_KEY_BITS);
        }
        prop_assert!(result.bob_results.iter().all(|&b| b <= 1));
    }

    #[test]
    fn clean_channel_never_aborts(n in 1usize..300, seed in any::<u64>()) {
        let runner = ProtocolRunner::new(StateVectorChannel);
        let mut rng = StdRng::seed_from_u64(seed);
        let result = runner.run_with(n, false, &mut rng).unwrap();
        prop_assert_eq!(&result.alice_key, &result.bob_key);
        prop_assert!(!result.aborted);
    }
}
