// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Metrics collection and reporting

use crate::session::SessionResult;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const LATENCY_WINDOW: usize = 10_000;

/// Global metrics collector
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,

    // Protocol metrics
    sessions_total: AtomicU64,
    sessions_aborted: AtomicU64,
    sessions_eavesdropped: AtomicU64,
    photons_sent: AtomicU64,
    sifted_bits: AtomicU64,
    keys_derived: AtomicU64,

    // Cipher metrics
    encryptions_total: AtomicU64,
    decryptions_total: AtomicU64,

    requests_failed: AtomicU64,

    // Session latency (microseconds)
    session_latencies: RwLock<Vec<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                sessions_total: AtomicU64::new(0),
                sessions_aborted: AtomicU64::new(0),
                sessions_eavesdropped: AtomicU64::new(0),
                photons_sent: AtomicU64::new(0),
                sifted_bits: AtomicU64::new(0),
                keys_derived: AtomicU64::new(0),
                encryptions_total: AtomicU64::new(0),
                decryptions_total: AtomicU64::new(0),
                requests_failed: AtomicU64::new(0),
                session_latencies: RwLock::new(Vec::with_capacity(LATENCY_WINDOW)),
            }),
        }
    }

    // Protocol metrics
    pub fn record_session(&self, result: &SessionResult, latency_micros: u64) {
        let inner = &self.inner;
        inner.sessions_total.fetch_add(1, Ordering::Relaxed);
        inner
            .photons_sent
            .fetch_add(result.photon_count() as u64, Ordering::Relaxed);
        inner
            .sifted_bits
            .fetch_add(result.sifted_len() as u64, Ordering::Relaxed);
        if result.aborted {
            inner.sessions_aborted.fetch_add(1, Ordering::Relaxed);
        }
        if result.eve_present {
            inner.sessions_eavesdropped.fetch_add(1, Ordering::Relaxed);
        }
        if !result.final_key.is_empty() {
            inner.keys_derived.fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = inner.session_latencies.write();
        latencies.push(latency_micros);
        if latencies.len() > LATENCY_WINDOW {
            latencies.drain(0..LATENCY_WINDOW / 2);
        }
    }

    pub fn sessions_total(&self) -> u64 {
        self.inner.sessions_total.load(Ordering::Relaxed)
    }

    pub fn sessions_aborted(&self) -> u64 {
        self.inner.sessions_aborted.load(Ordering::Relaxed)
    }

    pub fn sessions_eavesdropped(&self) -> u64 {
        self.inner.sessions_eavesdropped.load(Ordering::Relaxed)
    }

    pub fn photons_sent(&self) -> u64 {
        self.inner.photons_sent.load(Ordering::Relaxed)
    }

    pub fn sifted_bits(&self) -> u64 {
        self.inner.sifted_bits.load(Ordering::Relaxed)
    }

    pub fn keys_derived(&self) -> u64 {
        self.inner.keys_derived.load(Ordering::Relaxed)
    }

    // Cipher metrics
    pub fn record_encryption(&self) {
        self.inner.encryptions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decryption(&self) {
        self.inner.decryptions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encryptions_total(&self) -> u64 {
        self.inner.encryptions_total.load(Ordering::Relaxed)
    }

    pub fn decryptions_total(&self) -> u64 {
        self.inner.decryptions_total.load(Ordering::Relaxed)
    }

    pub fn record_failure(&self) {
        self.inner.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_failed(&self) -> u64 {
        self.inner.requests_failed.load(Ordering::Relaxed)
    }

    // Derived metrics
    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    /// Fraction of sessions aborted because of a high QBER
    pub fn abort_rate(&self) -> f64 {
        let total = self.sessions_total();
        if total > 0 {
            self.sessions_aborted() as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn latency_percentile(&self, percentile: f64) -> Option<u64> {
        let latencies = self.inner.session_latencies.read();
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let index = ((sorted.len() as f64 * percentile).ceil() as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }

    pub fn latency_p50(&self) -> Option<u64> {
        self.latency_percentile(0.50)
    }

    pub fn latency_p99(&self) -> Option<u64> {
        self.latency_percentile(0.99)
    }

    /// Generate Prometheus-compatible metrics output
    pub fn prometheus_format(&self) -> String {
        let mut output = String::new();

        let mut counter = |name: &str, help: &str, value: u64| {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        };

        counter("bb84_sessions_total", "Total number of protocol runs", self.sessions_total());
        counter("bb84_sessions_aborted", "Runs aborted for exceeding the QBER threshold", self.sessions_aborted());
        counter("bb84_sessions_eavesdropped", "Runs with the eavesdropper enabled", self.sessions_eavesdropped());
        counter("bb84_photons_sent", "Total photons transmitted", self.photons_sent());
        counter("bb84_sifted_bits", "Total bits surviving sifting", self.sifted_bits());
        counter("bb84_keys_derived", "Final keys produced by privacy amplification", self.keys_derived());
        counter("bb84_encryptions_total", "One-time pad encryptions", self.encryptions_total());
        counter("bb84_decryptions_total", "One-time pad decryptions", self.decryptions_total());
        counter("bb84_requests_failed", "Requests rejected with an error", self.requests_failed());

        output.push_str("# HELP bb84_uptime_seconds Service uptime in seconds\n");
        output.push_str("# TYPE bb84_uptime_seconds gauge\n");
        output.push_str(&format!("bb84_uptime_seconds {}\n", self.uptime_seconds()));

        if let Some(p50) = self.latency_p50() {
            output.push_str("# HELP bb84_session_latency_p50_microseconds Session latency 50th percentile\n");
            output.push_str("# TYPE bb84_session_latency_p50_microseconds gauge\n");
            output.push_str(&format!("bb84_session_latency_p50_microseconds {}\n", p50));
        }

        if let Some(p99) = self.latency_p99() {
            output.push_str("# HELP bb84_session_latency_p99_microseconds Session latency 99th percentile\n");
            output.push_str("# TYPE bb84_session_latency_p99_microseconds gauge\n");
            output.push_str(&format!("bb84_session_latency_p99_microseconds {}\n", p99));
        }

        output
    }
}
