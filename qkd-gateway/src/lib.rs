// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! BB84 Gateway - HTTP front end for the protocol core
//!
//! Exposes protocol runs and the one-time pad over a small JSON API.
//!
//! # Endpoints
//!
//! - `POST /bb84` - run the protocol (`{"n": 20, "eve": false}`)
//! - `POST /encrypt` - one-time pad encryption with a derived key
//! - `POST /decrypt` - one-time pad decryption
//! - `POST /reconcile` - block parity report over a sifted key pair
//! - `GET /api/status` - counters and configuration summary
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use qkd_core::{
    channel::{Bit, QubitChannel},
    config::GatewayConfig,
    metrics::Metrics,
    otp,
    reconciliation::{self, ParityReport},
    session::{ProtocolRunner, SessionResult},
    Error,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: GatewayConfig,
    runner: Arc<ProtocolRunner<Box<dyn QubitChannel>>>,
    metrics: Metrics,
    start_time: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let channel = config.measurement_backend.channel();
        Self::with_channel(config, channel)
    }

    /// Build state around an explicit measurement channel
    pub fn with_channel(config: GatewayConfig, channel: Box<dyn QubitChannel>) -> Self {
        let runner = ProtocolRunner::new(channel);
        Self {
            config,
            runner: Arc::new(runner),
            metrics: Metrics::new(),
            start_time: Instant::now(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn reject(&self, err: Error) -> ApiError {
        self.metrics.record_failure();
        ApiError(err)
    }

    /// Unwrap a JSON body, reporting malformed input as a validation error
    fn accept<T>(&self, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
        payload
            .map(|Json(request)| request)
            .map_err(|rejection| self.reject(Error::Validation(rejection.body_text())))
    }

    /// Resolve the requested photon count; non-positive counts mean an empty run
    fn photon_count(&self, requested: Option<i64>) -> Result<usize, Error> {
        let n = match requested {
            None => return Ok(self.config.default_photon_count),
            Some(n) if n <= 0 => return Ok(0),
            Some(n) => n as u64,
        };

        if n > self.config.max_photon_count as u64 {
            return Err(Error::Validation(format!(
                "n must not exceed {} photons",
                self.config.max_photon_count
            )));
        }
        Ok(n as usize)
    }
}

/// Error response: `{"error": "..."}`
pub struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub n: Option<i64>,
    #[serde(default)]
    pub eve: bool,
}

#[derive(Debug, Deserialize)]
pub struct EncryptRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub key: Vec<Bit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub original_bits: Vec<Bit>,
    pub cipher_bits: Vec<Bit>,
    pub cipher_text: String,
}

#[derive(Debug, Deserialize)]
pub struct DecryptRequest {
    #[serde(rename = "cipherText", default)]
    pub cipher_text: String,
    #[serde(default)]
    pub key: Vec<Bit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub decrypted_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub alice_key: Vec<Bit>,
    pub bob_key: Vec<Bit>,
}

/// Gateway status response
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub version: String,
    pub measurement_backend: String,
    pub uptime_seconds: u64,
    pub sessions_total: u64,
    pub sessions_aborted: u64,
    pub abort_rate: f64,
    pub photons_sent: u64,
    pub keys_derived: u64,
    pub encryptions_total: u64,
    pub decryptions_total: u64,
    pub requests_failed: u64,
}

/// POST /bb84 - Run one protocol session
async fn run_protocol(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<SessionResult>, ApiError> {
    let request = state.accept(payload)?;
    let n = state.photon_count(request.n).map_err(|e| state.reject(e))?;
    let eve = request.eve;
    let start = Instant::now();

    // Large runs are CPU bound; keep them off the async workers
    let runner = state.runner.clone();
    let result = tokio::task::spawn_blocking(move || runner.run(n, eve))
        .await
        .map_err(|e| state.reject(Error::Internal(format!("Protocol task failed: {}", e))))?
        .map_err(|e| state.reject(e))?;

    if result.aborted {
        warn!(
            "Session aborted: qber {:.3} over {} sifted bits",
            result.qber,
            result.sifted_len()
        );
    }

    state
        .metrics
        .record_session(&result, start.elapsed().as_micros() as u64);
    Ok(Json(result))
}

/// POST /encrypt - One-time pad encryption
async fn encrypt_message(
    State(state): State<AppState>,
    payload: Result<Json<EncryptRequest>, JsonRejection>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let request = state.accept(payload)?;
    let payload = otp::encrypt(&request.message, &request.key).map_err(|e| state.reject(e))?;
    state.metrics.record_encryption();

    Ok(Json(EncryptResponse {
        original_bits: payload.message_bits,
        cipher_bits: payload.cipher_bits,
        cipher_text: payload.cipher_hex,
    }))
}

/// POST /decrypt - One-time pad decryption
async fn decrypt_message(
    State(state): State<AppState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let request = state.accept(payload)?;
    let decrypted_message =
        otp::decrypt(&request.cipher_text, &request.key).map_err(|e| state.reject(e))?;
    state.metrics.record_decryption();

    Ok(Json(DecryptResponse { decrypted_message }))
}

/// POST /reconcile - Block parity comparison
async fn reconcile(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<ParityReport>, ApiError> {
    let request = state.accept(payload)?;
    reconciliation::parity_report(&request.alice_key, &request.bob_key)
        .map(Json)
        .map_err(|e| state.reject(e))
}

/// GET /api/status - System status
async fn get_status(State(state): State<AppState>) -> Json<GatewayStatus> {
    let metrics = &state.metrics;
    Json(GatewayStatus {
        version: qkd_core::VERSION.to_string(),
        measurement_backend: state.runner.backend().to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        sessions_total: metrics.sessions_total(),
        sessions_aborted: metrics.sessions_aborted(),
        abort_rate: metrics.abort_rate(),
        photons_sent: metrics.photons_sent(),
        keys_derived: metrics.keys_derived(),
        encryptions_total: metrics.encryptions_total(),
        decryptions_total: metrics.decryptions_total(),
        requests_failed: metrics.requests_failed(),
    })
}

/// GET /health - Simple health check
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// GET /metrics - Prometheus metrics
async fn get_metrics(State(state): State<AppState>) -> Response {
    if !state.config.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        StatusCode::OK,
        [(hyper::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.prometheus_format(),
    )
        .into_response()
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/bb84", post(run_protocol))
        .route("/encrypt", post(encrypt_message))
        .route("/decrypt", post(decrypt_message))
        .route("/reconcile", post(reconcile))
        .route("/api/status", get(get_status))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
