// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Configuration management for the BB84 gateway

use crate::channel::MeasurementBackend;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GatewayConfig {
    /// Bind address for HTTP server
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Photons per run when a request omits `n`
    #[serde(default = "default_photon_count")]
    pub default_photon_count: usize,

    /// Largest `n` a single request may ask for
    #[serde(default = "default_max_photon_count")]
    pub max_photon_count: usize,

    /// Backend realizing single-qubit measurements
    #[serde(default)]
    pub measurement_backend: MeasurementBackend,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            default_photon_count: default_photon_count(),
            max_photon_count: default_max_photon_count(),
            measurement_backend: MeasurementBackend::default(),
            metrics_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("QKD_")
            .from_env()
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, with `QKD_*` environment variables taking precedence
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(::config::Environment::with_prefix("QKD").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_address
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid listen_address '{}': {}", self.listen_address, e)))?;

        if self.max_photon_count == 0 || self.max_photon_count > crate::MAX_PHOTON_COUNT {
            return Err(Error::Config(format!(
                "max_photon_count must be between 1 and {}",
                crate::MAX_PHOTON_COUNT
            )));
        }

        if self.default_photon_count > self.max_photon_count {
            return Err(Error::Config(
                "default_photon_count must be <= max_photon_count".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen_address: {}", e)))
    }
}

// Default value functions
fn default_listen_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_photon_count() -> usize {
    crate::DEFAULT_PHOTON_COUNT
}

fn default_max_photon_count() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}
