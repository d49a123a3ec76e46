// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! Error types for the BB84 system
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! No variant is transient: every failure is terminal for the call that produced it.

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for protocol and cipher operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing key material or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed hexadecimal cipher text
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Input outside the supported range
    #[error("Validation error: {0}")]
    Validation(String),

    /// The measurement backend failed outright
    #[error("Measurement error: {0}")]
    Measurement(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if the error was caused by caller input rather than by the system
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Decoding(_) | Error::Validation(_)
        )
    }
}

// Conversions for common error types
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        assert!(Error::Config("No secure key available".into()).is_user_error());
        assert!(Error::Decoding("bad digit".into()).is_user_error());
        assert!(Error::Validation("too many photons".into()).is_user_error());
        assert!(!Error::Measurement("backend offline".into()).is_user_error());
        assert!(!Error::Internal("out of order".into()).is_user_error());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::Config("No secure key available".to_string());
        assert_eq!(err.to_string(), "Configuration error: No secure key available");
    }
}
