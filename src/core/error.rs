//! Error types for Satlink.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors raised while loading or validating [`crate::settings`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Role selector is neither `server` nor `client`.
    #[error("unknown role: {0:?} (expected \"server\" or \"client\")")]
    UnknownRole(String),

    /// A host field is empty.
    #[error("{field} must not be empty")]
    EmptyHost {
        /// Offending field.
        field: &'static str,
    },

    /// A port is outside `0..=65535` (or uses an unknown sentinel).
    #[error("{field} out of range: {value}")]
    InvalidPort {
        /// Offending field.
        field: &'static str,
        /// Raw configured value.
        value: String,
    },

    /// A numeric setting is below its lower bound.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Offending field.
        field: &'static str,
        /// Lower bound.
        min: u64,
        /// Configured value.
        value: u64,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Top-level Satlink errors.
#[derive(Debug, Error)]
pub enum SatlinkError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O error outside the transport thread (spawning, reading config).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::BelowMinimum {
            field: "max_message_size",
            min: 1024,
            value: 10,
        };
        assert_eq!(err.to_string(), "max_message_size must be at least 1024, got 10");

        let err = ConfigError::UnknownRole("relay".into());
        assert!(err.to_string().contains("\"relay\""));
    }

    #[test]
    fn test_json_error_converts_to_parse() {
        let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_satlink_error_wraps_layers() {
        let err: SatlinkError = ConfigError::EmptyHost { field: "server.host" }.into();
        assert!(matches!(err, SatlinkError::Config(_)));

        let err: SatlinkError = TransportError::ConnectionClosed.into();
        assert!(err.to_string().starts_with("transport error"));
    }
}
