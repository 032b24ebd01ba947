//! Error types for the vbench sweep.
//!
//! Errors are split by the stage that raises them so the driver can decide
//! which ones end the run (model, I/O, output) and which ones are recorded
//! and skipped (parse failures, unless strict parsing is configured).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for vbench operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The model call failed and was not recovered by the retry policy
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// A response did not conform to its declared format (strict parsing only)
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A test-case image could not be read
    #[error("Failed to read image for test '{name}' at {path}: {source}")]
    Asset {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating an output directory or writing an output file failed
    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tabular results writer failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors (stats mirror)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required environment-backed setting is missing
    #[error("Missing setting {setting}: {hint}")]
    MissingSetting { setting: String, hint: String },
}

/// Failures of a single model invocation.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The service rejected the call for rate-limiting reasons (HTTP 429)
    #[error("Quota exceeded for {model}: {message}")]
    QuotaExceeded { model: String, message: String },

    /// Any other failure: auth, malformed request, network fault, empty response
    #[error("Request to {model} failed: {message}")]
    Transport {
        model: String,
        message: String,
        status_code: Option<u16>,
    },
}

impl ModelError {
    /// Classify a non-success HTTP response by its status code.
    pub fn from_status(model: &str, status_code: u16, body: &str) -> Self {
        let message = format!("HTTP {status_code}: {body}");
        if status_code == 429 {
            Self::QuotaExceeded {
                model: model.to_string(),
                message,
            }
        } else {
            Self::Transport {
                model: model.to_string(),
                message,
                status_code: Some(status_code),
            }
        }
    }

    /// Whether this error signals rate limiting.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// A response body that could not be parsed in its declared format.
#[derive(Error, Debug)]
#[error("{format} response did not parse: {message}")]
pub struct ParseError {
    pub format: String,
    pub message: String,
}

/// Convenience type alias for vbench results.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_is_quota_exceeded() {
        let err = ModelError::from_status("gemini-1.5-pro-001", 429, "RESOURCE_EXHAUSTED");
        assert!(err.is_quota_exceeded());
        assert!(err.to_string().contains("gemini-1.5-pro-001"));
    }

    #[test]
    fn test_other_statuses_are_transport() {
        for code in [400, 401, 403, 404, 500, 503] {
            let err = ModelError::from_status("m", code, "nope");
            assert!(!err.is_quota_exceeded(), "status {code}");
            match err {
                ModelError::Transport { status_code, .. } => assert_eq!(status_code, Some(code)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_body_mentioning_429_is_not_quota() {
        // Classification follows the status code, not the message text
        let err = ModelError::from_status("m", 400, "field 429 is invalid");
        assert!(!err.is_quota_exceeded());
    }
}
