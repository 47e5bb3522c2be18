//! Error types for the AI crate.
//!
//! - `LlmError`: a provider call failed; every adapter reports through it
//! - `ConfigError`: per-call provider settings were rejected before any
//!   network access, returned inside a rootcause `Report`

use std::fmt;
use std::time::Duration;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The request never produced an HTTP response.
    Transport { endpoint: String, reason: String },
    /// The provider did not answer within the request timeout.
    Timeout { endpoint: String, after: Duration },
    /// The provider answered with a non-2xx status or reported an error.
    Provider {
        status: Option<u16>,
        reason: String,
    },
    /// The response body did not have the expected shape.
    ResponseParseFailed { reason: String },
    /// The backend could not be constructed.
    InvalidConfig { reason: String },
}

impl LlmError {
    /// Classifies a reqwest send/receive failure.
    #[must_use]
    pub fn from_transport(endpoint: &str, timeout: Duration, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                after: timeout,
            }
        } else {
            Self::Transport {
                endpoint: endpoint.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { endpoint, reason } => {
                write!(f, "request to '{endpoint}' failed: {reason}")
            }
            Self::Timeout { endpoint, after } => {
                write!(
                    f,
                    "request to '{endpoint}' timed out after {}s",
                    after.as_secs_f32()
                )
            }
            Self::Provider {
                status: Some(status),
                reason,
            } => write!(f, "provider returned HTTP {status}: {reason}"),
            Self::Provider {
                status: None,
                reason,
            } => write!(f, "provider reported an error: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from validating per-call provider settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No model name was supplied.
    MissingModel,
    /// A URL could not be parsed or is not http(s).
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// A sampling parameter is outside its accepted range.
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingModel => write!(f, "model_name must not be empty"),
            Self::InvalidUrl {
                field,
                value,
                reason,
            } => write!(f, "invalid {field} '{value}': {reason}"),
            Self::OutOfRange {
                field,
                value,
                range,
            } => write!(f, "{field} = {value} is outside {range}"),
        }
    }
}

impl std::error::Error for ConfigError {}
