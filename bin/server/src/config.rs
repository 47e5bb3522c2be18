//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from `PARLEY_`-prefixed environment
//! variables. Nested keys use `__`, e.g. `PARLEY_LLM__DEFAULT_MODEL`.

use parley_ai::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_REQUEST_TIMEOUT};
use rootcause::Report;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Provider defaults.
    #[serde(default)]
    pub llm: LlmSettings,
}

/// Provider-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// Timeout for a single provider request, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Model used when a chat request does not name one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Ollama URL used when a chat request does not name one.
    #[serde(default = "default_base_url")]
    pub default_base_url: String,

    /// Strip code fences and whitespace from generated replies.
    #[serde(default)]
    pub clean_responses: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:8188".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout_seconds(),
            default_model: default_model(),
            default_base_url: default_base_url(),
            clean_responses: false,
        }
    }
}

impl LlmSettings {
    /// Returns the provider request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its field.
    pub fn from_env() -> Result<Self, Report<config::ConfigError>> {
        Self::from_environment(config::Environment::with_prefix("PARLEY"))
    }

    fn from_environment(
        environment: config::Environment,
    ) -> Result<Self, Report<config::ConfigError>> {
        let config = config::Config::builder()
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, Report<config::ConfigError>> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_environment(
            config::Environment::with_prefix("PARLEY").source(Some(source)),
        )
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).expect("defaults");
        assert_eq!(config.bind_address, "127.0.0.1:8188");
        assert_eq!(config.llm.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.llm.default_model, "llama3");
        assert_eq!(config.llm.default_base_url, "http://127.0.0.1:11434");
        assert!(!config.llm.clean_responses);
    }

    #[test]
    fn nested_variables_override_defaults() {
        let config = load(&[
            ("PARLEY_BIND_ADDRESS", "0.0.0.0:9000"),
            ("PARLEY_LLM__REQUEST_TIMEOUT_SECONDS", "5"),
            ("PARLEY_LLM__CLEAN_RESPONSES", "true"),
        ])
        .expect("valid");

        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.llm.request_timeout_seconds, 5);
        assert!(config.llm.clean_responses);
    }

    #[test]
    fn unparseable_value_is_an_error() {
        assert!(load(&[("PARLEY_LLM__REQUEST_TIMEOUT_SECONDS", "soon")]).is_err());
    }
}
