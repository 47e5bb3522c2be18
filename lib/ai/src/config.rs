//! Per-call provider configuration.
//!
//! Callers hand over loosely-typed settings (an [`LlmConfig`] object plus a
//! default model name and base URL). [`ProviderConfig::resolve`] merges and
//! validates them once, producing a tagged variant that the backends can
//! use without further lookups.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama3";

/// Available LLM providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama instance.
    #[default]
    Ollama,
    /// Hugging-Face-style text-generation inference endpoint.
    HuggingFace,
}

impl Provider {
    /// Returns the wire name of the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::HuggingFace => "huggingface",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loosely-typed provider settings as produced by the LLM Config node.
///
/// Every field is optional; present values override the per-call defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_api_url: Option<String>,
}

/// Optional sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_new_tokens: Option<u32>,
    pub seed: Option<i64>,
}

impl SamplingParams {
    /// Returns true if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.max_new_tokens.is_none()
            && self.seed.is_none()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(temperature) = self.temperature
            && !(temperature.is_finite() && temperature >= 0.0)
        {
            return Err(ConfigError::OutOfRange {
                field: "temperature",
                value: temperature,
                range: "[0, inf)",
            });
        }
        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            return Err(ConfigError::OutOfRange {
                field: "top_p",
                value: top_p,
                range: "[0, 1]",
            });
        }
        if self.max_new_tokens == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "max_new_tokens",
                value: 0.0,
                range: "[1, inf)",
            });
        }
        Ok(())
    }
}

/// Settings for the Ollama chat backend.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server base URL without a trailing slash.
    pub base_url: String,
    pub model: String,
    pub sampling: SamplingParams,
}

/// Settings for the Hugging-Face-style inference backend.
#[derive(Clone, PartialEq)]
pub struct HuggingFaceConfig {
    pub model: String,
    /// Bearer token; `None` sends the request unauthenticated.
    pub token: Option<String>,
    /// Explicit endpoint; `None` uses the hosted per-model endpoint.
    pub api_url: Option<String>,
    pub sampling: SamplingParams,
}

impl HuggingFaceConfig {
    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => format!(
                "https://api-inference.huggingface.co/models/{}",
                self.model
            ),
        }
    }
}

impl fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("model", &self.model)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("sampling", &self.sampling)
            .finish()
    }
}

/// Validated provider selection for one chat call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Ollama(OllamaConfig),
    HuggingFace(HuggingFaceConfig),
}

impl ProviderConfig {
    /// Merges `overrides` over the per-call defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the model name is blank, a URL is not absolute
    /// http(s), or a sampling parameter is out of range.
    pub fn resolve(
        model_name: &str,
        base_url: &str,
        overrides: Option<&LlmConfig>,
    ) -> parley_core::Result<Self, ConfigError> {
        let overrides = overrides.cloned().unwrap_or_default();

        let model = overrides
            .model_name
            .as_deref()
            .unwrap_or(model_name)
            .trim()
            .to_string();
        if model.is_empty() {
            return Err(ConfigError::MissingModel.into());
        }

        let sampling = SamplingParams {
            temperature: overrides.temperature,
            top_p: overrides.top_p,
            max_new_tokens: overrides.max_new_tokens,
            seed: overrides.seed,
        };
        sampling.validate()?;

        let config = match overrides.provider.unwrap_or_default() {
            Provider::Ollama => {
                let base_url = overrides.base_url.as_deref().unwrap_or(base_url).trim();
                check_http_url("base_url", base_url)?;
                Self::Ollama(OllamaConfig {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    model,
                    sampling,
                })
            }
            Provider::HuggingFace => {
                let api_url = non_blank(overrides.hf_api_url);
                if let Some(url) = &api_url {
                    check_http_url("hf_api_url", url)?;
                }
                Self::HuggingFace(HuggingFaceConfig {
                    model,
                    token: non_blank(overrides.hf_token),
                    api_url,
                    sampling,
                })
            }
        };

        Ok(config)
    }

    /// Returns the provider this configuration targets.
    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            Self::Ollama(_) => Provider::Ollama,
            Self::HuggingFace(_) => Provider::HuggingFace,
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Ollama(config) => &config.model,
            Self::HuggingFace(config) => &config.model,
        }
    }

    /// Returns the sampling parameters.
    #[must_use]
    pub fn sampling(&self) -> &SamplingParams {
        match self {
            Self::Ollama(config) => &config.sampling,
            Self::HuggingFace(config) => &config.sampling,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };

    let url = reqwest::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
