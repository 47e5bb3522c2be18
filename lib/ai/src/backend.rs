//! LLM backend abstraction.
//!
//! Provides a unified interface over the supported providers. A backend
//! takes the whole conversation and returns the text of the next assistant
//! turn; provider-specific failure shapes are folded into [`LlmError`].

use crate::config::{Provider, ProviderConfig, SamplingParams};
use crate::error::LlmError;
use crate::huggingface::HuggingFaceBackend;
use crate::ollama::OllamaBackend;
use async_trait::async_trait;
use parley_core::Message;
use std::time::Duration;

/// Default timeout for a single provider request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for LLM backends.
///
/// This trait defines the interface that all providers must implement.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generates the next assistant reply for `history`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached, does not answer
    /// within the request timeout, reports a failure, or answers with a body
    /// that cannot be parsed.
    async fn generate(
        &self,
        history: &[Message],
        sampling: &SamplingParams,
    ) -> Result<String, LlmError>;

    /// Returns the provider type.
    fn provider(&self) -> Provider;

    /// Returns the model name.
    fn model(&self) -> &str;
}

/// Builds a backend for a validated provider configuration.
pub trait BackendFactory: Send + Sync {
    /// Returns a backend that talks to the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be constructed.
    fn backend(&self, config: &ProviderConfig) -> Result<Box<dyn ChatBackend>, LlmError>;
}

/// Factory for the HTTP backends, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackendFactory {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackendFactory {
    /// Creates a factory whose backends give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, timeout })
    }

    /// Returns the request timeout applied to every backend.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl BackendFactory for HttpBackendFactory {
    fn backend(&self, config: &ProviderConfig) -> Result<Box<dyn ChatBackend>, LlmError> {
        let backend: Box<dyn ChatBackend> = match config {
            ProviderConfig::Ollama(ollama) => Box::new(OllamaBackend::new(
                self.client.clone(),
                ollama.clone(),
                self.timeout,
            )),
            ProviderConfig::HuggingFace(hf) => Box::new(HuggingFaceBackend::new(
                self.client.clone(),
                hf.clone(),
                self.timeout,
            )),
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, LlmConfig};

    #[test]
    fn factory_selects_backend_by_provider() {
        let factory = HttpBackendFactory::new(DEFAULT_REQUEST_TIMEOUT).expect("client");

        let ollama = ProviderConfig::resolve(DEFAULT_MODEL, DEFAULT_OLLAMA_URL, None)
            .expect("valid config");
        let backend = factory.backend(&ollama).expect("backend");
        assert_eq!(backend.provider(), Provider::Ollama);
        assert_eq!(backend.model(), "llama3");

        let overrides = LlmConfig {
            provider: Some(Provider::HuggingFace),
            model_name: Some("gpt2".to_string()),
            ..LlmConfig::default()
        };
        let hf = ProviderConfig::resolve(DEFAULT_MODEL, DEFAULT_OLLAMA_URL, Some(&overrides))
            .expect("valid config");
        let backend = factory.backend(&hf).expect("backend");
        assert_eq!(backend.provider(), Provider::HuggingFace);
        assert_eq!(backend.model(), "gpt2");
    }

    #[test]
    fn factory_keeps_timeout() {
        let factory = HttpBackendFactory::new(Duration::from_secs(5)).expect("client");
        assert_eq!(factory.timeout(), Duration::from_secs(5));
    }
}
