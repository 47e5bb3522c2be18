//! Ollama chat backend.
//!
//! Sends the conversation in chat format to `{base_url}/api/chat` with
//! streaming disabled and reads the reply from `message.content`.

use crate::backend::ChatBackend;
use crate::config::{OllamaConfig, Provider, SamplingParams};
use crate::error::LlmError;
use async_trait::async_trait;
use parley_core::{GenerationId, Message};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    config: OllamaConfig,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl ChatOptions {
    fn from_sampling(sampling: &SamplingParams) -> Option<Self> {
        if sampling.is_empty() {
            return None;
        }
        Some(Self {
            seed: sampling.seed,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            num_predict: sampling.max_new_tokens,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OllamaBackend {
    /// Creates a backend using `client` for transport.
    #[must_use]
    pub fn new(client: reqwest::Client, config: OllamaConfig, timeout: Duration) -> Self {
        Self {
            client,
            config,
            timeout,
        }
    }

    /// Returns the chat endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    fn parse_reply(body: &str) -> Result<String, LlmError> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        Ok(response
            .message
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    #[instrument(
        skip(self, history, sampling),
        fields(
            generation_id = %GenerationId::new(),
            model = %self.config.model,
            messages = history.len(),
        )
    )]
    async fn generate(
        &self,
        history: &[Message],
        sampling: &SamplingParams,
    ) -> Result<String, LlmError> {
        let endpoint = self.endpoint();
        let request = ChatRequest {
            model: &self.config.model,
            messages: history,
            stream: false,
            options: ChatOptions::from_sampling(sampling),
        };

        debug!(endpoint = %endpoint, "Sending Ollama chat request");

        let response = self
            .client
            .post(&endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %endpoint, "Ollama request failed");
                LlmError::from_transport(&endpoint, self.timeout, &e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(&endpoint, self.timeout, &e))?;

        if !status.is_success() {
            warn!(endpoint = %endpoint, status = %status, body = %body, "Ollama returned error");
            return Err(LlmError::Provider {
                status: Some(status.as_u16()),
                reason: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let reply = Self::parse_reply(&body)?;
        debug!(chars = reply.len(), "Ollama reply received");
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
