//! Hugging-Face-style text-generation backend.
//!
//! The history is flattened into one prompt (see [`format_prompt`]) and sent
//! as `{"inputs": ..., "parameters": ...}`. Endpoints answer either with an
//! object or a one-element array of objects carrying `generated_text`, and
//! may echo the prompt in front of the completion.

use crate::backend::ChatBackend;
use crate::config::{HuggingFaceConfig, Provider, SamplingParams};
use crate::error::LlmError;
use crate::prompt::format_prompt;
use async_trait::async_trait;
use parley_core::{GenerationId, Message};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for a Hugging-Face-style inference endpoint.
#[derive(Debug, Clone)]
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    config: HuggingFaceConfig,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<GenerateParameters>,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
}

impl GenerateParameters {
    fn from_sampling(sampling: &SamplingParams) -> Option<Self> {
        if sampling.temperature.is_none()
            && sampling.top_p.is_none()
            && sampling.max_new_tokens.is_none()
        {
            return None;
        }
        Some(Self {
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            max_new_tokens: sampling.max_new_tokens,
        })
    }
}

impl HuggingFaceBackend {
    /// Creates a backend using `client` for transport.
    #[must_use]
    pub fn new(client: reqwest::Client, config: HuggingFaceConfig, timeout: Duration) -> Self {
        Self {
            client,
            config,
            timeout,
        }
    }

    /// Pulls the completion out of a decoded response body.
    fn extract_text(data: JsonValue, prompt: &str) -> Result<String, LlmError> {
        let item = match data {
            JsonValue::Array(items) => items.into_iter().next(),
            other => Some(other),
        };

        let text = match item {
            None => String::new(),
            Some(JsonValue::String(text)) => text,
            Some(JsonValue::Object(mut fields)) => {
                if let Some(error) = fields.get("error")
                    && is_set(error)
                {
                    return Err(LlmError::Provider {
                        status: None,
                        reason: match error {
                            JsonValue::String(message) => message.clone(),
                            other => other.to_string(),
                        },
                    });
                }
                match fields.remove("generated_text") {
                    None | Some(JsonValue::Null) => String::new(),
                    Some(JsonValue::String(text)) => text,
                    Some(other) => {
                        return Err(LlmError::ResponseParseFailed {
                            reason: format!("generated_text is not a string: {other}"),
                        });
                    }
                }
            }
            Some(other) => {
                return Err(LlmError::ResponseParseFailed {
                    reason: format!("unexpected response shape: {other}"),
                });
            }
        };

        let text = text.strip_prefix(prompt).unwrap_or(&text);
        Ok(text.trim().to_string())
    }
}

fn is_set(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null | JsonValue::Bool(false) => false,
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[async_trait]
impl ChatBackend for HuggingFaceBackend {
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
        let endpoint = self.config.endpoint();
        let prompt = format_prompt(history);
        let request = GenerateRequest {
            inputs: &prompt,
            parameters: GenerateParameters::from_sampling(sampling),
        };

        debug!(endpoint = %endpoint, prompt_chars = prompt.len(), "Sending inference request");

        let mut builder = self
            .client
            .post(&endpoint)
            .timeout(self.timeout)
            .json(&request);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, endpoint = %endpoint, "Inference request failed");
            LlmError::from_transport(&endpoint, self.timeout, &e)
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(&endpoint, self.timeout, &e))?;

        if !status.is_success() {
            warn!(endpoint = %endpoint, status = %status, body = %body, "Inference endpoint returned error");
            return Err(LlmError::Provider {
                status: Some(status.as_u16()),
                reason: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let data: JsonValue =
            serde_json::from_str(&body).map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        let reply = Self::extract_text(data, &prompt)?;
        debug!(chars = reply.len(), "Inference reply received");
        Ok(reply)
    }

    fn provider(&self) -> Provider {
        Provider::HuggingFace
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
