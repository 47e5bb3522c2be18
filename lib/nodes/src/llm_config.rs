//! The node that packages provider settings for the chat node.

use crate::chat::LLM_CONFIG_TYPE;
use crate::error::NodeError;
use crate::node::{CATEGORY, Inputs, NodeDescriptor, NodeHandler, NodeOutput, decode};
use crate::port::{InputPort, OutputPort, PortKind};
use async_trait::async_trait;
use parley_ai::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, LlmConfig, Provider};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LlmConfigInputs {
    provider: Provider,
    base_url: String,
    model_name: String,
    temperature: f64,
    top_p: f64,
    max_new_tokens: u32,
    hf_token: String,
}

impl From<LlmConfigInputs> for LlmConfig {
    fn from(inputs: LlmConfigInputs) -> Self {
        Self {
            provider: Some(inputs.provider),
            base_url: Some(inputs.base_url),
            model_name: Some(inputs.model_name),
            temperature: Some(inputs.temperature),
            top_p: Some(inputs.top_p),
            max_new_tokens: Some(inputs.max_new_tokens),
            hf_token: Some(inputs.hf_token),
            ..Self::default()
        }
    }
}

/// Builds an `LLM_CONFIG` value from widget inputs.
pub struct LlmConfigNode {
    descriptor: NodeDescriptor,
}

impl LlmConfigNode {
    pub const CLASS_NAME: &'static str = "LLMConfigNode";

    #[must_use]
    pub fn new() -> Self {
        let providers = [Provider::Ollama, Provider::HuggingFace].map(|p| p.as_str());
        Self {
            descriptor: NodeDescriptor {
                class_name: Self::CLASS_NAME.to_string(),
                display_name: "LLM Config".to_string(),
                category: CATEGORY.to_string(),
                function: "config".to_string(),
                output_node: false,
                inputs: vec![
                    InputPort::required(
                        "provider",
                        PortKind::choice(providers, Provider::Ollama.as_str()),
                    ),
                    InputPort::required("base_url", PortKind::text(DEFAULT_OLLAMA_URL)),
                    InputPort::required("model_name", PortKind::text(DEFAULT_MODEL)),
                    InputPort::required(
                        "temperature",
                        PortKind::Float {
                            default: 0.5,
                            min: 0.0,
                            max: 1.0,
                            step: 0.01,
                        },
                    ),
                    InputPort::required(
                        "top_p",
                        PortKind::Float {
                            default: 0.9,
                            min: 0.0,
                            max: 1.0,
                            step: 0.01,
                        },
                    ),
                    InputPort::required(
                        "max_new_tokens",
                        PortKind::Int {
                            default: 256,
                            min: 1,
                            max: 8192,
                            step: 1,
                        },
                    ),
                    InputPort::required("hf_token", PortKind::text("")),
                ],
                outputs: vec![OutputPort::new("llm_config", LLM_CONFIG_TYPE)],
            },
        }
    }
}

impl Default for LlmConfigNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for LlmConfigNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    async fn execute(&self, inputs: Inputs) -> Result<NodeOutput, NodeError> {
        let config = LlmConfig::from(decode::<LlmConfigInputs>(inputs)?);
        let value = serde_json::to_value(&config).map_err(|e| NodeError::ExecutionFailed {
            message: e.to_string(),
        })?;
        Ok(NodeOutput::new(vec![value]))
    }
}
