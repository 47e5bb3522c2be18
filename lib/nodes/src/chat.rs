//! The chat node and the request shape shared with the HTTP surface.

use crate::error::NodeError;
use crate::node::{CATEGORY, Inputs, NodeDescriptor, NodeHandler, NodeOutput, decode};
use crate::port::{InputPort, OutputPort, PortKind};
use async_trait::async_trait;
use parley_ai::{ConfigError, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, LlmConfig, ProviderConfig};
use parley_conversation::{ChatAction, ChatReply, ChatTurn, ConversationController};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Default session key when the caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Type name of the provider-settings value passed between nodes.
pub const LLM_CONFIG_TYPE: &str = "LLM_CONFIG";

/// One chat call as the host or an HTTP client sends it.
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub model_name: String,
    pub base_url: String,
    pub user_message: String,
    pub action: ChatAction,
    pub session_id: String,
    pub system_prompt: String,
    pub refresh_session: bool,
    pub llm_config: Option<LlmConfig>,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            user_message: String::new(),
            action: ChatAction::Send,
            session_id: DEFAULT_SESSION_ID.to_string(),
            system_prompt: String::new(),
            refresh_session: false,
            llm_config: None,
        }
    }
}

impl ChatRequest {
    /// Resolves the provider settings and builds the controller input.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged provider settings are invalid.
    pub fn into_turn(self) -> parley_core::Result<ChatTurn, ConfigError> {
        let provider =
            ProviderConfig::resolve(&self.model_name, &self.base_url, self.llm_config.as_ref())?;

        Ok(ChatTurn {
            action: self.action,
            session_id: self.session_id,
            user_message: self.user_message,
            system_prompt: self.system_prompt,
            refresh_session: self.refresh_session,
            provider,
        })
    }
}

/// Validates `request` and runs it through `controller`.
///
/// # Errors
///
/// Returns an error if the provider settings are invalid. Provider failures
/// are not errors; they come back as a marker in the reply.
pub async fn run_chat(
    controller: &ConversationController,
    request: ChatRequest,
) -> parley_core::Result<ChatReply, ConfigError> {
    let turn = request.into_turn()?;
    Ok(controller.act(turn).await)
}

/// Chat against a session from inside a graph.
pub struct ChatNode {
    controller: ConversationController,
    descriptor: NodeDescriptor,
}

impl ChatNode {
    /// Class name the node is registered under.
    pub const CLASS_NAME: &'static str = "ChatNode";

    #[must_use]
    pub fn new(controller: ConversationController) -> Self {
        let actions = ChatAction::ALL.map(|a| a.as_str());
        Self {
            controller,
            descriptor: NodeDescriptor {
                class_name: Self::CLASS_NAME.to_string(),
                display_name: "Chat (Ollama)".to_string(),
                category: CATEGORY.to_string(),
                function: "chat".to_string(),
                output_node: false,
                inputs: vec![
                    InputPort::required("model_name", PortKind::text(DEFAULT_MODEL)),
                    InputPort::required("base_url", PortKind::text(DEFAULT_OLLAMA_URL)),
                    InputPort::required("user_message", PortKind::multiline()),
                    InputPort::required(
                        "action",
                        PortKind::choice(actions, ChatAction::Send.as_str()),
                    ),
                    InputPort::optional("session_id", PortKind::text(DEFAULT_SESSION_ID)),
                    InputPort::optional("system_prompt", PortKind::multiline()),
                    InputPort::optional("refresh_session", PortKind::Boolean { default: false }),
                    // Front-end hint only.
                    InputPort::optional("auto_clear_input", PortKind::Boolean { default: true }),
                    InputPort::optional("llm_config", PortKind::custom(LLM_CONFIG_TYPE)),
                ],
                outputs: vec![
                    OutputPort::new("assistant_response", "STRING"),
                    OutputPort::new("readable_history", "STRING"),
                ],
            },
        }
    }
}

#[async_trait]
impl NodeHandler for ChatNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    async fn execute(&self, inputs: Inputs) -> Result<NodeOutput, NodeError> {
        let request: ChatRequest = decode(inputs)?;
        debug!(session_id = %request.session_id, action = %request.action, "Running chat node");

        let reply = run_chat(&self.controller, request)
            .await
            .map_err(|report| NodeError::InvalidInput {
                message: report.to_string(),
            })?;

        Ok(NodeOutput::new(vec![
            JsonValue::String(reply.assistant_response),
            JsonValue::String(reply.readable_history),
        ]))
    }
}
