//! Class-name registry of host nodes.

use crate::chat::ChatNode;
use crate::error::NodeError;
use crate::llm_config::LlmConfigNode;
use crate::node::{NodeDescriptor, NodeHandler, NodeOutput};
use crate::viewer::ChatHistoryViewer;
use parley_conversation::ConversationController;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Maps class names to node handlers, in registration order.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    handlers: Vec<Arc<dyn NodeHandler>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the chat, LLM config and history viewer
    /// nodes.
    #[must_use]
    pub fn with_chat_nodes(controller: ConversationController) -> Self {
        let mut registry = Self::new();
        registry.register(ChatNode::new(controller));
        registry.register(LlmConfigNode::new());
        registry.register(ChatHistoryViewer::new());
        registry
    }

    /// Adds a handler, replacing any handler with the same class name.
    pub fn register(&mut self, handler: impl NodeHandler + 'static) {
        let class_name = handler.descriptor().class_name.clone();
        self.handlers
            .retain(|h| h.descriptor().class_name != class_name);
        self.handlers.push(Arc::new(handler));
    }

    /// Returns the handler registered under `class_name`.
    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers
            .iter()
            .find(|h| h.descriptor().class_name == class_name)
    }

    /// Returns every node descriptor.
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.handlers.iter().map(|h| h.descriptor())
    }

    /// Returns class name to display name.
    #[must_use]
    pub fn display_names(&self) -> BTreeMap<String, String> {
        self.descriptors()
            .map(|d| (d.class_name.clone(), d.display_name.clone()))
            .collect()
    }

    /// Validates `inputs` and runs the node registered under `class_name`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::UnknownNode`] for an unregistered class name,
    /// [`NodeError::InvalidInput`] if `inputs` is not an object or does not
    /// fit the node's ports, and whatever the node itself reports.
    #[instrument(skip(self, inputs))]
    pub async fn execute(
        &self,
        class_name: &str,
        inputs: JsonValue,
    ) -> Result<NodeOutput, NodeError> {
        let handler = self.get(class_name).ok_or_else(|| NodeError::UnknownNode {
            class_name: class_name.to_string(),
        })?;

        let raw = match inputs {
            JsonValue::Object(map) => map,
            JsonValue::Null => serde_json::Map::new(),
            other => {
                return Err(NodeError::InvalidInput {
                    message: format!("inputs must be an object, got {other}"),
                });
            }
        };

        let prepared = handler.descriptor().prepare_inputs(raw).inspect_err(|e| {
            warn!(error = %e, "Rejected node inputs");
        })?;

        debug!("Executing node");
        handler.execute(prepared).await
    }
}
