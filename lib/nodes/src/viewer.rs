//! Output node that shows a transcript in the host UI.

use crate::error::NodeError;
use crate::node::{CATEGORY, Inputs, NodeDescriptor, NodeHandler, NodeOutput};
use crate::port::{InputPort, OutputPort, PortKind};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

pub struct ChatHistoryViewer {
    descriptor: NodeDescriptor,
}

impl ChatHistoryViewer {
    pub const CLASS_NAME: &'static str = "ChatHistoryViewer";

    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: NodeDescriptor {
                class_name: Self::CLASS_NAME.to_string(),
                display_name: "Chat History Viewer".to_string(),
                category: CATEGORY.to_string(),
                function: "show".to_string(),
                output_node: true,
                inputs: vec![InputPort::required("history", PortKind::multiline())],
                outputs: vec![OutputPort::new("history", "STRING")],
            },
        }
    }
}

impl Default for ChatHistoryViewer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for ChatHistoryViewer {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    async fn execute(&self, inputs: Inputs) -> Result<NodeOutput, NodeError> {
        let history = inputs
            .get("history")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(NodeOutput {
            result: vec![JsonValue::String(history.clone())],
            ui: Some(json!({ "text": [history] })),
        })
    }
}
