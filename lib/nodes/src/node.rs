//! Host node types.
//!
//! A node is a typed operation the host can place in a graph. Each node has:
//! - A class name the host registers it under, plus a display name
//! - A category and the name of the function the host invokes
//! - Input ports (with defaults and ranges) and output ports

use crate::error::NodeError;
use crate::port::{InputPort, OutputPort};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

/// Category every parley node is listed under.
pub const CATEGORY: &str = "ChatOptimize";

/// Named input values for one node execution.
pub type Inputs = Map<String, JsonValue>;

/// Everything the host needs to register a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    pub class_name: String,
    pub display_name: String,
    pub category: String,
    /// Name of the entry point the host calls.
    pub function: String,
    /// Output nodes are always executed and may return a UI payload.
    pub output_node: bool,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
}

impl NodeDescriptor {
    /// Returns the input port with the given name, if any.
    #[must_use]
    pub fn input_port(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Returns the output port with the given name, if any.
    #[must_use]
    pub fn output_port(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Validates `raw` against the input ports and fills in defaults.
    ///
    /// Null counts as absent. Keys without a matching port are passed
    /// through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidInput`] if a required input without a
    /// default is missing or a present value does not fit its port.
    pub fn prepare_inputs(&self, mut raw: Inputs) -> Result<Inputs, NodeError> {
        for port in &self.inputs {
            match raw.get(&port.name) {
                Some(value) if !value.is_null() => port.kind.check(&port.name, value)?,
                _ => match port.kind.default_value() {
                    Some(default) => {
                        raw.insert(port.name.clone(), default);
                    }
                    None if port.required => {
                        return Err(NodeError::invalid_input(
                            &port.name,
                            "required input is missing",
                        ));
                    }
                    None => {
                        raw.remove(&port.name);
                    }
                },
            }
        }
        Ok(raw)
    }
}

/// What a node produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    /// One value per output port, in port order.
    pub result: Vec<JsonValue>,
    /// Payload for the host's display widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<JsonValue>,
}

impl NodeOutput {
    /// Creates an output with no UI payload.
    #[must_use]
    pub fn new(result: Vec<JsonValue>) -> Self {
        Self { result, ui: None }
    }
}

/// A node implementation.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Returns the node's registration data.
    fn descriptor(&self) -> &NodeDescriptor;

    /// Runs the node on inputs already checked by
    /// [`NodeDescriptor::prepare_inputs`].
    async fn execute(&self, inputs: Inputs) -> Result<NodeOutput, NodeError>;
}

/// Decodes prepared inputs into a typed request.
pub(crate) fn decode<T: DeserializeOwned>(inputs: Inputs) -> Result<T, NodeError> {
    serde_json::from_value(JsonValue::Object(inputs)).map_err(|e| NodeError::InvalidInput {
        message: e.to_string(),
    })
}
