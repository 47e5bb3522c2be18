//! Node-graph host surface for parley.
//!
//! This crate describes the operations a visual node-graph host can place
//! in a graph and runs them:
//!
//! - **Ports**: typed inputs and outputs with defaults, ranges and choices
//! - **Nodes**: the chat node, the LLM config node and the history viewer
//! - **Registry**: class-name lookup, input validation and dispatch

pub mod chat;
pub mod error;
pub mod llm_config;
pub mod node;
pub mod port;
pub mod registry;
pub mod viewer;

pub use chat::{ChatNode, ChatRequest, run_chat};
pub use error::NodeError;
pub use llm_config::LlmConfigNode;
pub use node::{Inputs, NodeDescriptor, NodeHandler, NodeOutput};
pub use port::{InputPort, OutputPort, PortKind};
pub use registry::NodeRegistry;
pub use viewer::ChatHistoryViewer;
