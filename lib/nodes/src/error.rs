//! Error types for the nodes crate.

use std::fmt;

/// Errors from looking up or executing a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// No node is registered under the class name.
    UnknownNode { class_name: String },
    /// An input is missing, has the wrong type, or is out of range.
    InvalidInput { message: String },
    /// The node ran but could not produce its outputs.
    ExecutionFailed { message: String },
}

impl NodeError {
    pub(crate) fn invalid_input(port: &str, message: impl fmt::Display) -> Self {
        Self::InvalidInput {
            message: format!("input '{port}': {message}"),
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { class_name } => write!(f, "unknown node type: {class_name}"),
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::ExecutionFailed { message } => write!(f, "execution failed: {message}"),
        }
    }
}

impl std::error::Error for NodeError {}
