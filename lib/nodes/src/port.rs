//! Port system for host nodes.
//!
//! Ports are the named inputs and outputs a node declares to the host. An
//! input port's [`PortKind`] carries the widget hints the host renders
//! (defaults, ranges, choices) and is also used to validate incoming values
//! before a node runs.

use crate::error::NodeError;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Value type of a port, with its widget hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortKind {
    String {
        multiline: bool,
        default: String,
    },
    Boolean {
        default: bool,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Int {
        default: i64,
        min: i64,
        max: i64,
        step: i64,
    },
    /// One of a fixed list of strings.
    Choice {
        options: Vec<String>,
        default: String,
    },
    /// A host-defined type passed through as opaque JSON (e.g. `LLM_CONFIG`).
    Custom {
        type_name: String,
    },
}

impl PortKind {
    /// Single-line text with a default.
    #[must_use]
    pub fn text(default: impl Into<String>) -> Self {
        Self::String {
            multiline: false,
            default: default.into(),
        }
    }

    /// Multi-line text defaulting to empty.
    #[must_use]
    pub fn multiline() -> Self {
        Self::String {
            multiline: true,
            default: String::new(),
        }
    }

    /// A choice between `options`, defaulting to `default`.
    #[must_use]
    pub fn choice<'a>(options: impl IntoIterator<Item = &'a str>, default: &str) -> Self {
        Self::Choice {
            options: options.into_iter().map(str::to_string).collect(),
            default: default.to_string(),
        }
    }

    /// A host-defined type.
    #[must_use]
    pub fn custom(type_name: impl Into<String>) -> Self {
        Self::Custom {
            type_name: type_name.into(),
        }
    }

    /// Returns the host type name of values on this port.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::String { .. } | Self::Choice { .. } => "STRING",
            Self::Boolean { .. } => "BOOLEAN",
            Self::Float { .. } => "FLOAT",
            Self::Int { .. } => "INT",
            Self::Custom { type_name } => type_name,
        }
    }

    /// Returns the value used when the input is absent.
    ///
    /// Custom ports have no default.
    #[must_use]
    pub fn default_value(&self) -> Option<JsonValue> {
        match self {
            Self::String { default, .. } | Self::Choice { default, .. } => {
                Some(JsonValue::from(default.as_str()))
            }
            Self::Boolean { default } => Some(JsonValue::from(*default)),
            Self::Float { default, .. } => Some(JsonValue::from(*default)),
            Self::Int { default, .. } => Some(JsonValue::from(*default)),
            Self::Custom { .. } => None,
        }
    }

    /// Checks that `value` is acceptable on the port named `port`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidInput`] on a type mismatch, a number out
    /// of range, or a choice that is not offered.
    pub fn check(&self, port: &str, value: &JsonValue) -> Result<(), NodeError> {
        let mismatch = || {
            NodeError::invalid_input(port, format!("expected {}, got {value}", self.type_name()))
        };

        match self {
            Self::String { .. } => value.is_string().then_some(()).ok_or_else(mismatch),
            Self::Boolean { .. } => value.is_boolean().then_some(()).ok_or_else(mismatch),
            Self::Float { min, max, .. } => {
                let number = value.as_f64().filter(|n| n.is_finite()).ok_or_else(mismatch)?;
                if number < *min || number > *max {
                    return Err(NodeError::invalid_input(
                        port,
                        format!("{number} is outside [{min}, {max}]"),
                    ));
                }
                Ok(())
            }
            Self::Int { min, max, .. } => {
                let number = value.as_i64().ok_or_else(mismatch)?;
                if number < *min || number > *max {
                    return Err(NodeError::invalid_input(
                        port,
                        format!("{number} is outside [{min}, {max}]"),
                    ));
                }
                Ok(())
            }
            Self::Choice { options, .. } => {
                let choice = value.as_str().ok_or_else(mismatch)?;
                if options.iter().any(|o| o == choice) {
                    Ok(())
                } else {
                    Err(NodeError::invalid_input(
                        port,
                        format!("'{choice}' is not one of {}", options.join(", ")),
                    ))
                }
            }
            Self::Custom { .. } => Ok(()),
        }
    }
}

/// An input port on a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputPort {
    /// The name of this port.
    pub name: String,
    pub kind: PortKind,
    /// Whether the host must wire or fill this input.
    pub required: bool,
}

impl InputPort {
    /// Creates a new required input port.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Creates a new optional input port.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// An output port on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPort {
    /// The name of this port.
    pub name: String,
    /// The host type name of the produced value.
    pub type_name: String,
}

impl OutputPort {
    /// Creates a new output port.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit_float() -> PortKind {
        PortKind::Float {
            default: 0.5,
            min: 0.0,
            max: 1.0,
            step: 0.01,
        }
    }

    #[test]
    fn defaults_follow_kind() {
        assert_eq!(PortKind::text("llama3").default_value(), Some(json!("llama3")));
        assert_eq!(PortKind::multiline().default_value(), Some(json!("")));
        assert_eq!(
            PortKind::Boolean { default: true }.default_value(),
            Some(json!(true))
        );
        assert_eq!(unit_float().default_value(), Some(json!(0.5)));
        assert_eq!(
            PortKind::choice(["a", "b"], "b").default_value(),
            Some(json!("b"))
        );
        assert_eq!(PortKind::custom("LLM_CONFIG").default_value(), None);
    }

    #[test]
    fn float_range_is_inclusive() {
        let kind = unit_float();
        assert!(kind.check("t", &json!(0.0)).is_ok());
        assert!(kind.check("t", &json!(1)).is_ok());
        assert!(kind.check("t", &json!(1.01)).is_err());
        assert!(kind.check("t", &json!("0.5")).is_err());
    }

    #[test]
    fn int_rejects_fractions_and_out_of_range() {
        let kind = PortKind::Int {
            default: 256,
            min: 1,
            max: 8192,
            step: 1,
        };
        assert!(kind.check("n", &json!(256)).is_ok());
        assert!(kind.check("n", &json!(2.5)).is_err());
        assert!(kind.check("n", &json!(0)).is_err());
        assert!(kind.check("n", &json!(8193)).is_err());
    }

    #[test]
    fn choice_must_be_offered() {
        let kind = PortKind::choice(["ollama", "huggingface"], "ollama");
        assert!(kind.check("provider", &json!("huggingface")).is_ok());

        let err = kind.check("provider", &json!("openai")).unwrap_err();
        assert!(err.to_string().contains("provider"));
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn string_and_boolean_types_are_checked() {
        assert!(PortKind::multiline().check("m", &json!("hi")).is_ok());
        assert!(PortKind::multiline().check("m", &json!(1)).is_err());
        assert!(
            PortKind::Boolean { default: false }
                .check("b", &json!("true"))
                .is_err()
        );
    }

    #[test]
    fn type_names_match_host_conventions() {
        assert_eq!(PortKind::choice(["x"], "x").type_name(), "STRING");
        assert_eq!(unit_float().type_name(), "FLOAT");
        assert_eq!(PortKind::custom("LLM_CONFIG").type_name(), "LLM_CONFIG");
    }

    #[test]
    fn input_port_required_and_optional() {
        let port = InputPort::required("user_message", PortKind::multiline());
        assert!(port.required);
        let port = InputPort::optional("llm_config", PortKind::custom("LLM_CONFIG"));
        assert!(!port.required);
        assert_eq!(port.name, "llm_config");
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let json = serde_json::to_value(PortKind::text("default")).expect("serialize");
        assert_eq!(
            json,
            json!({"type": "string", "multiline": false, "default": "default"})
        );
    }
}
