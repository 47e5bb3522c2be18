//! Message types for conversations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions; only ever the first message of a history.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
}

impl Role {
    /// Returns the wire name used by chat-format provider APIs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Returns the capitalized label used in transcripts and flat prompts.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns true if this message was sent with the given role.
    #[must_use]
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_creation() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello!");
        assert!(msg.is(Role::User));
        assert!(!msg.is(Role::Assistant));
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::System.label(), "System");
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Assistant.label(), "Assistant");
    }

    #[test]
    fn message_serializes_in_chat_format() {
        let json = serde_json::to_value(Message::assistant("Hi")).expect("serialize");
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "Hi"}));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed: Result<Message, _> =
            serde_json::from_str(r#"{"role": "tool", "content": "x"}"#);
        assert!(parsed.is_err());
    }
}
