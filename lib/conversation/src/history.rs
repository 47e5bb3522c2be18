//! Conversation history.
//!
//! A [`History`] only grows through user and assistant turns, so its single
//! optional system message always stays at index 0.

use parley_core::{Message, Role};
use serde::Serialize;

/// The ordered messages of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history holding only `system_prompt`, or an empty one if
    /// the prompt is empty.
    #[must_use]
    pub fn with_system_prompt(system_prompt: &str) -> Self {
        if system_prompt.is_empty() {
            return Self::new();
        }
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Returns the messages in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the leading system prompt, if any.
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.is(Role::System))
            .map(|m| m.content.as_str())
    }

    /// Appends a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Appends an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Returns true if the last message is a user turn waiting for a reply.
    #[must_use]
    pub fn awaits_reply(&self) -> bool {
        self.messages.last().is_some_and(|m| m.is(Role::User))
    }

    /// Returns the content of the most recent assistant turn.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is(Role::Assistant))
            .map(|m| m.content.as_str())
    }

    /// Drops the most recent assistant turn and everything after it.
    ///
    /// Returns false, leaving the history untouched, if there is no
    /// assistant turn.
    pub fn rewind_last_reply(&mut self) -> bool {
        match self.messages.iter().rposition(|m| m.is(Role::Assistant)) {
            Some(index) => {
                self.messages.truncate(index);
                true
            }
            None => false,
        }
    }

    /// Renders the human-readable transcript.
    #[must_use]
    pub fn transcript(&self) -> String {
        render_transcript(&self.messages)
    }
}

/// Renders messages as `"{Role}: {content}"` blocks, each followed by a
/// blank line.
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}\n\n", m.role.label(), m.content))
        .collect()
}
