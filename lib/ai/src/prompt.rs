//! Flat prompt formatting.
//!
//! Text-generation endpoints take a single prompt string rather than a list
//! of chat messages. The history is rendered as role-labeled lines and ends
//! with an `Assistant:` cue for the model to continue from.

use parley_core::Message;

const ASSISTANT_CUE: &str = "Assistant:";

/// Renders `messages` as a flat role-labeled prompt.
#[must_use]
pub fn format_prompt(messages: &[Message]) -> String {
    let mut lines: Vec<String> = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect();
    lines.push(ASSISTANT_CUE.to_string());

    lines.join("\n").trim_end().to_string()
}
