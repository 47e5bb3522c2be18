//! Conversation controller.
//!
//! Runs one user-facing chat action against a session. `send` and
//! `regenerate` may call the provider once; `clear` and
//! `deliver_to_optimizer` never do. Provider failures are reported to the
//! caller as a marker string and never reach the history.

use crate::history::History;
use crate::session::SessionStore;
use parley_ai::{BackendFactory, LlmError, ProviderConfig, clean_output};
use parley_core::RequestId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Instrument, debug, info, instrument, warn};

/// Prefix of the response text returned when generation fails.
pub const ERROR_MARKER: &str = "[chat error]";

/// What the caller wants done with the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    /// Append the user message and generate a reply.
    #[default]
    Send,
    /// Drop the last reply and generate a new one.
    Regenerate,
    /// Start the conversation over.
    Clear,
    /// Hand the last reply to a downstream consumer without changing anything.
    DeliverToOptimizer,
}

impl ChatAction {
    /// Every action, in the order they are offered to users.
    pub const ALL: [Self; 4] = [
        Self::Send,
        Self::Regenerate,
        Self::Clear,
        Self::DeliverToOptimizer,
    ];

    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Regenerate => "regenerate",
            Self::Clear => "clear",
            Self::DeliverToOptimizer => "deliver_to_optimizer",
        }
    }
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionError(pub String);

impl fmt::Display for UnknownActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chat action '{}'", self.0)
    }
}

impl std::error::Error for UnknownActionError {}

impl FromStr for ChatAction {
    type Err = UnknownActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownActionError(s.to_string()))
    }
}

/// One chat call.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub action: ChatAction,
    pub session_id: String,
    pub user_message: String,
    /// Empty means "no system prompt".
    pub system_prompt: String,
    pub refresh_session: bool,
    pub provider: ProviderConfig,
}

/// Result of one chat call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub assistant_response: String,
    pub readable_history: String,
}

impl ChatReply {
    fn new(assistant_response: impl Into<String>, history: &History) -> Self {
        Self {
            assistant_response: assistant_response.into(),
            readable_history: history.transcript(),
        }
    }
}

/// Behavior switches for the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Strip code fences and whitespace from every successful generation.
    pub clean_responses: bool,
}

/// Applies chat actions to sessions.
#[derive(Clone)]
pub struct ConversationController {
    store: Arc<SessionStore>,
    backends: Arc<dyn BackendFactory>,
    settings: ControllerSettings,
}

impl fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationController")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ConversationController {
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        backends: Arc<dyn BackendFactory>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            store,
            backends,
            settings,
        }
    }

    /// Returns the session store this controller works on.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Performs one chat action.
    ///
    /// Calls on the same session are serialized, and a started call runs to
    /// completion even if the returned future is dropped. `deliver_to_optimizer`
    /// only reads a snapshot and takes no lock. Provider failures are
    /// returned as `"[chat error] {error}"` in `assistant_response`; the
    /// user turn appended by `send` is kept but no assistant turn is added.
    #[instrument(
        skip(self, turn),
        fields(
            request_id = %RequestId::new(),
            session_id = %turn.session_id,
            action = %turn.action,
        )
    )]
    pub async fn act(&self, turn: ChatTurn) -> ChatReply {
        if turn.action == ChatAction::DeliverToOptimizer {
            return self.deliver(&turn.session_id).await;
        }

        // Detached so the turn is stored even if the caller stops waiting.
        let controller = self.clone();
        let task = tokio::spawn(async move { controller.mutate(turn).await }.in_current_span());
        match task.await {
            Ok(reply) => reply,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => ChatReply {
                assistant_response: format!("{ERROR_MARKER} {e}"),
                readable_history: String::new(),
            },
        }
    }

    async fn deliver(&self, session_id: &str) -> ChatReply {
        let history = self.store.get(session_id).await.unwrap_or_default();
        let reply = history.last_reply().unwrap_or_default().to_string();
        ChatReply::new(reply, &history)
    }

    /// Runs a session-changing action under the session lock.
    async fn mutate(&self, turn: ChatTurn) -> ChatReply {
        let _guard = self.store.lock(&turn.session_id).await;

        let mut history = match turn.action {
            ChatAction::Clear => {
                self.store
                    .reset(&turn.session_id, &turn.system_prompt)
                    .await;
                return ChatReply::default();
            }
            ChatAction::DeliverToOptimizer => return self.deliver(&turn.session_id).await,
            ChatAction::Send => {
                let mut history = self
                    .store
                    .get_or_create(&turn.session_id, &turn.system_prompt, turn.refresh_session)
                    .await;
                if !turn.user_message.trim().is_empty() {
                    history.push_user(turn.user_message.as_str());
                }
                history
            }
            ChatAction::Regenerate => {
                let mut history = self
                    .store
                    .get_or_create(&turn.session_id, &turn.system_prompt, turn.refresh_session)
                    .await;
                if !history.rewind_last_reply() {
                    debug!("No reply to regenerate");
                }
                history
            }
        };

        let mut response = String::new();
        if history.awaits_reply() {
            match self.generate(&turn.provider, &history).await {
                Ok(text) => {
                    history.push_assistant(text.as_str());
                    response = text;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        provider = %turn.provider.provider(),
                        model = %turn.provider.model(),
                        "Chat generation failed"
                    );
                    response = format!("{ERROR_MARKER} {e}");
                }
            }
        }

        self.store.save(&turn.session_id, history.clone()).await;
        ChatReply::new(response, &history)
    }

    async fn generate(
        &self,
        provider: &ProviderConfig,
        history: &History,
    ) -> Result<String, LlmError> {
        let backend = self.backends.backend(provider)?;
        let text = backend
            .generate(history.messages(), provider.sampling())
            .await?;
        info!(
            provider = %backend.provider(),
            model = %backend.model(),
            chars = text.len(),
            "Chat reply generated"
        );

        Ok(if self.settings.clean_responses {
            clean_output(&text)
        } else {
            text
        })
    }
}
