//! In-memory chat session store.
//!
//! Sessions are keyed by a caller-chosen string, live for the lifetime of
//! the process and are never evicted. A session is reset, discarding every
//! earlier turn, when:
//!
//! - the caller asks for a refresh,
//! - the key has not been seen before, or
//! - a non-empty system prompt is supplied that differs from the history's
//!   leading system message (or the history has none).
//!
//! Callers that read, modify and save a history should hold the session's
//! [`lock`](SessionStore::lock) for the whole sequence.

use crate::history::History;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

/// A point-in-time copy of one session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub history: History,
    /// When the key was first used.
    pub created_at: DateTime<Utc>,
    /// When the history was last replaced or saved.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct SessionEntry {
    history: History,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new(history: History) -> Self {
        let now = Utc::now();
        Self {
            history,
            created_at: now,
            updated_at: now,
        }
    }

    fn replace(&mut self, history: History) {
        self.history = history;
        self.updated_at = Utc::now();
    }
}

/// Shared mapping from session id to history.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session's history, resetting it first if the reset policy
    /// applies.
    pub async fn get_or_create(
        &self,
        session_id: &str,
        system_prompt: &str,
        refresh: bool,
    ) -> History {
        let mut sessions = self.sessions.write().await;

        let reason = match sessions.get(session_id) {
            _ if refresh => Some("refresh requested"),
            None => Some("new session"),
            Some(entry) if system_prompt_changed(&entry.history, system_prompt) => {
                Some("system prompt changed")
            }
            Some(_) => None,
        };

        match reason {
            Some(reason) => {
                debug!(session_id, reason, "Resetting chat session");
                let history = History::with_system_prompt(system_prompt);
                insert(&mut sessions, session_id, history.clone());
                history
            }
            None => sessions
                .get(session_id)
                .map(|entry| entry.history.clone())
                .unwrap_or_default(),
        }
    }

    /// Replaces the session's history with an empty or system-only one.
    pub async fn reset(&self, session_id: &str, system_prompt: &str) -> History {
        let history = History::with_system_prompt(system_prompt);
        let mut sessions = self.sessions.write().await;
        insert(&mut sessions, session_id, history.clone());
        debug!(session_id, "Reset chat session");
        history
    }

    /// Stores `history` as the session's current history.
    pub async fn save(&self, session_id: &str, history: History) {
        let mut sessions = self.sessions.write().await;
        insert(&mut sessions, session_id, history);
    }

    /// Returns a copy of the session's history without creating it.
    pub async fn get(&self, session_id: &str) -> Option<History> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.history.clone())
    }

    /// Returns a copy of the session with its timestamps.
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| SessionSnapshot {
                history: entry.history.clone(),
                created_at: entry.created_at,
                updated_at: entry.updated_at,
            })
    }

    /// Returns the number of known sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no session has been created yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Waits for exclusive use of one session.
    ///
    /// Different sessions can be locked concurrently.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(session_id.to_string())
                .or_insert_with(Arc::default)
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}

fn system_prompt_changed(history: &History, system_prompt: &str) -> bool {
    !system_prompt.is_empty() && history.system_prompt() != Some(system_prompt)
}

fn insert(sessions: &mut HashMap<String, SessionEntry>, session_id: &str, history: History) {
    match sessions.get_mut(session_id) {
        Some(entry) => entry.replace(history),
        None => {
            sessions.insert(session_id.to_string(), SessionEntry::new(history));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Message;
    use std::time::Duration;

    async fn seeded(store: &SessionStore, id: &str, system_prompt: &str) -> History {
        let mut history = store.get_or_create(id, system_prompt, false).await;
        history.push_user("hi");
        history.push_assistant("hello");
        store.save(id, history.clone()).await;
        history
    }

    #[tokio::test]
    async fn unseen_session_is_created() {
        let store = SessionStore::new();
        assert!(store.get("s1").await.is_none());

        let history = store.get_or_create("s1", "", false).await;
        assert!(history.is_empty());
        assert_eq!(store.get("s1").await, Some(History::new()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unseen_session_starts_with_system_prompt() {
        let store = SessionStore::new();
        let history = store.get_or_create("s1", "Be brief.", false).await;
        assert_eq!(history.messages(), &[Message::system("Be brief.")]);
    }

    #[tokio::test]
    async fn existing_session_is_returned_unchanged() {
        let store = SessionStore::new();
        let saved = seeded(&store, "s1", "Be brief.").await;

        assert_eq!(store.get_or_create("s1", "Be brief.", false).await, saved);
        assert_eq!(store.get_or_create("s1", "", false).await, saved);
    }

    #[tokio::test]
    async fn refresh_discards_turns() {
        let store = SessionStore::new();
        seeded(&store, "s1", "").await;

        let history = store.get_or_create("s1", "", true).await;
        assert!(history.is_empty());
        assert_eq!(store.get("s1").await, Some(History::new()));
    }

    #[tokio::test]
    async fn new_system_prompt_resets_session() {
        let store = SessionStore::new();
        seeded(&store, "s1", "Old rules.").await;

        let history = store.get_or_create("s1", "New rules.", false).await;
        assert_eq!(history.messages(), &[Message::system("New rules.")]);
    }

    #[tokio::test]
    async fn system_prompt_on_promptless_session_resets_it() {
        let store = SessionStore::new();
        seeded(&store, "s1", "").await;

        let history = store.get_or_create("s1", "Now with rules.", false).await;
        assert_eq!(history.messages(), &[Message::system("Now with rules.")]);
    }

    #[tokio::test]
    async fn reset_replaces_history_and_keeps_creation_time() {
        let store = SessionStore::new();
        seeded(&store, "s1", "").await;
        let before = store.snapshot("s1").await.expect("session exists");

        let history = store.reset("s1", "sys").await;
        let after = store.snapshot("s1").await.expect("session exists");

        assert_eq!(history.messages(), &[Message::system("sys")]);
        assert_eq!(after.history, history);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = SessionStore::new();
        seeded(&store, "a", "").await;
        store.reset("b", "").await;

        assert_eq!(store.get("a").await.map(|h| h.len()), Some(2));
        assert_eq!(store.get("b").await.map(|h| h.len()), Some(0));
    }

    #[tokio::test]
    async fn lock_serializes_same_session_only() {
        let store = Arc::new(SessionStore::new());
        let guard = store.lock("s1").await;

        // A different session is not blocked.
        let other = tokio::time::timeout(Duration::from_millis(100), store.lock("s2")).await;
        assert!(other.is_ok());

        // The same session waits until the guard is released.
        let same = tokio::time::timeout(Duration::from_millis(100), store.lock("s1")).await;
        assert!(same.is_err());

        drop(guard);
        let same = tokio::time::timeout(Duration::from_millis(100), store.lock("s1")).await;
        assert!(same.is_ok());
    }
}
