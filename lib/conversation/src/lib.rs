//! Conversation service for parley.
//!
//! This crate provides:
//!
//! - **History**: the ordered messages of one conversation and its transcript
//! - **Session Store**: in-memory session lifecycle keyed by session id
//! - **Controller**: one user-facing chat action against a session and a
//!   provider backend

pub mod controller;
pub mod history;
pub mod session;

pub use controller::{
    ChatAction, ChatReply, ChatTurn, ControllerSettings, ConversationController, ERROR_MARKER,
    UnknownActionError,
};
pub use history::{History, render_transcript};
pub use session::{SessionSnapshot, SessionStore};
