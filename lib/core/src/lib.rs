//! Core domain types and utilities for parley.
//!
//! This crate provides the foundational types shared by the provider
//! adapters, the conversation layer and the host surfaces: chat messages,
//! request identifiers, and the rootcause-backed `Result` alias.

pub mod error;
pub mod id;
pub mod message;

pub use error::Result;
pub use id::{GenerationId, RequestId};
pub use message::{Message, Role};
