//! Provider adapters for parley.
//!
//! This crate turns a conversation history into a single completion from a
//! model provider:
//!
//! - **Provider configuration**: per-call settings, validated into a tagged
//!   [`ProviderConfig`]
//! - **Backends**: the [`ChatBackend`] capability and its Ollama and
//!   Hugging-Face implementations
//! - **Prompt formatting** for providers that take a flat text prompt
//! - **Output cleaning** for fence-wrapped model text
//!
//! Every provider failure surfaces as one [`LlmError`].

pub mod backend;
pub mod config;
pub mod error;
pub mod huggingface;
pub mod ollama;
pub mod output;
pub mod prompt;

pub use backend::{BackendFactory, ChatBackend, DEFAULT_REQUEST_TIMEOUT, HttpBackendFactory};
pub use config::{
    DEFAULT_MODEL, DEFAULT_OLLAMA_URL, HuggingFaceConfig, LlmConfig, OllamaConfig, Provider,
    ProviderConfig, SamplingParams,
};
pub use error::{ConfigError, LlmError};
pub use huggingface::HuggingFaceBackend;
pub use ollama::OllamaBackend;
pub use output::clean_output;
pub use prompt::format_prompt;
