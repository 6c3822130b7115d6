//! LLM provider layer for Switchboard.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait that all providers implement
//! - [`base::ManagedProvider`] — shared stats/retry/timeout template around a [`base::Backend`]
//! - [`http_provider::HttpBackend`] — OpenAI-compatible HTTP client (Groq, Hugging Face, custom)
//! - [`anthropic::AnthropicBackend`] — Anthropic Messages API client (custom)
//! - [`catalog`] — static specs for the built-in providers
//! - [`discovery`] — constructor table run at start-up
//! - [`registry::ProviderRegistry`] — ownership, selection and fallback

pub mod anthropic;
pub mod base;
pub mod catalog;
pub mod discovery;
pub mod error;
pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use base::{Backend, BackendError, BackendRequest, ManagedProvider};
pub use catalog::{ProviderSpec, PROVIDERS};
pub use discovery::{default_factories, ProviderFactory};
pub use error::{Attempt, ProviderError, RegistryError};
pub use registry::{Generation, ProviderRegistry, ProviderStatus};
pub use traits::{LlmProvider, PerformanceStats, ProviderInfo};
