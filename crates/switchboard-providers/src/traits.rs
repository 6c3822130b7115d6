//! LLM Provider trait — the capability contract every backend exposes to the
//! registry.
//!
//! Concrete backends rarely implement this directly: wrap a
//! [`Backend`](crate::base::Backend) in a [`ManagedProvider`](crate::base::ManagedProvider)
//! to inherit the shared statistics and error template.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use switchboard_core::config::GenerationOptions;

use crate::error::ProviderError;

/// Snapshot of a provider's accumulated call statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub request_count: u64,
    pub error_count: u64,
    /// `error_count / request_count`, or 0 when no request was made.
    pub error_rate: f64,
    /// `1 - error_rate` while requests exist, 0 otherwise.
    pub success_rate: f64,
    /// Mean latency of successful calls, in milliseconds.
    pub average_latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request_at: Option<DateTime<Utc>>,
}

/// Static descriptive information about a provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub current_model: String,
    pub model_count: usize,
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable unique identifier (e.g. `"groq"`). Never empty.
    fn name(&self) -> &str;

    /// Whether the required configuration is present and superficially valid.
    ///
    /// Re-evaluated on every call; says nothing about whether the remote call
    /// will succeed.
    fn is_available(&self) -> bool;

    /// Generate text for `message`.
    ///
    /// Options left as `None` fall back to the provider's `GlobalConfig`.
    async fn generate_response(
        &self,
        message: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Models this provider can serve, in display order.
    fn available_models(&self) -> Vec<String>;

    /// Select `model` if it is one of [`available_models`](Self::available_models).
    ///
    /// Returns `false` and changes nothing otherwise.
    fn switch_model(&self, model: &str) -> bool;

    fn current_model(&self) -> String;

    fn performance_stats(&self) -> PerformanceStats;

    /// Human-facing description for status views.
    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            display_name: self.name().to_string(),
            description: String::new(),
            current_model: self.current_model(),
            model_count: self.available_models().len(),
        }
    }
}
