//! Shared provider behaviour — statistics bookkeeping, error classification,
//! and the "check → resolve → call → record" execution template.
//!
//! A concrete provider is a [`Backend`]: it knows how to check its own
//! configuration and how to turn one [`BackendRequest`] into text. Wrapping it
//! in [`ManagedProvider`] yields a full [`LlmProvider`] whose statistics and
//! error semantics are identical to every other provider's.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, warn};

use switchboard_core::config::{GenerationOptions, GenerationParams, GlobalConfig};
use switchboard_core::utils::truncate_string;

use crate::error::ProviderError;
use crate::traits::{LlmProvider, PerformanceStats, ProviderInfo};

/// Upper bound for a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

// ─────────────────────────────────────────────
// Backend seam
// ─────────────────────────────────────────────

/// Fully resolved input for one backend call.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendRequest {
    pub model: String,
    pub message: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Raw failure reported by a backend, before classification.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, DNS, TLS, or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload could not be turned into text.
    #[error("{0}")]
    InvalidResponse(String),

    /// The backend discovered at call time that it cannot be used.
    #[error("{0}")]
    NotConfigured(String),

    /// The backend's own client gave up waiting.
    #[error("backend timed out")]
    Timeout,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::InvalidResponse(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// The backend-specific half of a provider.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Validate the configuration; `Err` carries the reason it is unusable.
    fn check_config(&self) -> Result<(), String>;

    /// Perform one call against the remote API.
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError>;
}

// ─────────────────────────────────────────────
// Statistics
// ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct ProviderStats {
    request_count: u64,
    error_count: u64,
    total_latency: Duration,
    last_error: Option<String>,
    last_request_at: Option<DateTime<Utc>>,
}

impl ProviderStats {
    fn snapshot(&self) -> PerformanceStats {
        let successes = self.request_count - self.error_count;
        let (error_rate, success_rate) = if self.request_count == 0 {
            (0.0, 0.0)
        } else {
            let rate = self.error_count as f64 / self.request_count as f64;
            (rate, 1.0 - rate)
        };
        let average_latency_ms = if successes == 0 {
            0.0
        } else {
            self.total_latency.as_secs_f64() * 1000.0 / successes as f64
        };

        PerformanceStats {
            request_count: self.request_count,
            error_count: self.error_count,
            error_rate,
            success_rate,
            average_latency_ms,
            last_error: self.last_error.clone(),
            last_request_at: self.last_request_at,
        }
    }
}

/// Records the outcome of one call; a call dropped before completion counts
/// as a failure.
struct InFlight<'a> {
    stats: &'a Mutex<ProviderStats>,
    provider: &'a str,
    started: Instant,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(stats: &'a Mutex<ProviderStats>, provider: &'a str) -> Self {
        lock(stats).last_request_at = Some(Utc::now());
        Self {
            stats,
            provider,
            started: Instant::now(),
            settled: false,
        }
    }

    fn succeed(mut self) {
        let elapsed = self.started.elapsed();
        let mut stats = lock(self.stats);
        stats.request_count += 1;
        stats.total_latency += elapsed;
        self.settled = true;
    }

    fn fail(mut self, err: &ProviderError) {
        self.record_failure(err.to_string());
        self.settled = true;
    }

    fn record_failure(&self, message: String) {
        let mut stats = lock(self.stats);
        stats.request_count += 1;
        stats.error_count += 1;
        stats.last_error = Some(message);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(provider = self.provider, "call cancelled before completion");
            self.record_failure(format!("call to '{}' was cancelled", self.provider));
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

// ─────────────────────────────────────────────
// ManagedProvider
// ─────────────────────────────────────────────

/// A [`Backend`] wrapped with the shared statistics and error template.
pub struct ManagedProvider<B> {
    name: String,
    display_name: String,
    description: String,
    models: Vec<String>,
    current_model: Mutex<String>,
    stats: Mutex<ProviderStats>,
    defaults: GlobalConfig,
    backend: B,
}

impl<B> std::fmt::Debug for ManagedProvider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedProvider")
            .field("name", &self.name)
            .field("current_model", &*lock(&self.current_model))
            .field("models", &self.models.len())
            .finish()
    }
}

impl<B: Backend> ManagedProvider<B> {
    /// Wrap `backend` under `name`, starting on the first of `models`.
    ///
    /// Fails when the name is blank or the model list is empty.
    pub fn new(
        name: impl Into<String>,
        models: Vec<String>,
        backend: B,
        defaults: GlobalConfig,
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProviderError::InvalidRequest {
                provider: name,
                message: "provider name must not be empty".into(),
            });
        }
        let Some(first) = models.first().cloned() else {
            return Err(ProviderError::Unavailable {
                provider: name,
                reason: "no models configured".into(),
            });
        };

        Ok(Self {
            display_name: name.clone(),
            description: String::new(),
            name,
            models,
            current_model: Mutex::new(first),
            stats: Mutex::new(ProviderStats::default()),
            defaults,
            backend,
        })
    }

    /// Start on `model` instead of the first entry, if it is known.
    pub fn with_default_model(self, model: Option<&str>) -> Self {
        if let Some(model) = model {
            if !self.switch_model(model) {
                warn!(
                    provider = %self.name,
                    model,
                    fallback = %self.current_model(),
                    "configured default model is not offered, keeping fallback"
                );
            }
        }
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Availability check, parameter resolution, then the backend call with
    /// retries. Stats are recorded by the caller.
    async fn execute(&self, message: &str, options: &GenerationOptions) -> Result<String, ProviderError> {
        if let Err(reason) = self.backend.check_config() {
            return Err(ProviderError::Unavailable {
                provider: self.name.clone(),
                reason,
            });
        }
        if message.trim().is_empty() {
            return Err(ProviderError::InvalidRequest {
                provider: self.name.clone(),
                message: "message must not be empty".into(),
            });
        }

        let params = self.defaults.resolve(options);
        let request = BackendRequest {
            model: self.current_model(),
            message: message.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(
            provider = %self.name,
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "calling backend"
        );

        self.call_with_retry(&request, &params).await
    }

    async fn call_with_retry(
        &self,
        request: &BackendRequest,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let max_attempts = params.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match tokio::time::timeout(params.timeout, self.backend.complete(request)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => self.classify(e, params.timeout),
                Err(_) => ProviderError::Timeout {
                    provider: self.name.clone(),
                    after: params.timeout,
                },
            };

            if !err.is_retryable() || attempt >= max_attempts {
                return Err(err);
            }

            let delay = backoff_delay(params.retry_backoff, attempt);
            warn!(
                provider = %self.name,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn classify(&self, err: BackendError, timeout: Duration) -> ProviderError {
        let provider = self.name.clone();
        match err {
            BackendError::Transport(message) => ProviderError::RequestFailed {
                provider,
                message,
                retryable: true,
            },
            BackendError::Status { status, body } => ProviderError::RequestFailed {
                provider,
                message: format!("HTTP {}: {}", status, truncate_string(&body, 200)),
                retryable: status == 408 || status == 429 || status >= 500,
            },
            BackendError::InvalidResponse(message) => {
                ProviderError::InvalidResponse { provider, message }
            }
            BackendError::NotConfigured(reason) => ProviderError::Unavailable { provider, reason },
            BackendError::Timeout => ProviderError::Timeout {
                provider,
                after: timeout,
            },
        }
    }
}

#[async_trait]
impl<B: Backend> LlmProvider for ManagedProvider<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.backend.check_config().is_ok()
    }

    async fn generate_response(
        &self,
        message: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let call = InFlight::start(&self.stats, &self.name);
        match self.execute(message, options).await {
            Ok(text) => {
                call.succeed();
                Ok(text)
            }
            Err(e) => {
                error!(provider = %self.name, kind = e.kind(), error = %e, "generation failed");
                call.fail(&e);
                Err(e)
            }
        }
    }

    fn available_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn switch_model(&self, model: &str) -> bool {
        if !self.models.iter().any(|m| m == model) {
            debug!(provider = %self.name, model, "model not offered");
            return false;
        }
        *lock(&self.current_model) = model.to_string();
        debug!(provider = %self.name, model, "switched model");
        true
    }

    fn current_model(&self) -> String {
        lock(&self.current_model).clone()
    }

    fn performance_stats(&self) -> PerformanceStats {
        lock(&self.stats).snapshot()
    }

    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            current_model: self.current_model(),
            model_count: self.models.len(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
