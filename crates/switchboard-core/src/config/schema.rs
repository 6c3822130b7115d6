//! Configuration schema — typed settings for the generation defaults, every
//! provider backend, and logging.
//!
//! Hierarchy: `Config` → `GlobalConfig`, `ProvidersConfig`, `LoggingConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.switchboard/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub generation: GlobalConfig,
    pub providers: ProvidersConfig,
    pub logging: LoggingConfig,
}

// ─────────────────────────────────────────────
// Generation defaults
// ─────────────────────────────────────────────

/// Process-wide generation, timeout, and retry defaults shared by all providers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Deadline for one backend call, in seconds.
    pub api_timeout_seconds: u64,
    /// Whether transient failures are retried inside a single provider call.
    pub auto_retry: bool,
    /// Retries after the first attempt when `auto_retry` is on.
    pub max_retries: u32,
    /// Base delay between retries; doubled on every attempt.
    pub retry_backoff_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            api_timeout_seconds: 30,
            auto_retry: true,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Per-call overrides of the generation defaults. `None` keeps the default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Caller deadline for the backend call; overrides `apiTimeoutSeconds`.
    #[serde(skip)]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_retry: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable in-provider retries for this call.
    pub fn without_retry(mut self) -> Self {
        self.auto_retry = Some(false);
        self
    }
}

/// Effective parameters for one call: defaults merged with overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub auto_retry: bool,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl GenerationParams {
    /// Total attempts a provider may make for one call.
    pub fn max_attempts(&self) -> u32 {
        if self.auto_retry {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

impl GlobalConfig {
    /// Merge the defaults with per-call overrides.
    ///
    /// Temperature is clamped to 0.0 – 1.0, `max_tokens` and the timeout are
    /// kept positive.
    pub fn resolve(&self, options: &GenerationOptions) -> GenerationParams {
        let requested = options.temperature.unwrap_or(self.temperature);
        let temperature = if requested.is_nan() {
            warn!(requested, "invalid temperature, using default");
            self.temperature.clamp(0.0, 1.0)
        } else {
            requested.clamp(0.0, 1.0)
        };

        let timeout = options
            .timeout
            .unwrap_or_else(|| Duration::from_secs(self.api_timeout_seconds.max(1)));

        GenerationParams {
            temperature,
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens).max(1),
            timeout: if timeout.is_zero() {
                Duration::from_millis(1)
            } else {
                timeout
            },
            auto_retry: options.auto_retry.unwrap_or(self.auto_retry),
            max_retries: options.max_retries.unwrap_or(self.max_retries),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Flat key/value view of the effective settings, for status output.
    pub fn debug_info(&self, logging: &LoggingConfig) -> Vec<(&'static str, String)> {
        vec![
            ("temperature", self.temperature.to_string()),
            ("max_tokens", self.max_tokens.to_string()),
            ("api_timeout", format!("{}s", self.api_timeout_seconds)),
            ("auto_retry", self.auto_retry.to_string()),
            ("max_retries", self.max_retries.to_string()),
            ("log_level", logging.level.clone()),
            ("debug_mode", logging.debug_mode.to_string()),
        ]
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a built-in provider (API key, model, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Model to start with (must be one of the provider's models).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a non-blank API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Wire dialect of a user-supplied provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomProviderKind {
    /// `POST {apiBase}/chat/completions`, Bearer auth.
    #[default]
    OpenaiCompatible,
    /// `POST {apiBase}/messages`, `x-api-key` auth.
    Anthropic,
}

/// A provider added by the user rather than shipped with Switchboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomProviderConfig {
    /// Unique provider name.
    pub name: String,
    pub kind: CustomProviderKind,
    pub api_key: String,
    pub api_base: String,
    /// Model used by default.
    pub model: String,
    /// Extra models the user may switch to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

impl CustomProviderConfig {
    /// A custom provider needs a key, a base URL, and a model.
    pub fn is_configured(&self) -> bool {
        [&self.api_key, &self.api_base, &self.model]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Ordered, de-duplicated model list with `model` first.
    pub fn model_list(&self) -> Vec<String> {
        let mut models = Vec::with_capacity(self.models.len() + 1);
        for m in std::iter::once(&self.model).chain(self.models.iter()) {
            if !m.is_empty() && !models.contains(m) {
                models.push(m.clone());
            }
        }
        models
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub huggingface: ProviderConfig,
    #[serde(default)]
    pub custom: Vec<CustomProviderConfig>,
}

impl ProvidersConfig {
    /// Get a built-in provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "groq" => Some(&self.groq),
            "huggingface" => Some(&self.huggingface),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────

/// Logging configuration consumed by the CLI's subscriber.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Default level directive (`"info"`, `"warn"`, ...).
    pub level: String,
    /// Force debug output for Switchboard crates.
    pub debug_mode: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            debug_mode: false,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.generation.max_tokens, 1000);
        assert_eq!(config.generation.api_timeout_seconds, 30);
        assert!(config.generation.auto_retry);
        assert_eq!(config.generation.max_retries, 3);
        assert_eq!(config.logging.level, "INFO");
        assert!(config.providers.custom.is_empty());
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "generation": {
                "temperature": 0.2,
                "maxTokens": 256,
                "apiTimeoutSeconds": 10,
                "autoRetry": false
            },
            "providers": {
                "groq": { "apiKey": "gsk_123", "defaultModel": "gemma2-9b-it" }
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.generation.temperature, 0.2);
        assert_eq!(config.generation.max_tokens, 256);
        assert_eq!(config.generation.api_timeout_seconds, 10);
        assert!(!config.generation.auto_retry);
        // Defaults preserved for missing fields
        assert_eq!(config.generation.max_retries, 3);
        assert_eq!(
            config.providers.groq.default_model.as_deref(),
            Some("gemma2-9b-it")
        );
        assert!(!config.providers.huggingface.is_configured());
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["generation"].get("maxTokens").is_some());
        assert!(json["generation"].get("apiTimeoutSeconds").is_some());
        assert!(json["generation"].get("max_tokens").is_none());
        assert!(json["logging"].get("debugMode").is_some());
    }

    #[test]
    fn test_resolve_uses_defaults() {
        let global = GlobalConfig::default();
        let params = global.resolve(&GenerationOptions::default());
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.max_tokens, 1000);
        assert_eq!(params.timeout, Duration::from_secs(30));
        assert_eq!(params.max_attempts(), 4);
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let global = GlobalConfig::default();
        let options = GenerationOptions::default()
            .with_temperature(0.1)
            .with_max_tokens(50)
            .with_timeout(Duration::from_millis(250))
            .without_retry();
        let params = global.resolve(&options);
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.max_tokens, 50);
        assert_eq!(params.timeout, Duration::from_millis(250));
        assert_eq!(params.max_attempts(), 1);
    }

    #[test]
    fn test_resolve_clamps_out_of_range_values() {
        let global = GlobalConfig::default();
        let params = global.resolve(
            &GenerationOptions::default()
                .with_temperature(1.8)
                .with_max_tokens(0),
        );
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.max_tokens, 1);

        let params = global.resolve(&GenerationOptions::default().with_temperature(f64::NAN));
        assert_eq!(params.temperature, 0.7);
    }

    #[test]
    fn test_provider_config_is_configured() {
        assert!(!ProviderConfig::default().is_configured());

        let blank = ProviderConfig {
            api_key: "   ".to_string(),
            ..Default::default()
        };
        assert!(!blank.is_configured());

        let with_key = ProviderConfig {
            api_key: "gsk_123".to_string(),
            ..Default::default()
        };
        assert!(with_key.is_configured());
    }

    #[test]
    fn test_custom_provider_from_json() {
        let json = serde_json::json!({
            "providers": {
                "custom": [{
                    "name": "claude",
                    "kind": "anthropic",
                    "apiKey": "sk-ant",
                    "apiBase": "https://api.anthropic.com/v1",
                    "model": "claude-3-haiku",
                    "models": ["claude-3-haiku", "claude-3-opus"]
                }]
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        let custom = &config.providers.custom[0];
        assert_eq!(custom.kind, CustomProviderKind::Anthropic);
        assert!(custom.is_configured());
        assert_eq!(custom.model_list(), vec!["claude-3-haiku", "claude-3-opus"]);
    }

    #[test]
    fn test_custom_provider_requires_all_fields() {
        let custom = CustomProviderConfig {
            name: "local".into(),
            api_key: "key".into(),
            model: "llama".into(),
            ..Default::default()
        };
        assert!(!custom.is_configured());
        assert_eq!(custom.kind, CustomProviderKind::OpenaiCompatible);
    }

    #[test]
    fn test_providers_get_by_name() {
        let mut providers = ProvidersConfig::default();
        providers.groq.api_key = "gsk_123".to_string();

        assert!(providers.get_by_name("groq").unwrap().is_configured());
        assert!(!providers.get_by_name("huggingface").unwrap().is_configured());
        assert!(providers.get_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.generation, GlobalConfig::default());
        assert!(!config.logging.debug_mode);
    }

    #[test]
    fn test_debug_info_lists_settings() {
        let info = GlobalConfig::default().debug_info(&LoggingConfig::default());
        assert!(info.contains(&("api_timeout", "30s".to_string())));
        assert!(info.contains(&("log_level", "INFO".to_string())));
    }
}
