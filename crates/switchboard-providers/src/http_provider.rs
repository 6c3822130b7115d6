//! HTTP backend for OpenAI-compatible `/chat/completions` APIs.
//!
//! Covers Groq, the Hugging Face router, and any user-supplied
//! `openai_compatible` provider.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::base::{Backend, BackendError, BackendRequest};
use crate::catalog::KeyRule;

/// Connect timeout for the shared client; the call deadline is enforced by
/// the provider template.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─────────────────────────────────────────────
// HttpBackend
// ─────────────────────────────────────────────

/// A backend that talks to any OpenAI-compatible HTTP API.
pub struct HttpBackend {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    /// Key validation applied by `check_config`.
    key_rule: KeyRule,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("api_base", &self.api_base)
            .field("has_key", &!self.api_key.is_empty())
            .finish()
    }
}

impl HttpBackend {
    /// Create a backend for `api_base` authenticated with `api_key`.
    pub fn new(api_base: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(HttpBackend {
            client,
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            extra_headers: HeaderMap::new(),
            key_rule: KeyRule {
                prefix: None,
                min_len: 1,
            },
        })
    }

    /// Require the API key to satisfy `rule`.
    pub fn with_key_rule(mut self, rule: KeyRule) -> Self {
        self.key_rule = rule;
        self
    }

    /// Send these headers with every request; invalid entries are skipped.
    pub fn with_extra_headers(mut self, headers: Option<&HashMap<String, String>>) -> Self {
        for (key, value) in headers.into_iter().flatten() {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                self.extra_headers.insert(name, val);
            } else {
                warn!("Invalid header: {}={}", key, value);
            }
        }
        self
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn check_config(&self) -> Result<(), String> {
        if self.api_base.trim().is_empty() {
            return Err("API base URL is not set".to_string());
        }
        self.key_rule.check(&self.api_key)
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.message,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let url = self.completions_url();
        debug!(url = %url, model = %request.model, "POST chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %error_text, "API error");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| BackendError::InvalidResponse(format!("malformed completion: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("response has no choices".into()))?
            .message
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(BackendError::InvalidResponse("completion is empty".into()));
        }
        Ok(content)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
