//! Backend for the Anthropic Messages API (`POST {base}/messages`).
//!
//! Used by user-supplied providers of kind `anthropic`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::base::{Backend, BackendError, BackendRequest};
use crate::http_provider::CONNECT_TIMEOUT;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Turn<'a>>,
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AnthropicBackend {
    pub fn new(api_base: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn check_config(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is not set".into());
        }
        if self.api_base.trim().is_empty() {
            return Err("API base URL is not set".into());
        }
        Ok(())
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Turn {
                role: "user",
                content: &request.message,
            }],
        };

        let url = self.messages_url();
        debug!(url = %url, model = %request.model, "POST messages");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "API error");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&raw)
            .map_err(|e| BackendError::InvalidResponse(format!("malformed message: {e}")))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim();
        if text.is_empty() {
            return Err(BackendError::InvalidResponse(
                "message has no text content".into(),
            ));
        }
        Ok(text.to_string())
    }
}
