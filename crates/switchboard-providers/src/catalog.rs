//! Provider catalog — static specs for the built-in LLM providers.
//!
//! Each `ProviderSpec` describes how to connect to a provider: display names,
//! API base, model list, key validation, and fallback priority.

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one built-in LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"groq"`). Also the registry key.
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Groq"`.
    pub display_name: &'static str,
    /// One-line description shown in status views.
    pub description: &'static str,
    /// Default API base URL (OpenAI-compatible, without `/chat/completions`).
    pub default_api_base: &'static str,
    /// Models offered, in display order. The first is the fallback default.
    pub models: &'static [&'static str],
    /// Model used when the config does not name one.
    pub default_model: &'static str,
    /// Rules the API key must satisfy before the provider counts as available.
    pub key_rule: KeyRule,
    /// Fallback priority; lower is tried first.
    pub priority: u32,
}

/// Superficial API key validation.
#[derive(Clone, Debug)]
pub struct KeyRule {
    /// Required key prefix, if any. E.g. `Some("hf_")`.
    pub prefix: Option<&'static str>,
    /// Minimum key length in characters.
    pub min_len: usize,
}

impl KeyRule {
    /// Check `key`; `Err` carries a human-readable reason.
    pub fn check(&self, key: &str) -> Result<(), String> {
        let key = key.trim();
        if key.is_empty() {
            return Err("API key is not set".to_string());
        }
        if let Some(prefix) = self.prefix {
            if !key.starts_with(prefix) {
                return Err(format!("API key must start with '{prefix}'"));
            }
        }
        if key.chars().count() < self.min_len {
            return Err(format!("API key must be at least {} characters", self.min_len));
        }
        Ok(())
    }
}

impl ProviderSpec {
    /// Owned copy of the model list.
    pub fn model_list(&self) -> Vec<String> {
        self.models.iter().map(|m| m.to_string()).collect()
    }
}

// ─────────────────────────────────────────────
// Built-in providers (in priority order)
// ─────────────────────────────────────────────

/// Complete list of built-in provider specifications, in priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. Groq — fastest, free tier
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        description: "Ultra-fast inference for Llama 3 and Gemma models",
        default_api_base: "https://api.groq.com/openai/v1",
        models: &["llama3-70b-8192", "llama3-8b-8192", "gemma2-9b-it"],
        default_model: "llama3-70b-8192",
        key_rule: KeyRule {
            prefix: None,
            min_len: 1,
        },
        priority: 0,
    },
    // 2. Hugging Face Inference Providers router
    ProviderSpec {
        name: "huggingface",
        display_name: "Hugging Face",
        description: "Unified access to open models through the Inference Providers router",
        default_api_base: "https://router.huggingface.co/v1",
        models: &[
            "google/gemma-2-2b-it",
            "deepseek-ai/DeepSeek-R1-Distill-Qwen-1.5B",
            "microsoft/phi-4",
            "Qwen/Qwen2.5-Coder-32B-Instruct",
            "deepseek-ai/DeepSeek-R1",
        ],
        default_model: "google/gemma-2-2b-it",
        key_rule: KeyRule {
            prefix: Some("hf_"),
            min_len: 31,
        },
        priority: 10,
    },
];

/// Priority assigned to user-supplied providers.
pub const CUSTOM_PRIORITY: u32 = 100;

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
