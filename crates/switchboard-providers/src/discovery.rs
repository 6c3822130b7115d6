//! Provider discovery — the static table of constructors the registry runs
//! at start-up.
//!
//! Built-in providers come from [`PROVIDERS`](crate::catalog::PROVIDERS);
//! user-supplied ones from `providers.custom` in the config. Every entry is a
//! [`ProviderFactory`] so construction order and priority stay explicit.

use std::sync::Arc;

use switchboard_core::config::{Config, CustomProviderConfig, CustomProviderKind, GlobalConfig};

use crate::anthropic::AnthropicBackend;
use crate::base::ManagedProvider;
use crate::catalog::{ProviderSpec, CUSTOM_PRIORITY, PROVIDERS};
use crate::error::ProviderError;
use crate::http_provider::HttpBackend;
use crate::traits::LlmProvider;

type BuildFn = dyn Fn(&Config) -> Result<Arc<dyn LlmProvider>, ProviderError> + Send + Sync;

/// A named constructor with the fallback priority of what it builds.
pub struct ProviderFactory {
    label: String,
    priority: u32,
    build: Box<BuildFn>,
}

impl ProviderFactory {
    pub fn new<F>(label: impl Into<String>, priority: u32, build: F) -> Self
    where
        F: Fn(&Config) -> Result<Arc<dyn LlmProvider>, ProviderError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            priority,
            build: Box::new(build),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn build(&self, config: &Config) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        (self.build)(config)
    }
}

impl std::fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("label", &self.label)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Every known constructor: built-ins first, then custom providers in
/// config order.
pub fn default_factories(config: &Config) -> Vec<ProviderFactory> {
    let builtins = PROVIDERS
        .iter()
        .map(|spec| ProviderFactory::new(spec.name, spec.priority, move |cfg| build_builtin(spec, cfg)));

    let custom = config.providers.custom.iter().map(|custom| {
        let custom = custom.clone();
        ProviderFactory::new(custom.name.clone(), CUSTOM_PRIORITY, move |cfg| {
            build_custom(&custom, &cfg.generation)
        })
    });

    builtins.chain(custom).collect()
}

/// Construct a built-in provider from its spec and the user's config.
pub fn build_builtin(
    spec: &'static ProviderSpec,
    config: &Config,
) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let provider_config = config
        .providers
        .get_by_name(spec.name)
        .cloned()
        .unwrap_or_default();

    let api_base = provider_config
        .api_base
        .as_deref()
        .unwrap_or(spec.default_api_base);

    let backend = HttpBackend::new(api_base, &provider_config.api_key)
        .map_err(|e| client_error(spec.name, e))?
        .with_key_rule(spec.key_rule.clone())
        .with_extra_headers(provider_config.extra_headers.as_ref());

    let default_model = provider_config
        .default_model
        .as_deref()
        .unwrap_or(spec.default_model);

    let provider = ManagedProvider::new(
        spec.name,
        spec.model_list(),
        backend,
        config.generation.clone(),
    )?
    .with_default_model(Some(default_model))
    .with_display_name(spec.display_name)
    .with_description(spec.description);

    Ok(Arc::new(provider))
}

/// Construct a user-supplied provider.
///
/// Fails unless the entry carries a key, a base URL, and a model; discovery
/// then omits it.
pub fn build_custom(
    custom: &CustomProviderConfig,
    defaults: &GlobalConfig,
) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    if !custom.is_configured() {
        return Err(ProviderError::Unavailable {
            provider: custom.name.clone(),
            reason: "custom provider needs apiKey, apiBase and model".into(),
        });
    }

    let models = custom.model_list();
    let description = match custom.kind {
        CustomProviderKind::OpenaiCompatible => "User-configured OpenAI-compatible provider",
        CustomProviderKind::Anthropic => "User-configured Anthropic provider",
    };

    let provider: Arc<dyn LlmProvider> = match custom.kind {
        CustomProviderKind::OpenaiCompatible => {
            let backend = HttpBackend::new(&custom.api_base, &custom.api_key)
                .map_err(|e| client_error(&custom.name, e))?;
            Arc::new(
                ManagedProvider::new(custom.name.clone(), models, backend, defaults.clone())?
                    .with_description(description),
            )
        }
        CustomProviderKind::Anthropic => {
            let backend = AnthropicBackend::new(&custom.api_base, &custom.api_key)
                .map_err(|e| client_error(&custom.name, e))?;
            Arc::new(
                ManagedProvider::new(custom.name.clone(), models, backend, defaults.clone())?
                    .with_description(description),
            )
        }
    };

    Ok(provider)
}

fn client_error(provider: &str, err: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable {
        provider: provider.to_string(),
        reason: format!("failed to build HTTP client: {err}"),
    }
}
