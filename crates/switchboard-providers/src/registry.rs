//! Provider registry — owns every provider, tracks the "current" one, and
//! fails over between them.
//!
//! # Fallback flow
//!
//! ```text
//! generate("hello")
//!     │
//!     ├─ preferred provider given and available? ──► call it, no fallback
//!     │
//!     ▼
//! current provider (if available) ──fails──► best available untried ──fails──► ...
//!     │                                            │
//!     └────────── first success becomes current ◄──┘
//!
//! every candidate failed ──► AllProvidersExhausted([(name, error), ...])
//! ```
//!
//! The registry state sits behind one mutex that is only held to read or
//! update the mapping and the current pointer, never across a backend call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use switchboard_core::config::{Config, GenerationOptions};

use crate::discovery::{default_factories, ProviderFactory};
use crate::error::{Attempt, ProviderError, RegistryError};
use crate::traits::{LlmProvider, PerformanceStats};

/// Priority given to providers registered without an explicit one.
pub const DEFAULT_PRIORITY: u32 = 100;

/// Successful registry generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Name of the provider that produced `text`.
    pub provider: String,
}

/// Read-only monitoring snapshot of one provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub is_available: bool,
    pub is_current: bool,
    pub current_model: String,
    pub performance_stats: PerformanceStats,
}

struct Entry {
    provider: Arc<dyn LlmProvider>,
    priority: u32,
    seq: u64,
}

#[derive(Default)]
struct RegistryState {
    providers: HashMap<String, Entry>,
    /// Names sorted by `(priority, seq)`.
    order: Vec<String>,
    current: Option<String>,
    next_seq: u64,
}

impl RegistryState {
    fn reorder(&mut self) {
        let providers = &self.providers;
        let mut order: Vec<String> = providers.keys().cloned().collect();
        order.sort_by_key(|name| {
            let entry = &providers[name];
            (entry.priority, entry.seq)
        });
        self.order = order;
    }

    fn best_available(&self, exclude: &HashSet<String>) -> Option<(String, Arc<dyn LlmProvider>)> {
        self.order
            .iter()
            .filter(|name| !exclude.contains(*name))
            .filter_map(|name| self.providers.get(name).map(|e| (name, &e.provider)))
            .find(|(_, provider)| provider.is_available())
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
    }

    fn current_entry(&self) -> Option<(String, Arc<dyn LlmProvider>)> {
        let name = self.current.as_ref()?;
        let entry = self.providers.get(name)?;
        Some((name.clone(), Arc::clone(&entry.provider)))
    }
}

/// Registry of LLM providers with priority-ordered, sticky fallback.
///
/// Share it as `Arc<ProviderRegistry>`; every method takes `&self`.
#[derive(Default)]
pub struct ProviderRegistry {
    state: Mutex<RegistryState>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ProviderRegistry")
            .field("order", &state.order)
            .field("current", &state.current)
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated with every known provider.
    pub fn from_config(config: &Config) -> Self {
        Self::with_factories(config, default_factories(config))
    }

    /// Create a registry from an explicit constructor table.
    pub fn with_factories(config: &Config, factories: Vec<ProviderFactory>) -> Self {
        let registry = Self::new();
        registry.discover_providers(config, factories);
        if registry.select_best_provider().is_none() {
            warn!("no provider is available; configure an API key");
        }
        registry
    }

    /// Run every constructor and register what it builds.
    ///
    /// A constructor that fails (or builds a clashing name) is logged and
    /// skipped; the rest are kept. Returns how many providers were added.
    pub fn discover_providers(&self, config: &Config, factories: Vec<ProviderFactory>) -> usize {
        let mut added = 0;
        for factory in factories {
            let provider = match factory.build(config) {
                Ok(p) => p,
                Err(e) => {
                    warn!(provider = factory.label(), error = %e, "skipping provider that failed to construct");
                    continue;
                }
            };
            match self.register_with_priority(provider, factory.priority()) {
                Ok(()) => added += 1,
                Err(e) => warn!(provider = factory.label(), error = %e, "skipping provider"),
            }
        }
        debug!(added, "provider discovery finished");
        added
    }

    /// Register a provider with [`DEFAULT_PRIORITY`].
    pub fn register_provider(&self, provider: Arc<dyn LlmProvider>) -> Result<(), RegistryError> {
        self.register_with_priority(provider, DEFAULT_PRIORITY)
    }

    /// Register a provider; lower `priority` is tried first, ties keep
    /// registration order.
    ///
    /// Registering the same instance again is a no-op. A different instance
    /// under a taken name fails with [`RegistryError::DuplicateProvider`]; use
    /// [`replace_provider`](Self::replace_provider) to swap it.
    pub fn register_with_priority(
        &self,
        provider: Arc<dyn LlmProvider>,
        priority: u32,
    ) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::Provider(ProviderError::InvalidRequest {
                provider: name,
                message: "provider name must not be empty".into(),
            }));
        }

        let mut state = self.lock();
        if let Some(existing) = state.providers.get(&name) {
            if same_instance(&existing.provider, &provider) {
                debug!(provider = %name, "provider already registered");
                return Ok(());
            }
            return Err(RegistryError::DuplicateProvider(name));
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let available = provider.is_available();
        state.providers.insert(
            name.clone(),
            Entry {
                provider,
                priority,
                seq,
            },
        );
        state.reorder();
        info!(provider = %name, priority, available, "registered provider");

        if state.current.is_none() && available {
            info!(provider = %name, "active provider");
            state.current = Some(name);
        }
        Ok(())
    }

    /// Swap the instance registered under the provider's name, keeping its
    /// priority and position. Registers it if the name is new.
    ///
    /// An available replacement becomes current when nothing is; an
    /// unavailable replacement of the current provider hands over to the best
    /// available one.
    ///
    /// Returns the replaced instance, if any.
    pub fn replace_provider(
        &self,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Option<Arc<dyn LlmProvider>>, RegistryError> {
        let name = provider.name().to_string();
        {
            let mut state = self.lock();
            if let Some(entry) = state.providers.get_mut(&name) {
                let available = provider.is_available();
                let previous = std::mem::replace(&mut entry.provider, provider);
                info!(provider = %name, available, "replaced provider instance");

                let was_current = state.current.as_deref() == Some(name.as_str());
                if state.current.is_none() && available {
                    info!(provider = %name, "active provider");
                    state.current = Some(name);
                } else if was_current && !available {
                    if let Some((next, _)) = state.best_available(&HashSet::new()) {
                        info!(provider = %next, previous = %name, "active provider");
                        state.current = Some(next);
                    }
                }
                return Ok(Some(previous));
            }
        }
        self.register_provider(provider)?;
        Ok(None)
    }

    /// Remove a provider. If it was current, the best available one takes over.
    pub fn unregister_provider(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        let mut state = self.lock();
        let removed = state.providers.remove(name)?;
        state.reorder();
        info!(provider = name, "unregistered provider");

        if state.current.as_deref() == Some(name) {
            state.current = state.best_available(&HashSet::new()).map(|(n, _)| n);
            match &state.current {
                Some(next) => info!(provider = %next, "active provider"),
                None => warn!("no provider available after unregistering '{}'", name),
            }
        }
        Some(removed.provider)
    }

    /// Look up a provider by name.
    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.lock()
            .providers
            .get(name)
            .map(|e| Arc::clone(&e.provider))
    }

    /// Registered names in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// Providers currently reporting availability, in fallback order.
    pub fn available_providers(&self) -> Vec<Arc<dyn LlmProvider>> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|name| state.providers.get(name))
            .filter(|e| e.provider.is_available())
            .map(|e| Arc::clone(&e.provider))
            .collect()
    }

    pub fn is_any_provider_available(&self) -> bool {
        !self.available_providers().is_empty()
    }

    pub fn current_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.lock().current_entry().map(|(_, p)| p)
    }

    pub fn current_provider_name(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Make the highest-priority available provider current.
    ///
    /// Returns `None` and leaves the current pointer untouched when nothing is
    /// available.
    pub fn select_best_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        let mut state = self.lock();
        let (name, provider) = state.best_available(&HashSet::new())?;
        if state.current.as_deref() != Some(name.as_str()) {
            info!(provider = %name, "active provider");
            state.current = Some(name);
        }
        Some(provider)
    }

    /// Manually make `name` the current provider.
    pub fn switch_provider(&self, name: &str) -> Result<(), RegistryError> {
        let mut state = self.lock();
        let entry = state
            .providers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;
        if !entry.provider.is_available() {
            return Err(RegistryError::Provider(ProviderError::Unavailable {
                provider: name.to_string(),
                reason: "provider is not configured".into(),
            }));
        }
        state.current = Some(name.to_string());
        info!(provider = name, "switched provider");
        Ok(())
    }

    /// Models of `name`, or of the current provider when `None`.
    pub fn list_models(&self, name: Option<&str>) -> Result<Vec<String>, RegistryError> {
        Ok(self.resolve(name)?.available_models())
    }

    /// Switch the model of `name` (or of the current provider).
    pub fn switch_model(&self, name: Option<&str>, model: &str) -> Result<bool, RegistryError> {
        Ok(self.resolve(name)?.switch_model(model))
    }

    /// Current model of `name` (or of the current provider).
    pub fn current_model(&self, name: Option<&str>) -> Result<String, RegistryError> {
        Ok(self.resolve(name)?.current_model())
    }

    /// Monitoring snapshot of every provider. Mutates nothing.
    pub fn get_status(&self) -> BTreeMap<String, ProviderStatus> {
        let (current, providers) = {
            let state = self.lock();
            let providers: Vec<(String, Arc<dyn LlmProvider>)> = state
                .providers
                .iter()
                .map(|(name, e)| (name.clone(), Arc::clone(&e.provider)))
                .collect();
            (state.current.clone(), providers)
        };

        providers
            .into_iter()
            .map(|(name, provider)| {
                let status = ProviderStatus {
                    is_available: provider.is_available(),
                    is_current: current.as_deref() == Some(name.as_str()),
                    current_model: provider.current_model(),
                    performance_stats: provider.performance_stats(),
                };
                (name, status)
            })
            .collect()
    }

    /// Generate text, failing over between providers.
    ///
    /// With `preferred` naming an available provider, only that provider is
    /// called and its error is returned unchanged; the current pointer is not
    /// moved. An unknown `preferred` name is an error; an unavailable one
    /// falls back to normal selection.
    ///
    /// Otherwise the current provider is tried first, then every other
    /// available provider in priority order, each at most once. The first to
    /// succeed becomes current.
    pub async fn generate(
        &self,
        message: &str,
        options: &GenerationOptions,
        preferred: Option<&str>,
    ) -> Result<Generation, RegistryError> {
        if let Some(name) = preferred {
            let provider = self
                .get_provider(name)
                .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;
            if provider.is_available() {
                debug!(provider = name, "using pinned provider");
                let text = provider.generate_response(message, options).await?;
                return Ok(Generation {
                    text,
                    provider: name.to_string(),
                });
            }
            warn!(provider = name, "pinned provider unavailable, using fallback order");
        }

        let mut tried = HashSet::new();
        let mut attempts = Vec::new();

        while let Some((name, provider)) = self.next_candidate(&tried) {
            tried.insert(name.clone());
            match provider.generate_response(message, options).await {
                Ok(text) => {
                    self.promote(&name, &provider);
                    return Ok(Generation {
                        text,
                        provider: name,
                    });
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "provider failed, trying next");
                    attempts.push(Attempt {
                        provider: name,
                        error: e,
                    });
                }
            }
        }

        error!(attempted = attempts.len(), "all providers exhausted");
        Err(RegistryError::AllProvidersExhausted(attempts))
    }

    /// Current provider if untried and available, else the best untried one.
    fn next_candidate(&self, tried: &HashSet<String>) -> Option<(String, Arc<dyn LlmProvider>)> {
        let state = self.lock();
        if let Some((name, provider)) = state.current_entry() {
            if !tried.contains(&name) && provider.is_available() {
                return Some((name, provider));
            }
        }
        state.best_available(tried)
    }

    /// Make `name` current if that exact instance is still registered.
    fn promote(&self, name: &str, provider: &Arc<dyn LlmProvider>) {
        let mut state = self.lock();
        let still_registered = state
            .providers
            .get(name)
            .is_some_and(|e| same_instance(&e.provider, provider));
        if still_registered && state.current.as_deref() != Some(name) {
            info!(
                provider = name,
                previous = state.current.as_deref().unwrap_or("none"),
                "switched to fallback provider"
            );
            state.current = Some(name.to_string());
        }
    }

    fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>, RegistryError> {
        match name {
            Some(name) => self
                .get_provider(name)
                .ok_or_else(|| RegistryError::UnknownProvider(name.to_string())),
            None => self.current_provider().ok_or(RegistryError::NoCurrentProvider),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_instance(a: &Arc<dyn LlmProvider>, b: &Arc<dyn LlmProvider>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
