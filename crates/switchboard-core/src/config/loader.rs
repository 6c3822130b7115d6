//! Config loader — reads `~/.switchboard/config.json` and overlays
//! environment variables.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.switchboard/config.json`
//! 3. Environment variables (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    apply_env_overrides(read_config_file(&config_path))
}

/// Read the JSON file only, without env overrides.
fn read_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply process environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`.
///
/// Supported keys:
/// - `GROQ_API_KEY`, `GROQ_DEFAULT_MODEL`, `GROQ_API_BASE`
/// - `HUGGINGFACE_API_KEY` (or `HF_TOKEN`), `HUGGINGFACE_DEFAULT_MODEL`, `HUGGINGFACE_API_BASE`
/// - `GLOBAL_TEMPERATURE`, `GLOBAL_MAX_TOKENS`, `API_TIMEOUT`, `AUTO_RETRY`, `MAX_RETRIES`
/// - `LOG_LEVEL`, `DEBUG_MODE`
///
/// Values that fail to parse are ignored with a warning.
pub fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    apply_provider_env(&mut config.providers.groq, "GROQ", &lookup);
    apply_provider_env(&mut config.providers.huggingface, "HUGGINGFACE", &lookup);
    if !config.providers.huggingface.is_configured() {
        if let Some(token) = non_empty(lookup("HF_TOKEN")) {
            config.providers.huggingface.api_key = token;
        }
    }

    let generation = &mut config.generation;
    if let Some(t) = parsed(&lookup, "GLOBAL_TEMPERATURE") {
        generation.temperature = t;
    }
    if let Some(n) = parsed(&lookup, "GLOBAL_MAX_TOKENS") {
        generation.max_tokens = n;
    }
    if let Some(secs) = parsed(&lookup, "API_TIMEOUT") {
        generation.api_timeout_seconds = secs;
    }
    if let Some(val) = lookup("AUTO_RETRY") {
        generation.auto_retry = parse_flag(&val);
    }
    if let Some(n) = parsed(&lookup, "MAX_RETRIES") {
        generation.max_retries = n;
    }

    if let Some(level) = non_empty(lookup("LOG_LEVEL")) {
        config.logging.level = level;
    }
    if let Some(val) = lookup("DEBUG_MODE") {
        config.logging.debug_mode = parse_flag(&val);
    }

    config
}

/// Apply `<NAME>_API_KEY`, `<NAME>_DEFAULT_MODEL`, `<NAME>_API_BASE`.
fn apply_provider_env<F>(provider: &mut ProviderConfig, name: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = non_empty(lookup(&format!("{name}_API_KEY"))) {
        provider.api_key = val;
    }
    if let Some(val) = non_empty(lookup(&format!("{name}_DEFAULT_MODEL"))) {
        provider.default_model = Some(val);
    }
    if let Some(val) = non_empty(lookup(&format!("{name}_API_BASE"))) {
        provider.api_base = Some(val);
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = read_config_file(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.generation.max_tokens, 1000);
        assert_eq!(config.generation.api_timeout_seconds, 30);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(r#"{
            "generation": { "maxTokens": 2048 },
            "providers": { "groq": { "apiKey": "gsk_file" } }
        }"#);

        let config = read_config_file(file.path());
        assert_eq!(config.generation.max_tokens, 2048);
        assert_eq!(config.providers.groq.api_key, "gsk_file");
        // Default preserved
        assert_eq!(config.generation.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = read_config_file(file.path());
        assert_eq!(config.generation.max_tokens, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.generation.max_retries = 7;
        config.providers.huggingface.api_key = "hf_test".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = read_config_file(&path);
        assert_eq!(reloaded.generation.max_retries, 7);
        assert_eq!(reloaded.providers.huggingface.api_key, "hf_test");
    }

    #[test]
    fn test_env_overrides_provider_keys() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("GROQ_API_KEY", "gsk_env"),
                ("GROQ_DEFAULT_MODEL", "llama3-8b-8192"),
                ("HUGGINGFACE_API_BASE", "http://localhost:9000/v1"),
            ]),
        );
        assert_eq!(config.providers.groq.api_key, "gsk_env");
        assert_eq!(
            config.providers.groq.default_model.as_deref(),
            Some("llama3-8b-8192")
        );
        assert_eq!(
            config.providers.huggingface.api_base.as_deref(),
            Some("http://localhost:9000/v1")
        );
    }

    #[test]
    fn test_hf_token_is_fallback_only() {
        let config = apply_overrides_from(Config::default(), env(&[("HF_TOKEN", "hf_token")]));
        assert_eq!(config.providers.huggingface.api_key, "hf_token");

        let config = apply_overrides_from(
            Config::default(),
            env(&[("HF_TOKEN", "hf_token"), ("HUGGINGFACE_API_KEY", "hf_primary")]),
        );
        assert_eq!(config.providers.huggingface.api_key, "hf_primary");
    }

    #[test]
    fn test_env_overrides_generation_defaults() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("GLOBAL_TEMPERATURE", "0.3"),
                ("GLOBAL_MAX_TOKENS", "512"),
                ("API_TIMEOUT", "5"),
                ("AUTO_RETRY", "FALSE"),
                ("MAX_RETRIES", "1"),
                ("LOG_LEVEL", "debug"),
                ("DEBUG_MODE", "true"),
            ]),
        );
        assert_eq!(config.generation.temperature, 0.3);
        assert_eq!(config.generation.max_tokens, 512);
        assert_eq!(config.generation.api_timeout_seconds, 5);
        assert!(!config.generation.auto_retry);
        assert_eq!(config.generation.max_retries, 1);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.debug_mode);
    }

    #[test]
    fn test_env_ignores_unparseable_values() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[("GLOBAL_MAX_TOKENS", "lots"), ("GROQ_API_KEY", "  ")]),
        );
        assert_eq!(config.generation.max_tokens, 1000);
        assert!(!config.providers.groq.is_configured());
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["generation"].get("maxTokens").is_some());
        assert!(raw["generation"].get("max_tokens").is_none());
    }
}
