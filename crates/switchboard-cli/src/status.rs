//! `switchboard status` — effective settings and per-provider health.
//!
//! Reads stats and availability only; never issues a generation request.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Map, Value};

use switchboard_core::config::{get_config_path, Config};
use switchboard_core::utils::mask_secret;
use switchboard_providers::ProviderRegistry;

/// Run the status command.
pub fn run(config: &Config, as_json: bool) -> Result<()> {
    let registry = ProviderRegistry::from_config(config);

    if as_json {
        let report = json_report(config, &registry);
        let text = serde_json::to_string_pretty(&report).context("failed to encode status")?;
        println!("{text}");
        return Ok(());
    }

    println!();
    println!("{}", "⚡ Switchboard Status".cyan().bold());
    println!();

    let config_path = get_config_path();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".dimmed().to_string()
        }
    );

    println!();
    println!("  {}", "Settings:".bold());
    for (key, value) in config.generation.debug_info(&config.logging) {
        println!("    {key:<18} {value}");
    }

    println!();
    println!("  {}", "API keys:".bold());
    for (name, key) in key_summary(config) {
        match key {
            Some(masked) => println!("    {name:<18} {masked}"),
            None => println!("    {name:<18} {}", "· not set".dimmed()),
        }
    }

    println!();
    print_providers(&registry);
    println!();

    Ok(())
}

/// Print the provider table. Shared with the REPL's `/status`.
pub fn print_providers(registry: &ProviderRegistry) {
    println!("  {}", "Providers:".bold());
    for (name, status) in registry.get_status() {
        let marker = if status.is_current {
            "●".green().to_string()
        } else {
            " ".to_string()
        };
        let state = if status.is_available {
            "available".green().to_string()
        } else {
            "· not configured".dimmed().to_string()
        };
        let stats = &status.performance_stats;
        println!(
            "  {} {:<16} {:<20} {}",
            marker,
            name,
            state,
            format!(
                "model: {} | requests: {} | errors: {:.0}% | avg: {:.0}ms",
                status.current_model,
                stats.request_count,
                stats.error_rate * 100.0,
                stats.average_latency_ms
            )
            .dimmed()
        );
        if let Some(err) = &stats.last_error {
            println!("    {:<16} {}", "", format!("last error: {err}").red());
        }
    }
}

/// Masked API key per configured provider, built-ins first.
fn key_summary(config: &Config) -> Vec<(String, Option<String>)> {
    let providers = &config.providers;
    let builtins = [
        ("groq", &providers.groq.api_key),
        ("huggingface", &providers.huggingface.api_key),
    ];
    let custom = providers.custom.iter().map(|c| (c.name.as_str(), &c.api_key));

    builtins
        .into_iter()
        .chain(custom)
        .map(|(name, key)| {
            let key = key.trim();
            let masked = (!key.is_empty()).then(|| mask_secret(key));
            (name.to_string(), masked)
        })
        .collect()
}

fn json_report(config: &Config, registry: &ProviderRegistry) -> Value {
    let settings: Map<String, Value> = config
        .generation
        .debug_info(&config.logging)
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect();

    let api_keys: Map<String, Value> = key_summary(config)
        .into_iter()
        .map(|(name, masked)| (name, Value::from(masked)))
        .collect();

    json!({
        "settings": settings,
        "apiKeys": api_keys,
        "currentProvider": registry.current_provider_name(),
        "providers": registry.get_status(),
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
