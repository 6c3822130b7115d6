//! Switchboard CLI — entry point.
//!
//! # Commands
//!
//! - `switchboard chat [-m MESSAGE] [-p PROVIDER]` — single-shot or REPL
//! - `switchboard status [--json]` — effective settings and provider health
//! - `switchboard models [-p PROVIDER]` — models offered by a provider

mod helpers;
mod repl;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use switchboard_core::config::{load_config, Config, GenerationOptions, LoggingConfig};
use switchboard_providers::ProviderRegistry;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Switchboard — one prompt, many LLM providers, automatic fallback
#[derive(Parser)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Path to config.json (defaults to ~/.switchboard/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the current provider (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Pin a provider; its failure is reported instead of falling back.
        #[arg(short, long)]
        provider: Option<String>,

        /// Sampling temperature (0.0 – 1.0)
        #[arg(long)]
        temperature: Option<f64>,

        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show effective settings and provider status
    Status {
        /// Print machine-readable JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the models of a provider
    Models {
        /// Provider name (defaults to the current provider)
        #[arg(short, long)]
        provider: Option<String>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);
    let config = load_config(config_path.as_deref());

    match cli.command {
        Commands::Chat {
            message,
            provider,
            temperature,
            max_tokens,
            logs,
        } => {
            init_logging(&config.logging, logs, cli.json_logs);
            let options = GenerationOptions {
                temperature,
                max_tokens,
                ..Default::default()
            };
            run_chat(&config, message, provider, options).await
        }
        Commands::Status { json } => {
            init_logging(&config.logging, false, cli.json_logs);
            status::run(&config, json)
        }
        Commands::Models { provider } => {
            init_logging(&config.logging, false, cli.json_logs);
            run_models(&config, provider.as_deref())
        }
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(
    config: &Config,
    message: Option<String>,
    pinned: Option<String>,
    options: GenerationOptions,
) -> Result<()> {
    let registry = Arc::new(ProviderRegistry::from_config(config));

    if let Some(name) = pinned.as_deref() {
        registry
            .get_provider(name)
            .with_context(|| format!("unknown provider '{name}'"))?;
    }

    match message {
        Some(msg) => {
            info!(pinned = pinned.as_deref().unwrap_or("none"), "processing single message");
            let generation = registry
                .generate(&msg, &options, pinned.as_deref())
                .await
                .context("generation failed")?;
            helpers::print_response(&generation);
        }
        None => {
            repl::run(registry, options, pinned).await?;
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────
// Models command
// ─────────────────────────────────────────────

fn run_models(config: &Config, provider: Option<&str>) -> Result<()> {
    let registry = ProviderRegistry::from_config(config);
    let models = registry
        .list_models(provider)
        .context("cannot list models")?;
    let current = registry.current_model(provider)?;
    helpers::print_models(&models, &current);
    Ok(())
}

/// Initialize tracing/logging.
///
/// `LOG_LEVEL` (via the config) sets the base filter; `--logs` or
/// `DEBUG_MODE` raises Switchboard's own targets to debug.
fn init_logging(logging: &LoggingConfig, verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let directives = log_directives(logging, verbose);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn log_directives(logging: &LoggingConfig, verbose: bool) -> String {
    let level = logging.level.trim().to_lowercase();
    let level = if level.is_empty() { "info".to_string() } else { level };
    if verbose || logging.debug_mode {
        format!("{level},switchboard=debug")
    } else {
        level
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
