//! Shared CLI helpers — path expansion, response printing, banner.

use std::path::PathBuf;

use colored::Colorize;

use switchboard_providers::Generation;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a generated reply, tagged with the provider that produced it.
pub fn print_response(generation: &Generation) {
    println!();
    println!("{}", format!("⚡ {}", generation.provider).cyan().bold());
    if generation.text.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", generation.text);
    }
    println!();
}

/// Print a model list, marking the active one.
pub fn print_models(models: &[String], current: &str) {
    for model in models {
        if model == current {
            println!("  {} {}", "●".green(), model.bold());
        } else {
            println!("    {model}");
        }
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(current: Option<&str>) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "⚡ Switchboard".cyan().bold(), version.dimmed());
    match current {
        Some(name) => println!("{} {}", "Provider:".dimmed(), name.bold()),
        None => println!("{}", "No provider available. Set an API key to get started.".yellow()),
    }
    println!(
        "{}",
        "Type a message, /status, /use <provider>, /model <model>, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
