//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use switchboard_core::config::GenerationOptions;
use switchboard_core::utils::get_history_path;
use switchboard_providers::ProviderRegistry;

use crate::{helpers, status};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// One parsed line of REPL input.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Exit,
    Status,
    Use(&'a str),
    Model(&'a str),
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_command(input: &str) -> Command<'_> {
    if is_exit_command(input) {
        return Command::Exit;
    }
    let Some(rest) = input.strip_prefix('/') else {
        return Command::Message(input);
    };
    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    match (cmd, arg) {
        ("status", _) => Command::Status,
        ("use", name) if !name.is_empty() => Command::Use(name),
        ("model", model) if !model.is_empty() => Command::Model(model),
        _ => Command::Unknown(input),
    }
}

/// Run the interactive REPL loop.
///
/// `pinned` routes every message to that provider without fallback until
/// `/use` picks a new current provider.
pub async fn run(
    registry: Arc<ProviderRegistry>,
    options: GenerationOptions,
    mut pinned: Option<String>,
) -> Result<()> {
    let shown = pinned.clone().or_else(|| registry.current_provider_name());
    helpers::print_banner(shown.as_deref());

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        match parse_command(trimmed) {
            Command::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            Command::Status => {
                println!();
                status::print_providers(&registry);
                println!();
            }
            Command::Use(name) => match registry.switch_provider(name) {
                Ok(()) => {
                    pinned = None;
                    println!("{} {}", "Switched to".green(), name.bold());
                }
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::Model(model) => {
                let target = pinned.as_deref();
                match registry.switch_model(target, model) {
                    Ok(true) => println!("{} {}", "Model set to".green(), model.bold()),
                    Ok(false) => {
                        let offered = registry.list_models(target).unwrap_or_default();
                        eprintln!("❌ unknown model '{model}'. Offered: {}", offered.join(", "));
                    }
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
            Command::Unknown(cmd) => eprintln!("❌ unknown command: {cmd}"),
            Command::Message(message) => {
                debug!(input = message, "processing input");
                helpers::print_thinking();
                let result = registry.generate(message, &options, pinned.as_deref()).await;
                helpers::clear_thinking();
                match result {
                    Ok(generation) => helpers::print_response(&generation),
                    Err(e) => eprintln!("\n❌ Error: {e}\n"),
                }
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
