//! Utility helpers — path resolution and string manipulation.

use std::path::PathBuf;

/// Get the Switchboard data directory (e.g. `~/.switchboard/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".switchboard")
}

/// Get the REPL history file (e.g. `~/.switchboard/history/chat_history`).
pub fn get_history_path() -> PathBuf {
    get_data_path().join("history").join("chat_history")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Mask a secret for display, keeping the first four characters.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
    }

    #[test]
    fn test_truncate_unicode() {
        let result = truncate_string("こんにちは世界です", 5);
        assert_eq!(result, "こん...");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("gsk_abcdef"), "gsk_****");
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("ab"), "ab****");
    }

    #[test]
    fn test_data_path_ends_with_switchboard() {
        assert!(get_data_path().ends_with(".switchboard"));
    }

    #[test]
    fn test_history_path_under_data_dir() {
        let path = get_history_path();
        assert!(path.ends_with("chat_history"));
        assert!(path.to_string_lossy().contains(".switchboard"));
    }
}
