//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use switchboard_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Timeout: {}s", cfg.generation.api_timeout_seconds);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config, save_config};
pub use schema::{
    Config, CustomProviderConfig, CustomProviderKind, GenerationOptions, GenerationParams,
    GlobalConfig, LoggingConfig, ProviderConfig, ProvidersConfig,
};
