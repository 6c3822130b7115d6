//! Core building blocks for Switchboard: the configuration schema, its loader,
//! and small shared utilities.

pub mod config;
pub mod utils;

pub use config::{Config, GenerationOptions, GenerationParams, GlobalConfig};
