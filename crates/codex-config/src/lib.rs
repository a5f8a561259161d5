//! User configuration loading (`~/.config/open-codex/config.toml`) and XDG paths.

pub mod config;
pub mod paths;

pub use config::{CacheConfig, CodexConfig, Defaults, InferenceConfig};
