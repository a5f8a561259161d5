//! User-level configuration (`~/.config/open-codex/config.toml`).
//!
//! Every field has a default, so a missing file or a partial file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_MODEL: &str = "phi-4-mini";
const DEFAULT_CREDENTIAL_ENV: &str = "HUGGINGFACE_TOKEN";
const DEFAULT_CONTEXT_SIZE: u32 = 2048;
const DEFAULT_BATCH_SIZE: u32 = 256;
const DEFAULT_SERVER_BINARY: &str = "llama-server";
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 120;
/// Upper bound on inference threads when none are configured.
const MAX_DEFAULT_THREADS: u32 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodexConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Model used when `--model` is omitted.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable consulted when `--hf-token` is omitted.
    #[serde(default = "default_credential_env")]
    pub credential_env: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            credential_env: default_credential_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Inference threads. None = min(4, available CPUs).
    #[serde(default)]
    pub threads: Option<u32>,
    #[serde(default = "default_context_size")]
    pub context_size: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_true")]
    pub use_mlock: bool,
    /// llama.cpp server executable, looked up on PATH unless absolute.
    #[serde(default = "default_server_binary")]
    pub server_binary: String,
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
    /// Keep the server's own diagnostics on stderr instead of discarding them.
    #[serde(default)]
    pub show_backend_logs: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            threads: None,
            context_size: DEFAULT_CONTEXT_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            use_mlock: true,
            server_binary: default_server_binary(),
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            show_backend_logs: false,
        }
    }
}

impl InferenceConfig {
    /// Configured thread count, or min(4, available CPUs).
    pub fn resolved_threads(&self) -> u32 {
        self.threads.filter(|t| *t > 0).unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1);
            cpus.min(MAX_DEFAULT_THREADS)
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Override for the model weight directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_credential_env() -> String {
    DEFAULT_CREDENTIAL_ENV.to_string()
}

fn default_context_size() -> u32 {
    DEFAULT_CONTEXT_SIZE
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

fn default_server_binary() -> String {
    DEFAULT_SERVER_BINARY.to_string()
}

fn default_startup_timeout_secs() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

impl CodexConfig {
    /// Load from the default XDG location.
    ///
    /// Returns `Default` if the file does not exist or if the config
    /// directory cannot be determined (e.g., no HOME in containers).
    pub fn load() -> Result<Self> {
        match paths::config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Directory holding model weights.
    pub fn model_cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .or_else(paths::cache_dir)
            .unwrap_or_else(paths::cache_dir_fallback)
    }

    /// Credential from the command line, falling back to the configured env var.
    pub fn resolve_credential(&self, cli_value: Option<String>) -> Option<String> {
        self.resolve_credential_with(cli_value, |key| std::env::var(key).ok())
    }

    pub(crate) fn resolve_credential_with(
        &self,
        cli_value: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        cli_value
            .or_else(|| lookup(&self.defaults.credential_env))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
