//! User-facing hints for common failures.
//!
//! Matches on the typed error first, then falls back to scanning the chain
//! text, and returns a single actionable `hint:` line.

use anyhow::Error;
use codex_core::{AppError, ModelId};

const HINT_INSTALL_LLAMA: &str = "hint: install llama.cpp (e.g. `brew install llama.cpp`) so `llama-server` is on PATH, \
     or set `server_binary` under [inference] in config.toml";
const HINT_HF_TOKEN: &str =
    "hint: pass a Hugging Face token with --hf-token or export HUGGINGFACE_TOKEN=your_token";
const HINT_NETWORK: &str =
    "hint: the first run downloads the model; check your network connection and retry";
const HINT_STARTUP_TIMEOUT: &str = "hint: raise `startup_timeout_secs` or set `show_backend_logs = true` under [inference] \
     in config.toml to see server output";
const HINT_CONFIG_ERROR: &str =
    "hint: fix or remove ~/.config/open-codex/config.toml (or the file given with --config)";

pub fn suggest_fix(err: &Error) -> Option<String> {
    for cause in err.chain() {
        if let Some(app_err) = cause.downcast_ref::<AppError>() {
            match app_err {
                AppError::UnsupportedModel(_) => return Some(supported_models_hint()),
                AppError::BackendNotInstalled(_) => return Some(HINT_INSTALL_LLAMA.to_string()),
                AppError::BackendStartupTimeout { .. } => {
                    return Some(HINT_STARTUP_TIMEOUT.to_string());
                }
                AppError::DownloadFailed { message, .. } => {
                    return Some(download_hint(message).to_string());
                }
                _ => {}
            }
        }
    }

    let chain_text = err
        .chain()
        .map(|cause| cause.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ");

    if chain_text.contains("config") && chain_text.contains("parse") {
        return Some(HINT_CONFIG_ERROR.to_string());
    }

    None
}

fn supported_models_hint() -> String {
    let models: Vec<_> = ModelId::ALL.iter().map(|m| m.as_str()).collect();
    format!("hint: supported models: {}", models.join(", "))
}

fn download_hint(message: &str) -> &'static str {
    if message.contains("401") || message.contains("403") {
        HINT_HF_TOKEN
    } else {
        HINT_NETWORK
    }
}
