use anyhow::Result;
use clap::Parser;
use codex_config::{CodexConfig, paths};
use crossterm::style::Stylize;
use std::process::ExitCode;

mod cli;
mod error_hints;
mod help;
mod logging;
mod pipeline;

use cli::Cli;
use pipeline::RunRequest;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.wants_help() {
        help::print_help();
        return ExitCode::from(1);
    }

    let state_dir = paths::state_dir().unwrap_or_else(paths::state_dir_fallback);
    let _log_guard = logging::init(&state_dir);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::info!(error = %format!("{e:#}"), "run failed");
            eprintln!("{}", format!("Error: {e:#}").red());
            if let Some(hint) = error_hints::suggest_fix(&e) {
                eprintln!("{hint}");
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CodexConfig::load_from_path(path)?,
        None => CodexConfig::load()?,
    };

    let request = RunRequest {
        prompt: cli.prompt_text(),
        model: cli
            .model
            .clone()
            .unwrap_or_else(|| config.defaults.model.clone()),
        credential: config.resolve_credential(cli.hf_token.clone()),
    };
    tracing::info!(model = %request.model, has_credential = request.credential.is_some(), "starting");

    match pipeline::run(request, &config).await? {
        Some(outcome) => tracing::debug!(?outcome, "done"),
        None => tracing::debug!("no command presented"),
    }
    Ok(())
}
