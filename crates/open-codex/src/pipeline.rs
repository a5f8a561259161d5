//! One-shot flow: build the agent, generate a command, hand it to the controller.

use anyhow::Result;
use codex_agent::{AgentFactory, LoadOptions, LocalModelProvider, ModelAgent, ModelProvider};
use codex_config::CodexConfig;
use codex_core::{AppError, ExecutionOutcome};
use codex_process::{
    ClipboardSink, ExecutionController, KeySource, RawTerminal, SystemClipboard,
};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a single invocation needs, resolved from CLI and config.
#[derive(Debug)]
pub struct RunRequest {
    pub prompt: String,
    pub model: String,
    pub credential: Option<String>,
}

pub fn load_options(config: &CodexConfig) -> LoadOptions {
    LoadOptions {
        threads: config.inference.resolved_threads(),
        context_size: config.inference.context_size,
        batch_size: config.inference.batch_size,
        use_mlock: config.inference.use_mlock,
    }
}

pub fn model_provider(config: &CodexConfig) -> LocalModelProvider {
    LocalModelProvider::new(config.model_cache_dir(), &config.inference.server_binary)
        .with_startup_timeout(Duration::from_secs(config.inference.startup_timeout_secs))
        .with_backend_logs(config.inference.show_backend_logs)
}

/// Load the requested model and run one generate-and-confirm cycle against
/// the real terminal.
pub async fn run(request: RunRequest, config: &CodexConfig) -> Result<Option<ExecutionOutcome>> {
    let factory = AgentFactory::new(model_provider(config), load_options(config));
    let mut controller = ExecutionController::new(
        RawTerminal::new(),
        SystemClipboard::detect(),
        std::io::stdout(),
    );
    run_with(&factory, &mut controller, &request).await
}

/// Build the agent for `request` and run one cycle through `controller`.
///
/// Setup failures (unknown model, missing backend, download) propagate.
pub async fn run_with<P, K, C, W>(
    factory: &AgentFactory<P>,
    controller: &mut ExecutionController<K, C, W>,
    request: &RunRequest,
) -> Result<Option<ExecutionOutcome>>
where
    P: ModelProvider,
    K: KeySource,
    C: ClipboardSink,
    W: Write,
{
    let agent = factory
        .get_agent(&request.model, request.credential.as_deref())
        .await?;
    controller.announce(&format!("Using model: {}", request.model))?;
    run_one_shot(&agent, controller, &request.prompt).await
}

/// Generate a command for `prompt` and present it once.
///
/// A failed generation or an empty command prints one `Error:` line and
/// yields `None`; nothing is presented.
pub async fn run_one_shot<K, C, W>(
    agent: &ModelAgent,
    controller: &mut ExecutionController<K, C, W>,
    prompt: &str,
) -> Result<Option<ExecutionOutcome>>
where
    K: KeySource,
    C: ClipboardSink,
    W: Write,
{
    let command = match agent.generate(prompt).await {
        Ok(command) => command,
        Err(e) if matches!(e.downcast_ref::<AppError>(), Some(AppError::Inference(_))) => {
            warn!(model = %agent.model_id(), "generation failed: {e:#}");
            controller.report_error(&format!("{e:#}"))?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if command.is_empty() {
        warn!(model = %agent.model_id(), "no command generated");
        controller.report_error("no command generated")?;
        return Ok(None);
    }
    info!(model = %agent.model_id(), %command, "command generated");
    controller.present(&command).await.map(Some)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
