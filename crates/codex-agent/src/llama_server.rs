//! Inference backend that hosts a GGUF model in a private `llama-server` child.
//!
//! The server listens on a loopback port chosen at load time and is killed
//! when the [`LlamaServer`] handle drops, so each agent exclusively owns one
//! loaded model.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use codex_core::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::backend::{InferenceBackend, LoadOptions};
use crate::sampling::SamplingParams;

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct LlamaServer {
    child: Child,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for LlamaServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamaServer")
            .field("pid", &self.child.id())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LlamaServer {
    /// Start the server for `model_path` and wait until it reports healthy.
    ///
    /// The child's stdout is discarded and its stderr is inherited, so callers
    /// control server diagnostics by what fd 2 points to at spawn time.
    pub async fn spawn(
        binary: &str,
        model_path: &Path,
        options: &LoadOptions,
        startup_timeout: Duration,
    ) -> Result<Self> {
        let executable = which::which(binary)
            .map_err(|_| AppError::BackendNotInstalled(binary.to_string()))?;
        let port = free_loopback_port()?;

        let mut cmd = Command::new(&executable);
        cmd.args(server_args(model_path, port, options));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);

        debug!(executable = %executable.display(), port, "starting inference server");
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", executable.display()))?;

        let mut server = Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        };
        server.wait_until_ready(startup_timeout).await?;
        Ok(server)
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let health_url = format!("{}/health", self.base_url);

        loop {
            if let Some(status) = self
                .child
                .try_wait()
                .context("Failed to poll inference server")?
            {
                bail!("inference server exited during startup ({status})");
            }

            match self.client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(url = %self.base_url, "inference server ready");
                    return Ok(());
                }
                Ok(resp) => debug!(status = %resp.status(), "inference server still loading"),
                Err(_) => {}
            }

            if Instant::now() >= deadline {
                return Err(AppError::BackendStartupTimeout {
                    timeout_secs: timeout.as_secs(),
                }
                .into());
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl InferenceBackend for LlamaServer {
    async fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let url = format!("{}/completion", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CompletionRequest::new(prompt, params))
            .send()
            .await
            .context("inference request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read inference response body")?;
        if !status.is_success() {
            bail!("inference server returned {status}: {body}");
        }
        parse_completion(&body)
    }
}

fn server_args(model_path: &Path, port: u16, options: &LoadOptions) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        model_path.display().to_string(),
        "--host".to_string(),
        "127.0.0.1".to_string(),
        "--port".to_string(),
        port.to_string(),
        "--threads".to_string(),
        options.threads.to_string(),
        "--ctx-size".to_string(),
        options.context_size.to_string(),
        "--batch-size".to_string(),
        options.batch_size.to_string(),
    ];
    if options.use_mlock {
        args.push("--mlock".to_string());
    }
    args
}

fn free_loopback_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))
        .context("Failed to reserve a loopback port")?;
    Ok(listener.local_addr()?.port())
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    repeat_penalty: f32,
    stop: &'a [&'a str],
    stream: bool,
}

impl<'a> CompletionRequest<'a> {
    fn new(prompt: &'a str, params: &'a SamplingParams) -> Self {
        Self {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            repeat_penalty: params.repeat_penalty,
            stop: params.stop,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

fn parse_completion(body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).context("failed to parse completion response JSON")?;
    Ok(response.content)
}
