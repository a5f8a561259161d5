//! Model acquisition and loading.
//!
//! A [`ModelProvider`] makes model weights available on local disk and turns
//! them into a loaded [`InferenceBackend`]. [`LocalModelProvider`] fetches
//! GGUF files from Hugging Face into the cache directory on first use and
//! serves them through a private `llama-server`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use codex_core::{AppError, ModelId};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::backend::{InferenceBackend, LoadOptions};
use crate::llama_server::LlamaServer;
use crate::silence::StderrSilencer;

const DEFAULT_HUB_URL: &str = "https://huggingface.co";
/// Progress is reported each time the downloaded share crosses this many percent.
const PROGRESS_STEP_PERCENT: u64 = 5;
/// Without a Content-Length, report every this many bytes instead.
const PROGRESS_STEP_BYTES: u64 = 64 * 1024 * 1024;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Return a local path to the weights for `model`, fetching them if needed.
    async fn ensure_model_available(
        &self,
        model: ModelId,
        credential: Option<&str>,
    ) -> Result<PathBuf>;

    /// Load the weights at `path` into a ready-to-use backend.
    async fn load_model(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceBackend>>;
}

/// Where the GGUF weights for a model are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelArtifact {
    pub repo_id: &'static str,
    pub filename: &'static str,
}

impl ModelArtifact {
    pub fn for_model(model: ModelId) -> Self {
        match model {
            ModelId::Phi4Mini => Self {
                repo_id: "lmstudio-community/Phi-4-mini-instruct-GGUF",
                filename: "Phi-4-mini-instruct-Q3_K_L.gguf",
            },
            ModelId::Qwen25Coder => Self {
                repo_id: "unsloth/Qwen2.5-Coder-1.5B-Instruct-GGUF",
                filename: "Qwen2.5-Coder-1.5B-Instruct-F16.gguf",
            },
        }
    }

    pub fn download_url(&self, hub_url: &str) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            hub_url.trim_end_matches('/'),
            self.repo_id,
            self.filename
        )
    }
}

#[derive(Debug)]
pub struct LocalModelProvider {
    cache_dir: PathBuf,
    server_binary: String,
    startup_timeout: Duration,
    show_backend_logs: bool,
    hub_url: String,
    client: reqwest::Client,
}

impl LocalModelProvider {
    pub fn new(cache_dir: impl Into<PathBuf>, server_binary: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            server_binary: server_binary.into(),
            startup_timeout: Duration::from_secs(120),
            show_backend_logs: false,
            hub_url: DEFAULT_HUB_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn with_backend_logs(mut self, show: bool) -> Self {
        self.show_backend_logs = show;
        self
    }

    pub fn with_hub_url(mut self, hub_url: impl Into<String>) -> Self {
        self.hub_url = hub_url.into();
        self
    }

    /// Local path the weights for `model` live at once downloaded.
    pub fn model_path(&self, model: ModelId) -> PathBuf {
        self.cache_dir.join(ModelArtifact::for_model(model).filename)
    }

    async fn download(
        &self,
        model: ModelId,
        destination: &Path,
        credential: Option<&str>,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.cache_dir.display()))?;

        let partial = destination.with_extension("gguf.part");
        let result = self
            .download_to(model, &partial, credential)
            .await
            .and_then(|()| {
                std::fs::rename(&partial, destination).with_context(|| {
                    format!("Failed to move download into {}", destination.display())
                })
            });
        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        }
        result
    }

    async fn download_to(
        &self,
        model: ModelId,
        partial: &Path,
        credential: Option<&str>,
    ) -> Result<()> {
        let url = ModelArtifact::for_model(model).download_url(&self.hub_url);
        debug!(%url, "downloading model weights");

        let mut request = self.client.get(&url);
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }
        let mut response = request.send().await.map_err(|e| download_error(model, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(download_error(model, format!("HTTP {status}")));
        }

        let mut progress = DownloadProgress::new(response.content_length());
        let mut file = tokio::fs::File::create(partial)
            .await
            .with_context(|| format!("Failed to create {}", partial.display()))?;
        while let Some(chunk) = response.chunk().await.map_err(|e| download_error(model, e))? {
            file.write_all(&chunk).await?;
            if let Some(line) = progress.advance(chunk.len() as u64) {
                eprint!("\r{line}");
            }
        }
        file.flush().await?;
        eprintln!();
        Ok(())
    }
}

fn download_error(model: ModelId, message: impl std::fmt::Display) -> anyhow::Error {
    AppError::DownloadFailed {
        model: model.to_string(),
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl ModelProvider for LocalModelProvider {
    async fn ensure_model_available(
        &self,
        model: ModelId,
        credential: Option<&str>,
    ) -> Result<PathBuf> {
        let path = self.model_path(model);
        if path.exists() {
            eprintln!("🚀 Loading {} model...", model.display_name());
            return Ok(path);
        }

        eprintln!(
            "\n🤖 Welcome to Open Codex!\n\
             📦 First run requires downloading the model.\n\
             ⚡️ This model is optimized for quick responses.\n"
        );
        let start = Instant::now();
        self.download(model, &path, credential).await?;
        eprintln!("✅ Model downloaded ({:.1}s)", start.elapsed().as_secs_f64());
        info!(model = %model, path = %path.display(), "model downloaded");
        Ok(path)
    }

    async fn load_model(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceBackend>> {
        let server = {
            let _silencer = StderrSilencer::engage_if(!self.show_backend_logs);
            LlamaServer::spawn(&self.server_binary, path, options, self.startup_timeout).await?
        };
        eprintln!("✨ Model ready!");
        Ok(Box::new(server))
    }
}

/// Turns byte counts into occasional human-readable progress lines.
#[derive(Debug)]
struct DownloadProgress {
    total: Option<u64>,
    received: u64,
    last_reported: u64,
}

impl DownloadProgress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
            last_reported: 0,
        }
    }

    /// Record `bytes` more; returns a line when a new step is reached.
    fn advance(&mut self, bytes: u64) -> Option<String> {
        self.received += bytes;
        match self.total {
            Some(total) => {
                let percent = (self.received.min(total) * 100) / total;
                let step = percent / PROGRESS_STEP_PERCENT;
                if step > self.last_reported {
                    self.last_reported = step;
                    Some(format!(
                        "⬇️  {percent}% ({} / {} MB)",
                        self.received / 1_048_576,
                        total / 1_048_576
                    ))
                } else {
                    None
                }
            }
            None => {
                let step = self.received / PROGRESS_STEP_BYTES;
                if step > self.last_reported {
                    self.last_reported = step;
                    Some(format!("⬇️  {} MB", self.received / 1_048_576))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_artifacts_are_distinct_gguf_files() {
        let phi = ModelArtifact::for_model(ModelId::Phi4Mini);
        let qwen = ModelArtifact::for_model(ModelId::Qwen25Coder);
        assert_ne!(phi, qwen);
        assert!(phi.filename.ends_with(".gguf"));
        assert!(qwen.filename.ends_with(".gguf"));
    }

    #[test]
    fn test_download_url() {
        let artifact = ModelArtifact::for_model(ModelId::Phi4Mini);
        assert_eq!(
            artifact.download_url("https://huggingface.co/"),
            "https://huggingface.co/lmstudio-community/Phi-4-mini-instruct-GGUF/resolve/main/Phi-4-mini-instruct-Q3_K_L.gguf"
        );
    }

    #[test]
    fn test_model_path_in_cache_dir() {
        let provider = LocalModelProvider::new("/cache/open-codex", "llama-server");
        assert_eq!(
            provider.model_path(ModelId::Qwen25Coder),
            PathBuf::from("/cache/open-codex/Qwen2.5-Coder-1.5B-Instruct-F16.gguf")
        );
    }

    #[tokio::test]
    async fn test_ensure_model_available_uses_cached_file() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let provider = LocalModelProvider::new(tmp.path(), "llama-server")
            .with_hub_url("http://127.0.0.1:9");
        let expected = provider.model_path(ModelId::Phi4Mini);
        std::fs::write(&expected, b"gguf").expect("write cached model");

        let path = provider
            .ensure_model_available(ModelId::Phi4Mini, None)
            .await
            .expect("cached model should be used without downloading");
        assert_eq!(path, expected);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        // Port 9 (discard) is not serving HTTP, so the request fails fast.
        let provider = LocalModelProvider::new(tmp.path(), "llama-server")
            .with_hub_url("http://127.0.0.1:9");

        let err = provider
            .ensure_model_available(ModelId::Qwen25Coder, Some("hf_token"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::DownloadFailed { .. })
        ));
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).expect("Should read cache dir").collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_load_model_missing_binary() {
        let provider = LocalModelProvider::new("/tmp", "no-such-llama-server-binary");
        let Err(err) = provider
            .load_model(Path::new("/tmp/none.gguf"), &LoadOptions::default())
            .await
        else {
            panic!("loading without a server binary should fail");
        };
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::BackendNotInstalled(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_load_model_failure_restores_stderr() {
        use std::os::fd::AsRawFd;

        fn stderr_identity() -> (u64, u64) {
            use std::os::unix::fs::MetadataExt;
            let fd = std::io::stderr().as_raw_fd();
            // SAFETY: fd 2 stays open for the life of the test process; the
            // ManuallyDrop wrapper keeps the File from closing it.
            let file = std::mem::ManuallyDrop::new(unsafe {
                <std::fs::File as std::os::fd::FromRawFd>::from_raw_fd(fd)
            });
            let meta = file.metadata().expect("fstat on stderr");
            (meta.dev(), meta.ino())
        }

        let before = stderr_identity();
        let provider = LocalModelProvider::new("/tmp", "no-such-llama-server-binary");
        let result = provider
            .load_model(Path::new("/tmp/none.gguf"), &LoadOptions::default())
            .await;
        assert!(result.is_err(), "loading without a server binary should fail");
        assert_eq!(stderr_identity(), before);
    }

    #[test]
    fn test_progress_with_total_reports_steps() {
        let mut progress = DownloadProgress::new(Some(100));
        assert!(progress.advance(3).is_none());
        let line = progress.advance(2).expect("crossing 5% should report");
        assert!(line.contains("5%"));
        assert!(progress.advance(1).is_none());
        assert!(progress.advance(94).expect("completion should report").contains("100%"));
    }

    #[test]
    fn test_progress_without_total_reports_by_bytes() {
        let mut progress = DownloadProgress::new(None);
        assert!(progress.advance(PROGRESS_STEP_BYTES - 1).is_none());
        assert!(progress.advance(1).expect("crossing a step should report").contains("64 MB"));
    }

    #[test]
    fn test_progress_zero_total_treated_as_unknown() {
        let mut progress = DownloadProgress::new(Some(0));
        assert!(progress.advance(10).is_none());
    }
}
