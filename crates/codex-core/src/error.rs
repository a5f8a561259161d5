#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Error executing command: {0}")]
    SpawnOrStream(String),

    #[error("Inference server '{0}' is not installed")]
    BackendNotInstalled(String),

    #[error("Model download failed for '{model}': {message}")]
    DownloadFailed { model: String, message: String },

    #[error("Inference server did not become ready within {timeout_secs}s")]
    BackendStartupTimeout { timeout_secs: u64 },
}
