use anyhow::Result;
use async_trait::async_trait;

use crate::sampling::SamplingParams;

/// A loaded model able to complete a raw prompt.
///
/// Implementations own the underlying model handle; dropping the backend
/// releases it.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Complete `prompt` and return the raw generated text.
    async fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String>;
}

/// Resource settings applied once, when the model is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub threads: u32,
    pub context_size: u32,
    pub batch_size: u32,
    /// Lock model pages in RAM to prevent swapping.
    pub use_mlock: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            threads: 4,
            context_size: 2048,
            batch_size: 256,
            use_mlock: true,
        }
    }
}
