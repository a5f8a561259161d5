//! Builds a ready [`ModelAgent`] for a model identifier.

use anyhow::Result;
use codex_core::ModelId;
use tracing::info;

use crate::agent::ModelAgent;
use crate::backend::LoadOptions;
use crate::provider::ModelProvider;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("../resources/prompt.txt");

/// The bundled system prompt shared by every model.
pub fn read_system_prompt_template() -> &'static str {
    SYSTEM_PROMPT_TEMPLATE
}

#[derive(Debug)]
pub struct AgentFactory<P> {
    provider: P,
    load_options: LoadOptions,
}

impl<P: ModelProvider> AgentFactory<P> {
    pub fn new(provider: P, load_options: LoadOptions) -> Self {
        Self {
            provider,
            load_options,
        }
    }

    /// Resolve `model`, make its weights available, load them, and wrap the
    /// result in the matching agent variant.
    ///
    /// Unsupported identifiers fail with `AppError::UnsupportedModel` before
    /// anything is downloaded or loaded. The credential is only used by models
    /// whose weights may be gated.
    pub async fn get_agent(&self, model: &str, credential: Option<&str>) -> Result<ModelAgent> {
        let model_id: ModelId = model.parse()?;
        self.build(model_id, credential).await
    }

    pub async fn build(&self, model: ModelId, credential: Option<&str>) -> Result<ModelAgent> {
        let credential = match model {
            ModelId::Qwen25Coder => credential,
            ModelId::Phi4Mini => None,
        };
        let path = self
            .provider
            .ensure_model_available(model, credential)
            .await?;
        let backend = self.provider.load_model(&path, &self.load_options).await?;
        info!(model = %model, path = %path.display(), "model loaded");
        Ok(ModelAgent::new(
            model,
            read_system_prompt_template(),
            backend,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;
    use crate::sampling::SamplingParams;
    use async_trait::async_trait;
    use codex_core::AppError;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoBackend;

    #[async_trait]
    impl InferenceBackend for EchoBackend {
        async fn complete(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
            Ok("echo ok".to_string())
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        ensure_calls: AtomicUsize,
        load_calls: AtomicUsize,
        credentials: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl ModelProvider for CountingProvider {
        async fn ensure_model_available(
            &self,
            model: ModelId,
            credential: Option<&str>,
        ) -> Result<PathBuf> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            self.credentials
                .lock()
                .expect("credential log lock poisoned")
                .push(credential.map(str::to_string));
            Ok(PathBuf::from(format!("/models/{}.gguf", model.as_str())))
        }

        async fn load_model(
            &self,
            _path: &Path,
            _options: &LoadOptions,
        ) -> Result<Box<dyn InferenceBackend>> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EchoBackend))
        }
    }

    fn factory() -> AgentFactory<CountingProvider> {
        AgentFactory::new(CountingProvider::default(), LoadOptions::default())
    }

    #[test]
    fn test_template_is_not_empty() {
        assert!(!read_system_prompt_template().trim().is_empty());
    }

    #[tokio::test]
    async fn test_every_supported_model_gets_the_template() {
        let factory = factory();
        for model in ModelId::ALL {
            let agent = factory
                .get_agent(model.as_str(), None)
                .await
                .expect("every supported model should build");
            assert_eq!(agent.model_id(), model);
            assert_eq!(agent.system_prompt(), read_system_prompt_template());
        }
        assert_eq!(
            factory.provider.load_calls.load(Ordering::SeqCst),
            ModelId::ALL.len()
        );
    }

    #[tokio::test]
    async fn test_unsupported_model_constructs_nothing() {
        let factory = factory();
        let err = factory.get_agent("gpt-4", None).await.unwrap_err();
        match err.downcast_ref::<AppError>() {
            Some(AppError::UnsupportedModel(id)) => assert_eq!(id, "gpt-4"),
            other => panic!("expected UnsupportedModel, got {other:?}"),
        }
        assert_eq!(factory.provider.ensure_calls.load(Ordering::SeqCst), 0);
        assert_eq!(factory.provider.load_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_credential_only_forwarded_for_gated_model() {
        let factory = factory();
        factory
            .get_agent("phi-4-mini", Some("hf_secret"))
            .await
            .expect("primary agent should build");
        factory
            .get_agent("qwen-2.5-coder", Some("hf_secret"))
            .await
            .expect("secondary agent should build");
        let credentials = factory.provider.credentials.lock().expect("credential log lock poisoned");
        assert_eq!(
            *credentials,
            vec![None, Some("hf_secret".to_string())]
        );
    }

    #[tokio::test]
    async fn test_built_agent_generates_through_loaded_backend() {
        let agent = factory()
            .get_agent("phi-4-mini", None)
            .await
            .expect("agent should build");
        assert_eq!(agent.generate("anything").await.expect("generation should succeed"), "echo ok");
    }
}
