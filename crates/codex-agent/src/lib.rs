//! Natural-language to shell-command agents backed by a locally hosted model.

pub mod agent;
pub mod backend;
pub mod factory;
pub mod format;
pub mod llama_server;
pub mod provider;
pub mod sampling;
pub mod silence;

pub use agent::{FALLBACK_COMMAND, ModelAgent, sanitize_command};
pub use backend::{InferenceBackend, LoadOptions};
pub use factory::{AgentFactory, read_system_prompt_template};
pub use format::format_chat;
pub use llama_server::LlamaServer;
pub use provider::{LocalModelProvider, ModelArtifact, ModelProvider};
pub use sampling::SamplingParams;
pub use silence::StderrSilencer;
