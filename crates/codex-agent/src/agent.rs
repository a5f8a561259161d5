//! Model agents: one closed enum over the supported local models.
//!
//! Uses the data enum pattern (not trait + dynamic dispatch) for the fixed
//! model set. Adding a model means a new variant, its sampling table and a
//! constructor arm; the `generate` contract stays the same.

use anyhow::Result;
use codex_core::{AppError, ChatTurn, ModelId};
use tracing::{debug, warn};

use crate::backend::InferenceBackend;
use crate::format::format_chat;
use crate::sampling::SamplingParams;

/// Command returned by the secondary agent when its output looks malformed.
pub const FALLBACK_COMMAND: &str = "find . -name \"*.py\"";

const END_OF_TURN: &str = "<|im_end|>";
const ONE_SHOT_REQUEST: &str = "I need a shell command to find all python files";
const ONE_SHOT_REPLY: &str = "find . -name \"*.py\"";

/// Fragments that never appear in a command we are willing to suggest.
const REJECTED_FRAGMENTS: [&str; 3] = ["<", ">", "|/"];

/// A loaded model plus the fixed system prompt it was built with.
///
/// Neither field can be replaced after construction; dropping the agent
/// releases the model.
pub enum ModelAgent {
    /// Fast, minimal-context model. Returns raw output and fails loudly.
    Primary {
        system_prompt: String,
        backend: Box<dyn InferenceBackend>,
    },
    /// Larger-context model. Filters its output and never fails.
    Secondary {
        system_prompt: String,
        backend: Box<dyn InferenceBackend>,
    },
}

impl std::fmt::Debug for ModelAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAgent")
            .field("model", &self.model_id())
            .field("system_prompt_len", &self.system_prompt().len())
            .finish_non_exhaustive()
    }
}

impl ModelAgent {
    pub fn new(
        model: ModelId,
        system_prompt: impl Into<String>,
        backend: Box<dyn InferenceBackend>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        match model {
            ModelId::Phi4Mini => Self::Primary {
                system_prompt,
                backend,
            },
            ModelId::Qwen25Coder => Self::Secondary {
                system_prompt,
                backend,
            },
        }
    }

    pub fn model_id(&self) -> ModelId {
        match self {
            Self::Primary { .. } => ModelId::Phi4Mini,
            Self::Secondary { .. } => ModelId::Qwen25Coder,
        }
    }

    pub fn system_prompt(&self) -> &str {
        match self {
            Self::Primary { system_prompt, .. } | Self::Secondary { system_prompt, .. } => {
                system_prompt
            }
        }
    }

    pub fn sampling(&self) -> &'static SamplingParams {
        match self {
            Self::Primary { .. } => &SamplingParams::PRIMARY,
            Self::Secondary { .. } => &SamplingParams::SECONDARY,
        }
    }

    fn backend(&self) -> &dyn InferenceBackend {
        match self {
            Self::Primary { backend, .. } | Self::Secondary { backend, .. } => backend.as_ref(),
        }
    }

    /// The conversation sent for one generation. Built fresh per call.
    pub fn conversation(&self, instruction: &str) -> Vec<ChatTurn> {
        match self {
            Self::Primary { system_prompt, .. } => vec![
                ChatTurn::system(system_prompt.as_str()),
                ChatTurn::user(instruction),
            ],
            Self::Secondary { system_prompt, .. } => vec![
                ChatTurn::system(system_prompt.as_str()),
                ChatTurn::user(ONE_SHOT_REQUEST),
                ChatTurn::assistant(ONE_SHOT_REPLY),
                ChatTurn::user(instruction),
            ],
        }
    }

    /// Turn a natural-language instruction into one shell command.
    ///
    /// `Primary` fails with [`AppError::Inference`] when the model call fails or
    /// yields nothing. `Secondary` reports the failure and returns an empty
    /// string, which callers must treat as "no command produced".
    pub async fn generate(&self, instruction: &str) -> Result<String> {
        let prompt = format_chat(&self.conversation(instruction));
        debug!(model = %self.model_id(), prompt_len = prompt.len(), "requesting completion");
        let completion = self.backend().complete(&prompt, self.sampling()).await;

        match self {
            Self::Primary { .. } => {
                let raw = completion.map_err(|e| AppError::Inference(format!("{e:#}")))?;
                let reply = raw.trim();
                if reply.is_empty() {
                    return Err(AppError::Inference("model returned no output".into()).into());
                }
                Ok(reply.to_string())
            }
            Self::Secondary { .. } => match completion {
                Ok(raw) => Ok(sanitize_command(&raw)),
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "secondary model inference failed");
                    eprintln!("⚠️  Model error: {e:#}");
                    Ok(String::new())
                }
            },
        }
    }
}

/// Reduce raw model output to a single suggested command.
///
/// Keeps the first line, strips end-of-turn markers, and swaps anything
/// containing redirection-like fragments for [`FALLBACK_COMMAND`].
pub fn sanitize_command(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("").trim();
    let command = first_line.replace(END_OF_TURN, "");
    let command = command.trim();

    if REJECTED_FRAGMENTS.iter().any(|frag| command.contains(frag)) {
        debug!(rejected = command, "model output rejected, using fallback command");
        return FALLBACK_COMMAND.to_string();
    }
    command.to_string()
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
