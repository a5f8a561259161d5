//! Shared types and error taxonomy for open-codex.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{ChatRole, ChatTurn, Choice, ExecutionOutcome, ModelId, OutcomeKind};
