use crate::error::AppError;

/// Locally hosted model selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// Fast, minimal-context model (default).
    Phi4Mini,
    /// Larger-context coder model; its weights may require a Hugging Face token.
    Qwen25Coder,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::Phi4Mini, ModelId::Qwen25Coder];

    /// Returns the CLI-facing name for this model
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phi4Mini => "phi-4-mini",
            Self::Qwen25Coder => "qwen-2.5-coder",
        }
    }

    /// Human-readable name used in progress messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Phi4Mini => "Phi-4-mini",
            Self::Qwen25Coder => "Qwen",
        }
    }
}

impl std::str::FromStr for ModelId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phi-4-mini" => Ok(Self::Phi4Mini),
            "qwen-2.5-coder" => Ok(Self::Qwen25Coder),
            other => Err(AppError::UnsupportedModel(other.to_string())),
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of a conversation.
///
/// Fields are private so a turn cannot change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    role: ChatRole,
    content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Decision taken at the confirmation prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Execute,
    Copy,
    Abort,
    Unrecognized(char),
}

impl Choice {
    /// Interpret a single raw keypress, case-insensitively.
    pub fn from_key(key: char) -> Self {
        match key.to_ascii_lowercase() {
            'e' => Self::Execute,
            'c' => Self::Copy,
            'a' => Self::Abort,
            _ => Self::Unrecognized(key),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    Completed,
    Failed,
    Copied,
    Aborted,
    UnknownChoice,
}

/// Terminal result of one confirmation cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub kind: OutcomeKind,
    pub exit_code: Option<i32>,
    pub permission_denied: bool,
}

impl ExecutionOutcome {
    /// Outcome of a finished process: `Completed` on zero exit, `Failed` otherwise.
    pub fn from_exit(exit_code: i32, permission_denied: bool) -> Self {
        let kind = if exit_code == 0 {
            OutcomeKind::Completed
        } else {
            OutcomeKind::Failed
        };
        Self {
            kind,
            exit_code: Some(exit_code),
            permission_denied,
        }
    }

    /// The process could not be spawned or its output could not be read.
    pub fn spawn_failed() -> Self {
        Self::without_exit(OutcomeKind::Failed)
    }

    pub fn copied() -> Self {
        Self::without_exit(OutcomeKind::Copied)
    }

    pub fn aborted() -> Self {
        Self::without_exit(OutcomeKind::Aborted)
    }

    pub fn unknown_choice() -> Self {
        Self::without_exit(OutcomeKind::UnknownChoice)
    }

    fn without_exit(kind: OutcomeKind) -> Self {
        Self {
            kind,
            exit_code: None,
            permission_denied: false,
        }
    }
}
