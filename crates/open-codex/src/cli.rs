use clap::Parser;
use std::path::PathBuf;

/// Built-in `--help` is disabled: help goes through [`crate::help`] and exits 1,
/// the same as an empty prompt.
#[derive(Parser, Debug)]
#[command(name = "open-codex")]
#[command(about = "Open Codex - Natural Language to CLI commands")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// What you want to do, in plain words
    pub prompt: Vec<String>,

    /// Model to use (phi-4-mini, qwen-2.5-coder); defaults to the configured model
    #[arg(long)]
    pub model: Option<String>,

    /// Hugging Face token for gated model downloads (falls back to HUGGINGFACE_TOKEN)
    #[arg(long = "hf-token", visible_alias = "credential", value_name = "TOKEN")]
    pub hf_token: Option<String>,

    /// Config file to use instead of ~/.config/open-codex/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show usage examples
    #[arg(short = 'h', long = "help")]
    pub help: bool,
}

impl Cli {
    /// The positional words joined with single spaces.
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ").trim().to_string()
    }

    /// True when there is nothing to translate and help should be shown instead.
    pub fn wants_help(&self) -> bool {
        let prompt = self.prompt_text();
        self.help || prompt.is_empty() || prompt == "--help"
    }
}
