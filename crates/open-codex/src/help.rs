//! Usage screen printed for `--help` or an empty prompt.

use codex_core::ModelId;
use crossterm::style::Stylize;

pub fn help_text() -> String {
    let mut lines = vec![
        "=== Open Codex - Natural Language to CLI commands ==="
            .blue()
            .to_string(),
        "Usage examples:".blue().to_string(),
        "open-codex \"list all files in current directory\""
            .green()
            .to_string(),
        "open-codex --model qwen-2.5-coder --hf-token YOUR_TOKEN \"find python files\""
            .green()
            .to_string(),
        "open-codex \"create a tarball of the src directory\""
            .green()
            .to_string(),
        String::new(),
        "Available models:".blue().to_string(),
    ];

    for model in ModelId::ALL {
        let note = match model {
            ModelId::Phi4Mini => " (default)",
            ModelId::Qwen25Coder => " (requires Hugging Face authentication)",
        };
        lines.push(format!("  - {}{note}", model.as_str()).green().to_string());
    }

    lines.extend([
        String::new(),
        "Authentication:".blue().to_string(),
        "For Qwen 2.5 Coder, you can provide your Hugging Face token:"
            .green()
            .to_string(),
        "1. Via environment variable: export HUGGINGFACE_TOKEN=your_token"
            .green()
            .to_string(),
        "2. Via command line: --hf-token your_token".green().to_string(),
        String::new(),
        "Options:".blue().to_string(),
        "  --model <MODEL>     model to use".to_string(),
        "  --hf-token <TOKEN>  Hugging Face token (alias: --credential)".to_string(),
        "  --config <PATH>     config file override".to_string(),
        String::new(),
    ]);
    lines.join("\n")
}

pub fn print_help() {
    println!("{}", help_text());
}
