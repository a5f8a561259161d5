//! The confirmation prompt shown for a generated command and the action it
//! triggers.

use anyhow::{Context, Result};
use codex_core::{Choice, ExecutionOutcome};
use crossterm::style::Stylize;
use std::io::Write;
use tracing::info;

use crate::clipboard::ClipboardSink;
use crate::keypress::KeySource;
use crate::stream::{ShellSpec, StreamLine, stream_command};

const FALLBACK_TERMINAL_WIDTH: usize = 80;

/// Presents one command, waits for a single key, and carries out the choice.
///
/// Every path through [`present`](Self::present) ends in exactly one
/// [`ExecutionOutcome`]; nothing is retried.
pub struct ExecutionController<K, C, W> {
    keys: K,
    clipboard: C,
    out: W,
    shell: ShellSpec,
    width: usize,
}

impl<K: KeySource, C: ClipboardSink, W: Write> ExecutionController<K, C, W> {
    pub fn new(keys: K, clipboard: C, out: W) -> Self {
        Self {
            keys,
            clipboard,
            out,
            shell: ShellSpec::system(),
            width: terminal_width(),
        }
    }

    pub fn with_shell(mut self, shell: ShellSpec) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Print an informational line, such as the model in use.
    pub fn announce(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text.blue())?;
        self.out.flush()?;
        Ok(())
    }

    /// Print a single `Error:` line in place of the option menu.
    pub fn report_error(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", format!("Error: {message}").red())?;
        self.out.flush()?;
        Ok(())
    }

    /// Show `command` with the option menu and act on the key pressed.
    ///
    /// Errors only come from the terminal itself (reading the key or writing
    /// output); a command that fails to run is a `Failed` outcome.
    pub async fn present(&mut self, command: &str) -> Result<ExecutionOutcome> {
        writeln!(self.out, "{}", banner("Command Found", self.width).blue())?;
        writeln!(self.out, "{}", command.green().bold())?;
        writeln!(self.out, "{}", banner("Options", self.width).blue())?;
        writeln!(self.out, "{}", "What would you like to do?".blue())?;
        writeln!(self.out, "{} Execute command", "[e]".bold())?;
        writeln!(self.out, "{} Copy to clipboard", "[c]".bold())?;
        writeln!(self.out, "{} Abort", "[a]".bold())?;
        write!(self.out, "\n{}", "Press key: ".blue())?;
        self.out.flush()?;

        let key = self.keys.read_key()?;
        writeln!(self.out)?;
        let choice = Choice::from_key(key);
        info!(?choice, "user decision");

        let outcome = match choice {
            Choice::Execute => self.execute(command).await?,
            Choice::Copy => {
                self.clipboard.copy(command);
                writeln!(self.out, "{}", "✓ Command copied to clipboard!".green())?;
                ExecutionOutcome::copied()
            }
            Choice::Abort => {
                writeln!(self.out, "{}", "Operation aborted.".blue())?;
                ExecutionOutcome::aborted()
            }
            Choice::Unrecognized(_) => {
                writeln!(self.out, "{}", "Unknown choice. Nothing happened.".red())?;
                ExecutionOutcome::unknown_choice()
            }
        };
        self.out.flush()?;
        info!(kind = ?outcome.kind, exit_code = ?outcome.exit_code, "command cycle finished");
        Ok(outcome)
    }

    async fn execute(&mut self, command: &str) -> Result<ExecutionOutcome> {
        writeln!(self.out, "{}", banner("Executing Command", self.width).blue())?;
        writeln!(self.out, "{}", timestamp("").yellow())?;
        writeln!(self.out, "{}\n", format!("Running: {command}").blue())?;
        self.out.flush()?;

        let out = &mut self.out;
        let mut write_error = None;
        let result = stream_command(&self.shell, command, |line| {
            let written = match &line {
                StreamLine::Stdout(text) => writeln!(out, "{}", text.as_str().green()),
                StreamLine::Stderr(text) => writeln!(out, "{}", text.as_str().red()),
            }
            .and_then(|()| out.flush());
            if let Err(e) = written {
                write_error.get_or_insert(e);
            }
        })
        .await;
        if let Some(e) = write_error {
            return Err(e).context("Failed to write command output");
        }

        let outcome = match result {
            Ok(report) => {
                let outcome = ExecutionOutcome::from_exit(report.exit_code, report.permission_denied);
                if report.exit_code == 0 {
                    writeln!(self.out, "\n{}", "✓ Command completed successfully".green())?;
                } else if report.permission_denied {
                    let message = "✗ Command failed due to permission issues. Try:\n  \
                                   1. Using sudo (if appropriate)\n  \
                                   2. Checking file/directory permissions\n  \
                                   3. Running from a directory you have access to";
                    writeln!(self.out, "\n{}", message.red())?;
                } else {
                    let message = format!("✗ Command failed with exit code {}", report.exit_code);
                    writeln!(self.out, "\n{}", message.red())?;
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("command execution failed: {e:#}");
                writeln!(self.out, "\n{}", format!("✗ {e}").red())?;
                ExecutionOutcome::spawn_failed()
            }
        };

        writeln!(self.out, "{}", timestamp("Finished at ").yellow())?;
        Ok(outcome)
    }

    /// Consume the controller, returning its output writer.
    pub fn into_output(self) -> W {
        self.out
    }
}

/// `text` centred in a line of `=` as wide as the terminal.
fn banner(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.chars().count() + 2) / 2;
    let padding = "=".repeat(fill);
    format!("{padding} {text} {padding}")
}

fn timestamp(prefix: &str) -> String {
    format!("{prefix}[{}]", chrono::Local::now().format("%H:%M:%S"))
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .ok()
        .filter(|cols| *cols > 0)
        .unwrap_or(FALLBACK_TERMINAL_WIDTH)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
