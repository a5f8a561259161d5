//! System clipboard access through the platform's copy utilities.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Destination for "copy to clipboard". Never fails observably: problems are
/// logged and otherwise ignored.
pub trait ClipboardSink {
    fn copy(&mut self, text: &str);
}

/// Copy utilities in preference order, with the arguments that make them read
/// the new clipboard contents from stdin.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("clip", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

#[derive(Debug, Clone)]
pub struct SystemClipboard {
    tool: Option<(PathBuf, &'static [&'static str])>,
}

impl SystemClipboard {
    /// Use the first copy utility found on `PATH`.
    pub fn detect() -> Self {
        let tool = CLIPBOARD_TOOLS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|path| (path, *args))
        });
        match &tool {
            Some((path, _)) => debug!(tool = %path.display(), "clipboard tool found"),
            None => debug!("no clipboard tool found"),
        }
        Self { tool }
    }

    fn try_copy(&self, text: &str) -> std::io::Result<()> {
        let Some((path, args)) = &self.tool else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no clipboard utility on PATH",
            ));
        };
        let mut child = Command::new(path)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "{} exited with {status}",
                path.display()
            )));
        }
        Ok(())
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) {
        if let Err(e) = self.try_copy(text) {
            warn!("clipboard copy failed: {e}");
        }
    }
}
