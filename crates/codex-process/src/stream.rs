//! Running a shell command while streaming its output line by line.

use anyhow::Result;
use codex_core::AppError;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

const PERMISSION_DENIED_MARKER: &str = "Permission denied";
/// Output without a newline is emitted in chunks of at most this many bytes.
const MAX_LINE_BYTES: usize = 4096;

/// Shell used to interpret a generated command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `sh -c` on Unix, `cmd /C` on Windows.
    pub fn system() -> Self {
        if cfg!(windows) {
            Self::new("cmd", &["/C"])
        } else {
            Self::new("sh", &["-c"])
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(command);
        cmd
    }
}

impl Default for ShellSpec {
    fn default() -> Self {
        Self::system()
    }
}

/// One line of child output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    Stdout(String),
    Stderr(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    /// Exit code (1 if signal-killed).
    pub exit_code: i32,
    /// Some stderr line contained "Permission denied".
    pub permission_denied: bool,
}

/// Run `command` through `shell`, handing each output line to `on_line` as it
/// arrives.
///
/// Lines longer than 4096 bytes are split so unterminated output still shows
/// up promptly and memory stays bounded.
///
/// The child inherits the working directory and environment. Both pipes are
/// read to EOF before the exit status is collected, so output written just
/// before exit is never lost. Spawn and read failures surface as
/// [`AppError::SpawnOrStream`].
pub async fn stream_command<F>(
    shell: &ShellSpec,
    command: &str,
    mut on_line: F,
) -> Result<StreamReport>
where
    F: FnMut(StreamLine),
{
    let mut cmd = shell.command(command);
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    debug!(program = %shell.program, command, "spawning command");
    let mut child = cmd.spawn().map_err(stream_error)?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(AppError::SpawnOrStream("failed to capture child output".into()).into());
    };
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut permission_denied = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            result = read_line_capped(&mut stdout_reader, &mut stdout_buf), if !stdout_done => {
                let more = result.map_err(stream_error)?;
                if !stdout_buf.is_empty() {
                    on_line(StreamLine::Stdout(take_line(&mut stdout_buf)));
                }
                stdout_done = !more;
            }
            result = read_line_capped(&mut stderr_reader, &mut stderr_buf), if !stderr_done => {
                let more = result.map_err(stream_error)?;
                if !stderr_buf.is_empty() {
                    let line = take_line(&mut stderr_buf);
                    if line.contains(PERMISSION_DENIED_MARKER) {
                        permission_denied = true;
                    }
                    on_line(StreamLine::Stderr(line));
                }
                stderr_done = !more;
            }
        }
    }

    let status = child.wait().await.map_err(stream_error)?;
    let exit_code = status.code().unwrap_or_else(|| {
        warn!("Process terminated by signal, using exit code 1");
        1
    });
    debug!(exit_code, permission_denied, "command finished");

    Ok(StreamReport {
        exit_code,
        permission_denied,
    })
}

/// Append bytes to `buf` up to and including the next newline, stopping early
/// once `buf` holds [`MAX_LINE_BYTES`].
///
/// Returns `false` at EOF; `buf` may still hold an unterminated tail. Bytes
/// are consumed from the reader only after they are copied into `buf`, so a
/// call dropped by `select!` loses nothing.
async fn read_line_capped<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(false);
        }
        let room = MAX_LINE_BYTES.saturating_sub(buf.len());
        let window = &available[..available.len().min(room)];
        let (used, complete) = match window.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (window.len(), buf.len() + window.len() >= MAX_LINE_BYTES),
        };
        buf.extend_from_slice(&window[..used]);
        reader.consume(used);
        if complete {
            return Ok(true);
        }
    }
}

fn stream_error(err: std::io::Error) -> anyhow::Error {
    AppError::SpawnOrStream(err.to_string()).into()
}

/// Decode and clear `buf`, dropping the trailing newline (and CR, if any).
fn take_line(buf: &mut Vec<u8>) -> String {
    let line = {
        let text = String::from_utf8_lossy(buf);
        let trimmed = text.strip_suffix('\n').unwrap_or(&text);
        trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string()
    };
    buf.clear();
    line
}
