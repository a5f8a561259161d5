//! Single raw keypress input.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Source of one keypress at a time, read without waiting for Enter.
pub trait KeySource {
    /// Block until a key is pressed and return it. Keys without a character
    /// representation come back as `'\0'`.
    fn read_key(&mut self) -> Result<char>;
}

/// Reads keys from the controlling terminal in raw mode.
#[derive(Debug, Default)]
pub struct RawTerminal;

impl RawTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for RawTerminal {
    fn read_key(&mut self) -> Result<char> {
        let _raw = RawModeGuard::enable()?;
        loop {
            // Windows reports press and release separately; only presses count.
            if let Event::Key(key) = event::read().context("Failed to read keypress")? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key_char(&key));
                }
            }
        }
    }
}

fn key_char(key: &KeyEvent) -> char {
    match key.code {
        // Ctrl+C and friends must never be mistaken for a menu choice.
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => '\0',
        KeyCode::Char(c) => c,
        KeyCode::Enter => '\r',
        KeyCode::Tab => '\t',
        KeyCode::Esc => '\u{1b}',
        _ => '\0',
    }
}

/// Keeps the terminal in raw mode until dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("failed to restore terminal mode: {e}");
        }
    }
}
