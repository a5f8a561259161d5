//! Terminal interaction for a generated command: the confirmation keypress,
//! clipboard hand-off, and streamed execution through the system shell.

pub mod clipboard;
pub mod controller;
pub mod keypress;
pub mod stream;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use controller::ExecutionController;
pub use keypress::{KeySource, RawTerminal};
pub use stream::{ShellSpec, StreamLine, StreamReport, stream_command};
