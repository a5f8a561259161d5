use super::*;
use codex_core::OutcomeKind;

struct FixedKey(char);

impl KeySource for FixedKey {
    fn read_key(&mut self) -> Result<char> {
        Ok(self.0)
    }
}

struct BrokenTerminal;

impl KeySource for BrokenTerminal {
    fn read_key(&mut self) -> Result<char> {
        anyhow::bail!("not a terminal")
    }
}

#[derive(Default)]
struct RecordingClipboard {
    copied: Vec<String>,
}

impl ClipboardSink for &mut RecordingClipboard {
    fn copy(&mut self, text: &str) {
        self.copied.push(text.to_string());
    }
}

async fn present_with(
    key: char,
    command: &str,
    clipboard: &mut RecordingClipboard,
) -> (ExecutionOutcome, String) {
    let mut controller =
        ExecutionController::new(FixedKey(key), clipboard, Vec::<u8>::new()).with_width(40);
    let outcome = controller.present(command).await.expect("present should succeed");
    let output = String::from_utf8(controller.into_output()).expect("output should be UTF-8");
    (outcome, output)
}

#[test]
fn test_banner_is_centred() {
    assert_eq!(banner("Options", 21), "====== Options ======");
    assert_eq!(banner("Too long for the line", 4), " Too long for the line ");
}

#[test]
fn test_timestamp_format() {
    let stamp = timestamp("Finished at ");
    assert!(stamp.starts_with("Finished at ["));
    assert_eq!(stamp.len(), "Finished at [HH:MM:SS]".len());
}

#[tokio::test]
async fn test_menu_is_shown_before_choice() {
    let mut clipboard = RecordingClipboard::default();
    let (_, output) = present_with('a', "ls -la", &mut clipboard).await;
    assert!(output.contains("Command Found"));
    assert!(output.contains("ls -la"));
    assert!(output.contains("Execute command"));
    assert!(output.contains("Copy to clipboard"));
    assert!(output.contains("Press key:"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_success() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, output) = present_with('e', "echo hello", &mut clipboard).await;
    assert_eq!(outcome.kind, OutcomeKind::Completed);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(!outcome.permission_denied);
    assert!(output.contains("Running: echo hello"));
    assert!(output.contains("hello"));
    assert!(output.contains("✓ Command completed successfully"));
    assert!(output.contains("Finished at ["));
    assert!(clipboard.copied.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_uppercase_key() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, _) = present_with('E', "true", &mut clipboard).await;
    assert_eq!(outcome.kind, OutcomeKind::Completed);
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_failure_reports_exit_code() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, output) = present_with('e', "exit 3", &mut clipboard).await;
    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(outcome.exit_code, Some(3));
    assert!(output.contains("with exit code 3"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_permission_denied_gives_guidance() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, output) = present_with(
        'e',
        "echo 'cat: /root/secret: Permission denied' >&2; exit 1",
        &mut clipboard,
    )
    .await;
    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(outcome.exit_code, Some(1));
    assert!(outcome.permission_denied);
    assert!(output.contains("permission issues"));
    assert!(output.contains("Using sudo"));
    assert!(output.contains("Checking file/directory permissions"));
    assert!(output.contains("directory you have access to"));
}

#[tokio::test]
async fn test_spawn_failure_is_failed_without_exit_code() {
    let mut clipboard = RecordingClipboard::default();
    let mut controller = ExecutionController::new(FixedKey('e'), &mut clipboard, Vec::<u8>::new())
        .with_shell(ShellSpec::new("no-such-shell-for-open-codex", &[]));
    let outcome = controller.present("ls").await.expect("spawn failure is an outcome, not an error");
    assert_eq!(outcome, ExecutionOutcome::spawn_failed());
    let output = String::from_utf8(controller.into_output()).expect("output should be UTF-8");
    assert!(output.contains("✗ Error executing command"));
}

#[tokio::test]
async fn test_copy_forwards_literal_command() {
    let mut clipboard = RecordingClipboard::default();
    let command = "find . -name \"*.py\" | wc -l";
    let (outcome, output) = present_with('c', command, &mut clipboard).await;
    assert_eq!(outcome, ExecutionOutcome::copied());
    assert_eq!(clipboard.copied, vec![command.to_string()]);
    assert!(output.contains("✓ Command copied to clipboard!"));
}

#[tokio::test]
async fn test_abort_has_no_side_effect() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, output) = present_with('a', "rm -rf build", &mut clipboard).await;
    assert_eq!(outcome, ExecutionOutcome::aborted());
    assert!(clipboard.copied.is_empty());
    assert!(output.contains("Operation aborted."));
    assert!(!output.contains("Running:"));
}

#[tokio::test]
async fn test_unknown_key_is_benign() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, output) = present_with('x', "ls", &mut clipboard).await;
    assert_eq!(outcome, ExecutionOutcome::unknown_choice());
    assert!(clipboard.copied.is_empty());
    assert!(output.contains("Unknown choice. Nothing happened."));
}

#[tokio::test]
async fn test_non_character_key_is_unknown_choice() {
    let mut clipboard = RecordingClipboard::default();
    let (outcome, _) = present_with('\0', "ls", &mut clipboard).await;
    assert_eq!(outcome.kind, OutcomeKind::UnknownChoice);
}

#[tokio::test]
async fn test_keypress_failure_is_an_error() {
    let mut clipboard = RecordingClipboard::default();
    let mut controller = ExecutionController::new(BrokenTerminal, &mut clipboard, Vec::<u8>::new());
    let err = controller.present("ls").await.unwrap_err();
    assert!(err.to_string().contains("not a terminal"));
}

#[tokio::test]
async fn test_report_error_prints_single_error_line() {
    let mut clipboard = RecordingClipboard::default();
    let mut controller = ExecutionController::new(FixedKey('e'), &mut clipboard, Vec::<u8>::new());
    controller
        .report_error("no command generated")
        .expect("writing to a Vec should not fail");
    let output = String::from_utf8(controller.into_output()).expect("output should be UTF-8");
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains("Error: no command generated"));
    assert!(!output.contains("Press key:"));
}

#[test]
fn test_announce_writes_line() {
    let mut clipboard = RecordingClipboard::default();
    let mut controller = ExecutionController::new(FixedKey('e'), &mut clipboard, Vec::<u8>::new());
    controller
        .announce("Using model: phi-4-mini")
        .expect("writing to a Vec should not fail");
    let output = String::from_utf8(controller.into_output()).expect("output should be UTF-8");
    assert!(output.contains("Using model: phi-4-mini"));
}
