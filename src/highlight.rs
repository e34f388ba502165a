//! External syntax highlighting.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

const FILE_PLACEHOLDER: &str = "%FILE%";

/// Quote `path` for a POSIX shell.
fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

/// Run `command` for `path` and return its stdout if it succeeded with
/// non-empty, valid UTF-8 output.
pub fn run_highlighter(command: &str, path: &Path) -> Option<String> {
    let line = command.replace(FILE_PLACEHOLDER, &shell_quote(&path.to_string_lossy()));
    let output = match Command::new("sh").arg("-c").arg(&line).output() {
        Ok(output) => output,
        Err(e) => {
            warn!(command = %line, error = %e, "could not run highlighter");
            return None;
        }
    };
    if !output.status.success() || output.stdout.is_empty() {
        debug!(command = %line, status = %output.status, "highlighter failed");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Highlighted text of `path` from the first working command, or `raw`.
pub fn highlight(commands: &[String], path: &Path, raw: &str) -> String {
    commands
        .iter()
        .find_map(|c| run_highlighter(c, path))
        .unwrap_or_else(|| raw.to_string())
}
