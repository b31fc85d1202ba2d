//! Local subprocess execution with output capture

use crate::error::StepError;
use async_process::{Command, Stdio};
use std::path::Path;
use tracing::debug;

/// Captured outcome of a subprocess
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Captured output lines, stdout followed by stderr
    pub lines: Vec<String>,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run a command line through `sh -c`, blocking until it completes
///
/// The engine provides no timeout: a hung command hangs the whole script.
pub async fn run_shell_command(
    command: &str,
    working_dir: Option<&Path>,
) -> Result<CommandOutput, StepError> {
    debug!(command, "running shell command");

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| StepError::Spawn(e.to_string()))?;

    let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    lines.extend(
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string),
    );

    Ok(CommandOutput {
        lines,
        exit_code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_output_and_exit_code() {
        futures::executor::block_on(async {
            let output = run_shell_command("echo out; echo err >&2", None)
                .await
                .unwrap();

            assert!(output.success());
            assert_eq!(output.lines, vec!["out", "err"]);
        });
    }

    #[test]
    fn test_nonzero_exit_code() {
        futures::executor::block_on(async {
            let output = run_shell_command("exit 42", None).await.unwrap();

            assert!(!output.success());
            assert_eq!(output.exit_code, Some(42));
        });
    }

    #[test]
    fn test_working_directory() {
        futures::executor::block_on(async {
            let output = run_shell_command("pwd", Some(Path::new("/tmp"))).await.unwrap();
            assert_eq!(output.lines, vec!["/tmp"]);
        });
    }
}
