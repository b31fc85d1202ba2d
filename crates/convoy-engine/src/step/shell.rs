//! Local shell command step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{slugify, Step, StepContext};
use async_trait::async_trait;
use std::path::PathBuf;

/// Runs a command string on the local machine
///
/// Succeeds iff the process exits 0. A caller-supplied dry-run alternate is
/// substituted when dry-run mode is active; without one the step does not
/// support dry-run and the engine skips it.
pub struct ShellCommand {
    name: Option<String>,
    command: String,
    dry_run_command: Option<String>,
    environment: Option<String>,
    working_dir: Option<PathBuf>,
}

impl ShellCommand {
    /// Create a step running the given command line
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            command: command.into(),
            dry_run_command: None,
            environment: None,
            working_dir: None,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Supply a non-destructive alternate command for dry-run mode
    pub fn with_dry_run_command(mut self, command: impl Into<String>) -> Self {
        self.dry_run_command = Some(command.into());
        self
    }

    /// Limit this step to one named environment
    pub fn only_in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the working directory for the command
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl Step for ShellCommand {
    fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        // Default to the program being run, e.g. "shell-composer"
        let program = self
            .command
            .split_whitespace()
            .next()
            .map(|p| p.rsplit('/').next().unwrap_or(p))
            .unwrap_or("command");
        format!("shell-{}", slugify(program))
    }

    fn supports_dry_run(&self) -> bool {
        self.dry_run_command.is_some()
    }

    fn restricted_to_environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let command = match (&self.dry_run_command, ctx.dry_run) {
            (Some(alternate), true) => alternate,
            _ => &self.command,
        };

        let output = run_shell_command(command, self.working_dir.as_deref()).await?;

        let result = if output.success() {
            StepResult::success(self.name(), "exited with status 0")
        } else {
            let message = match output.exit_code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            };
            StepResult::failure(self.name(), message)
        };

        Ok(result.with_output(output.lines).with_exit_code(output.exit_code))
    }
}
