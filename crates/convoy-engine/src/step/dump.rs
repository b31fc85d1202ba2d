//! Database dump step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{slugify, Step, StepContext};
use async_trait::async_trait;
use db_tools::Database;
use ssh_tunnel::shell_escape;
use std::fs::File;
use std::path::PathBuf;

/// Dumps a database from the environment's first host into a local file
pub struct DumpDatabase {
    database: Database,
    target_file: PathBuf,
}

impl DumpDatabase {
    /// Create a dump step writing to the given local file
    pub fn new(database: Database, target_file: impl Into<PathBuf>) -> Self {
        Self {
            database,
            target_file: target_file.into(),
        }
    }
}

#[async_trait]
impl Step for DumpDatabase {
    fn name(&self) -> String {
        format!("dump-{}-database", slugify(self.database.name()))
    }

    fn supports_dry_run(&self) -> bool {
        // Dry run reports the command without touching the remote side
        true
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let host = ctx.environment.first_host().ok_or_else(|| {
            StepError::Precondition(format!(
                "environment {} has no hosts",
                ctx.environment.name()
            ))
        })?;

        if ctx.dry_run {
            let tunnel = ctx.environment.ssh_tunnel_to(host);
            let command = tunnel.assemble_ssh_command(&self.database.dump_command(), &[]);
            return Ok(StepResult::success(self.name(), "dry run")
                .with_output(vec![format!("would run: {}", command)]));
        }

        if File::create(&self.target_file).is_err() {
            return Err(StepError::Precondition(format!(
                "Could not write dump file at: {}",
                self.target_file.display()
            )));
        }

        let mut tunnel = ctx.environment.ssh_tunnel_to(host);
        let outcome = match tunnel.set_up() {
            Ok(_) => {
                let command = format!(
                    "{} > {}",
                    tunnel.assemble_ssh_command(&self.database.dump_command(), &[]),
                    shell_escape(&self.target_file.to_string_lossy())
                );
                run_shell_command(&command, None).await
            }
            Err(e) => Err(e.into()),
        };
        tunnel.tear_down();

        let output = outcome?;

        let result = if output.success() {
            StepResult::success(
                self.name(),
                format!(
                    "Dumped {} from {} to {}.",
                    self.database.name(),
                    ctx.environment.name(),
                    self.target_file.display()
                ),
            )
        } else {
            StepResult::failure(
                self.name(),
                format!(
                    "dump of {} exited with status {}",
                    self.database.name(),
                    output.exit_code.unwrap_or(-1)
                ),
            )
        };

        Ok(result.with_output(output.lines).with_exit_code(output.exit_code))
    }
}
