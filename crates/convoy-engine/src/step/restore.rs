//! Database restore step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{slugify, Step, StepContext};
use async_trait::async_trait;
use db_tools::{filter_restore_output, Database, DbType};
use ssh_tunnel::shell_escape;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

/// Streams a local dump file into a database on the environment's first host
///
/// The dump file is treated as an opaque byte stream piped verbatim into
/// the engine's shell command. Success is decided by the shell command's
/// exit status; expected-benign restore noise is filtered from the reported
/// output but never affects the outcome.
pub struct RestoreDatabase {
    database: Database,
    dump_file: PathBuf,
}

impl RestoreDatabase {
    /// Create a restore step for the given database and dump file
    pub fn new(database: Database, dump_file: impl Into<PathBuf>) -> Self {
        Self {
            database,
            dump_file: dump_file.into(),
        }
    }

    /// The dump file this step reads
    pub fn dump_file(&self) -> &PathBuf {
        &self.dump_file
    }
}

#[async_trait]
impl Step for RestoreDatabase {
    fn name(&self) -> String {
        format!("restore-{}-database", slugify(self.database.name()))
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        // Readability is checked before any tunnel work so a bad path never
        // allocates a port.
        if File::open(&self.dump_file).is_err() {
            return Err(StepError::Precondition(format!(
                "Could not read dump file at: {}",
                self.dump_file.display()
            )));
        }

        let host = ctx.environment.first_host().ok_or_else(|| {
            StepError::Precondition(format!(
                "environment {} has no hosts",
                ctx.environment.name()
            ))
        })?;

        let mut tunnel = ctx.environment.ssh_tunnel_to(host);
        let outcome = match tunnel.set_up() {
            Ok(_) => {
                if ctx.environment.name() == "vagrant" && self.database.db_type() == DbType::Mysql {
                    raise_max_allowed_packet(&tunnel).await;
                }

                let shell = self.database.shell_command();
                let command = format!(
                    "{} < {} 2>&1",
                    tunnel.assemble_ssh_command(&shell, &[]),
                    shell_escape(&self.dump_file.to_string_lossy())
                );
                run_shell_command(&command, None).await
            }
            Err(e) => Err(e.into()),
        };
        tunnel.tear_down();

        let output = outcome?;
        let mut lines = filter_restore_output(self.database.db_type(), &output.lines);

        let result = if output.success() {
            lines.push(format!(
                "Successfully ran SQL file {} on {} in {}.",
                self.dump_file.display(),
                self.database.name(),
                ctx.environment.name()
            ));
            StepResult::success(
                self.name(),
                format!("restored {}", self.database.name()),
            )
        } else {
            StepResult::failure(
                self.name(),
                format!(
                    "restore of {} exited with status {}",
                    self.database.name(),
                    output.exit_code.unwrap_or(-1)
                ),
            )
        };

        Ok(result.with_output(lines).with_exit_code(output.exit_code))
    }
}

/// Large mysqldump statements overflow the stock `max_allowed_packet` in
/// the developer VM; raise it as root before restoring there.
async fn raise_max_allowed_packet(tunnel: &ssh_tunnel::SshTunnel) {
    let sql = "SET GLOBAL max_allowed_packet=104857600;";
    let command = tunnel.assemble_ssh_command(
        &format!("echo {} | mysql --user=root --password=delta", shell_escape(sql)),
        &[],
    );

    if let Ok(output) = run_shell_command(&command, None).await {
        if !output.success() {
            debug!("could not raise max_allowed_packet; continuing with restore");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_includes_database_slug() {
        let db = Database::new(DbType::Postgres, "app_production", "app", "pw");
        let step = RestoreDatabase::new(db, "/tmp/dump.sql");
        assert_eq!(step.name(), "restore-app-production-database");
    }
}
