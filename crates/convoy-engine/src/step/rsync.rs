//! Directory synchronization step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{hosts_in_scope, Direction, HostScope, Step, StepContext};
use async_trait::async_trait;
use ssh_tunnel::shell_escape;
use std::path::PathBuf;

/// Synchronizes a directory tree between the local machine and a host
///
/// Supports dry-run natively through rsync's own no-op mode, so no
/// caller-supplied alternate is needed.
pub struct SyncDirectory {
    name: Option<String>,
    local_path: PathBuf,
    remote_path: String,
    direction: Direction,
    delete: bool,
    includes: Vec<String>,
    excludes: Vec<String>,
    scope: HostScope,
    environment: Option<String>,
}

impl SyncDirectory {
    /// Create a sync step pushing `local_path` to `remote_path`
    pub fn up(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self::new(local_path, remote_path, Direction::Up)
    }

    /// Create a sync step pulling `remote_path` into `local_path`
    pub fn down(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self::new(local_path, remote_path, Direction::Down)
    }

    fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: None,
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            direction,
            delete: false,
            includes: Vec::new(),
            excludes: Vec::new(),
            scope: HostScope::FirstOnly,
            environment: None,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Delete extraneous files on the receiving side
    pub fn with_delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Include paths matching the given pattern ahead of any excludes
    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Exclude paths matching the given pattern
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Sync with every host of the environment
    pub fn on_all_hosts(mut self) -> Self {
        self.scope = HostScope::All;
        self
    }

    /// Limit this step to one named environment
    pub fn only_in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    fn assemble(&self, tunnel: &ssh_tunnel::SshTunnel, dry_run: bool) -> String {
        let mut parts = vec!["rsync".to_string(), "-az".to_string()];

        if dry_run {
            parts.push("--dry-run".to_string());
            parts.push("--verbose".to_string());
        }

        if self.delete {
            parts.push("--delete".to_string());
        }

        // rsync applies the first matching filter, so includes go first
        for pattern in &self.includes {
            parts.push(format!("--include={}", shell_escape(pattern)));
        }

        for pattern in &self.excludes {
            parts.push(format!("--exclude={}", shell_escape(pattern)));
        }

        parts.push("-e".to_string());
        parts.push(shell_escape(&tunnel.ssh_transport()));

        let local = shell_escape(&self.local_path.to_string_lossy());
        let remote = shell_escape(&tunnel.remote_target(&self.remote_path));

        match self.direction {
            Direction::Up => {
                parts.push(local);
                parts.push(remote);
            }
            Direction::Down => {
                parts.push(remote);
                parts.push(local);
            }
        }

        parts.join(" ")
    }
}

#[async_trait]
impl Step for SyncDirectory {
    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "rsync".to_string())
    }

    fn supports_dry_run(&self) -> bool {
        true
    }

    fn restricted_to_environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let hosts = hosts_in_scope(ctx.environment, self.scope)?;
        let mut collected = Vec::new();

        for host in hosts {
            let mut tunnel = ctx.environment.ssh_tunnel_to(host);
            let outcome = match tunnel.set_up() {
                Ok(_) => {
                    let command = self.assemble(&tunnel, ctx.dry_run);
                    run_shell_command(&command, None).await
                }
                Err(e) => Err(e.into()),
            };
            tunnel.tear_down();

            let output = outcome?;
            let succeeded = output.success();
            let exit_code = output.exit_code;
            collected.extend(output.lines);

            if !succeeded {
                return Ok(StepResult::failure(
                    self.name(),
                    format!(
                        "rsync failed on {} with status {}",
                        host.hostname(),
                        exit_code.unwrap_or(-1)
                    ),
                )
                .with_output(collected)
                .with_exit_code(exit_code));
            }
        }

        let message = if ctx.dry_run {
            "rsync dry run completed"
        } else {
            "sync completed"
        };

        Ok(StepResult::success(self.name(), message)
            .with_output(collected)
            .with_exit_code(Some(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssh_tunnel::{Host, PortAllocator};
    use std::sync::Arc;

    #[test]
    fn test_assemble_up() {
        let host = Host::new("web1.example.com").with_user("deploy");
        let tunnel = host.ssh_tunnel(Arc::new(PortAllocator::default()));

        let step = SyncDirectory::up("./public", "/var/www/app")
            .with_delete()
            .with_exclude(".git");

        let command = step.assemble(&tunnel, false);
        assert_eq!(
            command,
            "rsync -az --delete --exclude=.git -e ssh ./public deploy@web1.example.com:/var/www/app"
        );
    }

    #[test]
    fn test_assemble_down_with_dry_run() {
        let host = Host::new("web1.example.com").with_user("deploy");
        let tunnel = host.ssh_tunnel(Arc::new(PortAllocator::default()));

        let step = SyncDirectory::down("./backups", "/var/backups");
        let command = step.assemble(&tunnel, true);

        assert!(command.contains("--dry-run"));
        assert!(command.starts_with("rsync -az"));
        assert!(command.ends_with("deploy@web1.example.com:/var/backups ./backups"));
    }

    #[test]
    fn test_supports_dry_run_natively() {
        let step = SyncDirectory::up("a", "b");
        assert!(step.supports_dry_run());
    }
}
