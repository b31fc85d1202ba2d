//! Single-file copy step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{hosts_in_scope, Direction, HostScope, Step, StepContext};
use async_trait::async_trait;
use ssh_tunnel::shell_escape;
use std::path::PathBuf;

/// Copies a single file (or, when recursive, a directory tree) over scp
pub struct CopyFile {
    name: Option<String>,
    local_path: PathBuf,
    remote_path: String,
    direction: Direction,
    recursive: bool,
    scope: HostScope,
    environment: Option<String>,
}

impl CopyFile {
    /// Create a copy step pushing `local_path` to `remote_path`
    pub fn up(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self::new(local_path, remote_path, Direction::Up)
    }

    /// Create a copy step pulling `remote_path` into `local_path`
    pub fn down(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self::new(local_path, remote_path, Direction::Down)
    }

    fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: None,
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            direction,
            recursive: false,
            scope: HostScope::FirstOnly,
            environment: None,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Copy a directory tree instead of a single file
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Copy to/from every host of the environment
    pub fn on_all_hosts(mut self) -> Self {
        self.scope = HostScope::All;
        self
    }

    /// Limit this step to one named environment
    pub fn only_in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    fn assemble(&self, tunnel: &ssh_tunnel::SshTunnel) -> String {
        let mut parts = vec!["scp".to_string()];

        parts.extend(tunnel.scp_args());

        if self.recursive {
            parts.push("-r".to_string());
        }

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
impl Step for CopyFile {
    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "scp".to_string())
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
                Ok(_) => run_shell_command(&self.assemble(&tunnel), None).await,
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
                        "scp failed on {} with status {}",
                        host.hostname(),
                        exit_code.unwrap_or(-1)
                    ),
                )
                .with_output(collected)
                .with_exit_code(exit_code));
            }
        }

        Ok(StepResult::success(self.name(), "copy completed")
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
        let host = Host::new("web1.example.com").with_user("deploy").with_port(2222);
        let tunnel = host.ssh_tunnel(Arc::new(PortAllocator::default()));

        let step = CopyFile::up("./dump.sql", "/tmp/dump.sql");
        assert_eq!(
            step.assemble(&tunnel),
            "scp -P 2222 ./dump.sql deploy@web1.example.com:/tmp/dump.sql"
        );
    }

    #[test]
    fn test_assemble_recursive_down() {
        let host = Host::new("web1.example.com").with_user("deploy");
        let tunnel = host.ssh_tunnel(Arc::new(PortAllocator::default()));

        let step = CopyFile::down("./logs", "/var/log/app").recursive();
        assert_eq!(
            step.assemble(&tunnel),
            "scp -r deploy@web1.example.com:/var/log/app ./logs"
        );
    }
}
