//! Remote SSH command step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{hosts_in_scope, slugify, HostScope, Step, StepContext};
use async_trait::async_trait;

/// Runs a command on the environment's hosts over SSH
///
/// Acquires a tunnel per host, lets the tunnel compose the final `ssh`
/// invocation, and tears the tunnel down whatever the outcome. Succeeds iff
/// the remote command exits 0 on every host in scope.
pub struct SshCommand {
    name: Option<String>,
    command: String,
    scope: HostScope,
    environment: Option<String>,
}

impl SshCommand {
    /// Create a step running the given command on the default host
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            command: command.into(),
            scope: HostScope::FirstOnly,
            environment: None,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run on every host of the environment instead of only the first
    pub fn on_all_hosts(mut self) -> Self {
        self.scope = HostScope::All;
        self
    }

    /// Limit this step to one named environment
    pub fn only_in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

#[async_trait]
impl Step for SshCommand {
    fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        let program = self
            .command
            .split_whitespace()
            .next()
            .map(|p| p.rsplit('/').next().unwrap_or(p))
            .unwrap_or("command");
        format!("ssh-{}", slugify(program))
    }

    fn restricted_to_environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let hosts = hosts_in_scope(ctx.environment, self.scope)?;
        let multiple = hosts.len() > 1;
        let mut collected = Vec::new();

        for host in hosts {
            let mut tunnel = ctx.environment.ssh_tunnel_to(host);
            let outcome = match tunnel.set_up() {
                Ok(_) => {
                    let assembled = tunnel.assemble_ssh_command(&self.command, &[]);
                    run_shell_command(&assembled, None).await
                }
                Err(e) => Err(e.into()),
            };
            tunnel.tear_down();

            let output = outcome?;
            let succeeded = output.success();
            let exit_code = output.exit_code;

            if multiple {
                collected.extend(
                    output
                        .lines
                        .iter()
                        .map(|line| format!("[{}] {}", host.hostname(), line)),
                );
            } else {
                collected.extend(output.lines);
            }

            if !succeeded {
                let message = match exit_code {
                    Some(code) => format!("failed on {} with status {}", host.hostname(), code),
                    None => format!("terminated by signal on {}", host.hostname()),
                };
                return Ok(StepResult::failure(self.name(), message)
                    .with_output(collected)
                    .with_exit_code(exit_code));
            }
        }

        Ok(StepResult::success(self.name(), "exited with status 0 on all hosts")
            .with_output(collected)
            .with_exit_code(Some(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        let step = SshCommand::new("sudo service php-fpm reload");
        assert_eq!(step.name(), "ssh-sudo");
    }

    #[test]
    fn test_environment_restriction() {
        let step = SshCommand::new("true").only_in_environment("staging");
        assert_eq!(step.restricted_to_environment(), Some("staging"));
    }
}
