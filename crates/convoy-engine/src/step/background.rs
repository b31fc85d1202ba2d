//! Background remote process step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::exec::run_shell_command;
use crate::step::{hosts_in_scope, slugify, HostScope, Step, StepContext};
use async_trait::async_trait;

/// Launches a long-running process on a remote host and returns immediately
///
/// The only ordering guarantee is launched-before-the-next-step: the engine
/// waits for the launch invocation, never for the remote process itself.
pub struct StartBackgroundProcess {
    name: Option<String>,
    command: String,
    scope: HostScope,
}

impl StartBackgroundProcess {
    /// Create a step launching the given command on the default host
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            command: command.into(),
            scope: HostScope::FirstOnly,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Launch on every host of the environment
    pub fn on_all_hosts(mut self) -> Self {
        self.scope = HostScope::All;
        self
    }
}

#[async_trait]
impl Step for StartBackgroundProcess {
    fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        let program = self
            .command
            .split_whitespace()
            .next()
            .map(|p| p.rsplit('/').next().unwrap_or(p))
            .unwrap_or("process");
        format!("start-{}", slugify(program))
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let hosts = hosts_in_scope(ctx.environment, self.scope)?;
        let detached = format!("nohup {} > /dev/null 2>&1 &", self.command);

        for host in hosts {
            let mut tunnel = ctx.environment.ssh_tunnel_to(host);
            let outcome = match tunnel.set_up() {
                Ok(_) => {
                    let assembled = tunnel.assemble_ssh_command(&detached, &[]);
                    run_shell_command(&assembled, None).await
                }
                Err(e) => Err(e.into()),
            };
            tunnel.tear_down();

            let output = outcome?;
            if !output.success() {
                return Ok(StepResult::failure(
                    self.name(),
                    format!("launch failed on {}", host.hostname()),
                )
                .with_output(output.lines)
                .with_exit_code(output.exit_code));
            }
        }

        Ok(StepResult::success(self.name(), "background process launched"))
    }
}
