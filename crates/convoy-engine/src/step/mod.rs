//! Step variants and the capability trait they share
//!
//! Steps are a closed set of concrete types behind one trait. Construct
//! them with their explicit constructors and add them to a
//! [`Script`](crate::Script); the engine owns sequencing and gating.

use crate::environment::Environment;
use crate::error::StepError;
use crate::result::StepResult;
use async_trait::async_trait;
use ssh_tunnel::Host;
use std::sync::Arc;

mod background;
mod callable;
mod composite;
mod dump;
mod exec;
mod find_databases;
mod guard;
mod notify;
mod restore;
mod rsync;
mod scp;
mod shell;
mod ssh;

pub use background::StartBackgroundProcess;
pub use callable::Callable;
pub use composite::RunScript;
pub use dump::DumpDatabase;
pub use exec::{run_shell_command, CommandOutput};
pub use find_databases::{select_database, DatabaseSelector, FindDatabases};
pub use guard::{AuthorizedOperation, OperatorPrompt};
pub use notify::{ConsoleNotifier, LogAndNotify, Notifier};
pub use restore::RestoreDatabase;
pub use rsync::SyncDirectory;
pub use scp::CopyFile;
pub use shell::ShellCommand;
pub use ssh::SshCommand;

/// Runtime context injected into each step execution
pub struct StepContext<'a> {
    /// The environment the script is bound to
    pub environment: &'a Environment,
    /// Whether the script is running in dry-run mode
    pub dry_run: bool,
    /// Name of the owning script
    pub script: &'a str,
    /// Results of the steps that already ran in this script run
    pub results_so_far: &'a [StepResult],
}

/// One unit of work within a script
#[async_trait]
pub trait Step: Send + Sync {
    /// The step's name, explicit or computed
    fn name(&self) -> String;

    /// Whether the step can run meaningfully in dry-run mode
    fn supports_dry_run(&self) -> bool {
        false
    }

    /// Environment this step is limited to (`None` means all environments)
    fn restricted_to_environment(&self) -> Option<&str> {
        None
    }

    /// Whether this step still runs after an earlier step failed
    ///
    /// Reserved for reporting steps like
    /// [`LogAndNotify`]; ordinary steps never run past a failure.
    fn runs_after_failure(&self) -> bool {
        false
    }

    /// Execute the step
    ///
    /// Errors are caught by the engine and recorded as FAILURE results;
    /// they never propagate past the script run.
    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError>;
}

#[async_trait]
impl<S: Step + ?Sized> Step for Arc<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn supports_dry_run(&self) -> bool {
        (**self).supports_dry_run()
    }

    fn restricted_to_environment(&self) -> Option<&str> {
        (**self).restricted_to_environment()
    }

    fn runs_after_failure(&self) -> bool {
        (**self).runs_after_failure()
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        (**self).run(ctx).await
    }
}

/// Which of an environment's hosts a host-iterating step runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostScope {
    /// Only the environment's first host
    #[default]
    FirstOnly,
    /// Every host, sequentially, in environment order
    All,
}

/// Transfer direction for file-moving steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local to remote
    Up,
    /// Remote to local
    Down,
}

/// Resolve the hosts a step should iterate, per its scope
pub(crate) fn hosts_in_scope<'a>(
    environment: &'a Environment,
    scope: HostScope,
) -> Result<Vec<&'a Host>, StepError> {
    let hosts = environment.hosts();

    if hosts.is_empty() {
        return Err(StepError::Precondition(format!(
            "environment {} has no hosts",
            environment.name()
        )));
    }

    match scope {
        HostScope::FirstOnly => Ok(vec![&hosts[0]]),
        HostScope::All => Ok(hosts.iter().collect()),
    }
}

/// Reduce a free-form string to a name-safe slug
pub(crate) fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("app_production"), "app-production");
        assert_eq!(slugify("Clear the cache!"), "clear-the-cache");
        assert_eq!(slugify("--already--"), "already");
    }

    #[test]
    fn test_hosts_in_scope_requires_a_host() {
        let env = Environment::new("empty");
        assert!(hosts_in_scope(&env, HostScope::FirstOnly).is_err());
    }

    #[test]
    fn test_hosts_in_scope_first_only() {
        let env = Environment::new("staging")
            .with_host(Host::new("web1"))
            .with_host(Host::new("web2"));

        let hosts = hosts_in_scope(&env, HostScope::FirstOnly).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].hostname(), "web1");

        let all = hosts_in_scope(&env, HostScope::All).unwrap();
        assert_eq!(all.len(), 2);
    }
}
