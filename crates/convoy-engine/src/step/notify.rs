//! Logging and notification step

use crate::environment::Environment;
use crate::error::StepError;
use crate::result::StepResult;
use crate::step::{Step, StepContext};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Delivers a run summary to an external channel
///
/// Implementations must swallow transport failures: a broken notification
/// channel never fails a deployment.
pub trait Notifier: Send + Sync {
    /// Deliver the results of a script run
    fn notify(&self, script: &str, environment: &Environment, results: &[StepResult]);
}

/// Notifier that writes the summary to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, script: &str, environment: &Environment, results: &[StepResult]) {
        for result in results {
            info!(
                script,
                environment = environment.name(),
                step = result.step(),
                status = %result.status(),
                message = result.message(),
                "script result"
            );
        }
    }
}

/// Logs the results recorded so far and notifies the configured channel
///
/// Typically placed first or last in a script. Transmission is suppressed
/// entirely for dev environments; logging always happens.
pub struct LogAndNotify {
    notifier: Arc<dyn Notifier>,
    notify_on_failure: bool,
}

impl LogAndNotify {
    /// Create the step with the given notifier
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            notify_on_failure: true,
        }
    }

    /// Do not send notifications when an earlier step has failed
    pub fn without_failure_notifications(mut self) -> Self {
        self.notify_on_failure = false;
        self
    }
}

#[async_trait]
impl Step for LogAndNotify {
    fn name(&self) -> String {
        "log-and-notify".to_string()
    }

    fn supports_dry_run(&self) -> bool {
        true
    }

    fn runs_after_failure(&self) -> bool {
        // Reporting must still happen when the script halts early
        true
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        for result in ctx.results_so_far {
            info!(
                script = ctx.script,
                step = result.step(),
                status = %result.status(),
                "{}",
                result.message()
            );
        }

        let message = if ctx.environment.is_dev() {
            "notifications suppressed for dev environment"
        } else if !self.notify_on_failure && ctx.results_so_far.iter().any(|r| r.is_failure()) {
            "notifications skipped after failure"
        } else {
            self.notifier
                .notify(ctx.script, ctx.environment, ctx.results_so_far);
            "notifications sent"
        };

        Ok(StepResult::success(self.name(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<usize>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _script: &str, _environment: &Environment, _results: &[StepResult]) {
            *self.calls.lock().unwrap() += 1;
        }
    }

    fn run_step(step: &LogAndNotify, env: &Environment, prior: &[StepResult]) -> StepResult {
        futures::executor::block_on(async {
            let ctx = StepContext {
                environment: env,
                dry_run: false,
                script: "deploy",
                results_so_far: prior,
            };
            step.run(&ctx).await.unwrap()
        })
    }

    #[test]
    fn test_dev_environment_suppresses_transmission() {
        let notifier = Arc::new(RecordingNotifier::default());
        let step = LogAndNotify::new(Arc::clone(&notifier) as Arc<dyn Notifier>);
        let env = Environment::new("joe-dev").with_dev(true);

        let result = run_step(&step, &env, &[]);

        assert!(result.is_success());
        assert_eq!(*notifier.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_non_dev_environment_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let step = LogAndNotify::new(Arc::clone(&notifier) as Arc<dyn Notifier>);
        let env = Environment::new("production");

        run_step(&step, &env, &[StepResult::success("a", "ok")]);

        assert_eq!(*notifier.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_failure_notifications_can_be_disabled() {
        let notifier = Arc::new(RecordingNotifier::default());
        let step = LogAndNotify::new(Arc::clone(&notifier) as Arc<dyn Notifier>)
            .without_failure_notifications();
        let env = Environment::new("production");

        run_step(&step, &env, &[StepResult::failure("a", "broken")]);

        assert_eq!(*notifier.calls.lock().unwrap(), 0);
    }
}
