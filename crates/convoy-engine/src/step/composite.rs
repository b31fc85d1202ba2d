//! Sub-script step

use crate::error::StepError;
use crate::result::StepResult;
use crate::script::Script;
use crate::step::{Step, StepContext};
use async_trait::async_trait;

/// Embeds another script's full run as a single step
///
/// The embedded script runs against the outer script's environment and
/// dry-run mode. The step succeeds iff no embedded result is a failure.
pub struct RunScript {
    script: Script,
}

impl RunScript {
    /// Wrap a script as a step
    pub fn new(script: Script) -> Self {
        Self { script }
    }
}

#[async_trait]
impl Step for RunScript {
    fn name(&self) -> String {
        format!("script-{}", self.script.name())
    }

    fn supports_dry_run(&self) -> bool {
        // Embedded steps are gated individually by the inner run
        true
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let results = self.script.run_in(ctx.environment, ctx.dry_run).await;

        let output: Vec<String> = results
            .iter()
            .map(|r| format!("{}: {} {}", r.step(), r.status(), r.message()))
            .collect();

        let failures = results.iter().filter(|r| r.is_failure()).count();

        let result = if failures == 0 {
            StepResult::success(
                self.name(),
                format!("{} steps completed", results.len()),
            )
        } else {
            StepResult::failure(
                self.name(),
                format!("{} of {} steps failed", failures, results.len()),
            )
        };

        Ok(result.with_output(output))
    }
}
