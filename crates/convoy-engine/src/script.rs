//! Script sequencing and result aggregation

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::result::StepResult;
use crate::step::{Step, StepContext};
use std::collections::HashSet;
use tracing::{info, warn};

/// An ordered, named sequence of steps bound to one environment
///
/// Steps execute strictly in insertion order. Once a step fails with
/// stop-on-failure enabled (the default), no further step runs and no
/// further result is recorded; everything produced so far is still
/// returned so logging can report exactly what ran.
pub struct Script {
    name: String,
    description: String,
    steps: Vec<Box<dyn Step>>,
    environment: Option<Environment>,
    stop_on_failure: bool,
    dry_run: bool,
    skipped_steps: HashSet<String>,
}

impl Script {
    /// Create an empty script
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            environment: None,
            stop_on_failure: true,
            dry_run: false,
            skipped_steps: HashSet::new(),
        }
    }

    /// Get the script name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the script description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Append a step (chainable)
    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.add_step(step);
        self
    }

    /// Append a step
    pub fn add_step(&mut self, step: impl Step + 'static) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Bind the script to an environment (chainable)
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Bind the script to an environment
    pub fn set_environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = Some(environment);
        self
    }

    /// The bound environment, if any
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Enable or disable dry-run mode
    pub fn set_dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether dry-run mode is enabled
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Control whether a failing step halts the run (enabled by default)
    pub fn set_stop_on_failure(&mut self, stop_on_failure: bool) -> &mut Self {
        self.stop_on_failure = stop_on_failure;
        self
    }

    /// Skip the named step in the next run
    pub fn skip_step(&mut self, name: impl Into<String>) -> &mut Self {
        self.skipped_steps.insert(name.into());
        self
    }

    /// Names of all steps, in execution order, without executing anything
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run against the bound environment
    ///
    /// Fails fast with a configuration error when no environment is bound;
    /// step-level errors never surface here.
    pub async fn run(&self) -> Result<Vec<StepResult>> {
        let environment = self.environment.as_ref().ok_or_else(|| Error::NoEnvironment {
            script: self.name.clone(),
        })?;

        Ok(self.run_in(environment, self.dry_run).await)
    }

    /// Run against a caller-selected environment
    ///
    /// Used for scripts that are environment-agnostic at definition time
    /// and by the sub-script step.
    pub async fn run_in(&self, environment: &Environment, dry_run: bool) -> Vec<StepResult> {
        info!(
            script = %self.name,
            environment = environment.name(),
            dry_run,
            "running script"
        );

        let mut results: Vec<StepResult> = Vec::with_capacity(self.steps.len());
        let mut halted = false;

        for step in &self.steps {
            let name = step.name();

            // After a halting failure, only steps explicitly marked to run
            // regardless (reporting) still execute; the rest produce no
            // result at all.
            if halted && !step.runs_after_failure() {
                continue;
            }

            if self.skipped_steps.contains(&name) {
                results.push(StepResult::skipped(name.as_str(), "skipped by request"));
                continue;
            }

            if let Some(required) = step.restricted_to_environment() {
                if required != environment.name() {
                    results.push(StepResult::skipped(
                        name.as_str(),
                        format!("environment mismatch: step requires {}", required),
                    ));
                    continue;
                }
            }

            if dry_run && !step.supports_dry_run() {
                results.push(StepResult::skipped(name.as_str(), "no dry-run support"));
                continue;
            }

            let result = {
                let ctx = StepContext {
                    environment,
                    dry_run,
                    script: &self.name,
                    results_so_far: &results,
                };

                match step.run(&ctx).await {
                    Ok(result) => result,
                    Err(e) => StepResult::failure(name.as_str(), e.to_string()),
                }
            };

            let failed = result.is_failure();
            info!(
                script = %self.name,
                step = %name,
                status = %result.status(),
                "{}",
                result.message()
            );
            results.push(result);

            if failed && self.stop_on_failure && !halted {
                warn!(script = %self.name, step = %name, "halting after failed step");
                halted = true;
            }
        }

        results
    }
}
