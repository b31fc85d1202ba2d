//! Dangerous-operation authorization step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::{slugify, Step, StepContext};
use async_trait::async_trait;
use std::sync::Arc;

/// Collects a line of operator input
///
/// Injected into the authorization step so tests and non-interactive
/// callers can supply their own implementation.
pub trait OperatorPrompt: Send + Sync {
    /// Show `message` and return the operator's answer
    fn prompt(&self, message: &str) -> Result<String, StepError>;
}

/// Blocks a script until the operator confirms a dangerous operation
///
/// A one-time code is generated per run; the step succeeds only when the
/// operator echoes it back exactly. Dev environments skip the check.
pub struct AuthorizedOperation {
    description: String,
    prompt: Arc<dyn OperatorPrompt>,
}

impl AuthorizedOperation {
    /// Create a guard for the described operation
    pub fn new(description: impl Into<String>, prompt: Arc<dyn OperatorPrompt>) -> Self {
        Self {
            description: description.into(),
            prompt,
        }
    }
}

#[async_trait]
impl Step for AuthorizedOperation {
    fn name(&self) -> String {
        format!("authorize-{}", slugify(&self.description))
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        if ctx.environment.is_dev() {
            return Ok(StepResult::success(
                self.name(),
                "authorization skipped in dev environment",
            ));
        }

        let code = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let answer = self.prompt.prompt(&format!(
            "{} Enter the code {} to continue.",
            self.description, code
        ))?;

        if answer.trim() == code {
            Ok(StepResult::success(self.name(), "operation authorized"))
        } else {
            Ok(StepResult::failure(
                self.name(),
                "authorization code did not match",
            ))
        }
    }
}
