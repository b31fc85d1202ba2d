//! Arbitrary callable step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::{Step, StepContext};
use async_trait::async_trait;

type CallableFn = dyn Fn() -> Result<Option<String>, StepError> + Send + Sync;

/// Invokes an arbitrary unit of logic with no arguments
///
/// Succeeds unless the callable returns an error, in which case the error's
/// message becomes the result message. The engine, not the caller, performs
/// that conversion.
pub struct Callable {
    name: Option<String>,
    func: Box<CallableFn>,
    environment: Option<String>,
}

impl Callable {
    /// Create a step from a closure
    ///
    /// The closure may return an optional success message.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> Result<Option<String>, StepError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Box::new(func),
            environment: None,
        }
    }

    /// Set an explicit step name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Limit this step to one named environment
    pub fn only_in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

#[async_trait]
impl Step for Callable {
    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "callable".to_string())
    }

    fn restricted_to_environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    async fn run(&self, _ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let message = (self.func)()?;

        Ok(StepResult::success(
            self.name(),
            message.unwrap_or_else(|| "completed".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_explicit_names() {
        let step = Callable::new(|| Ok(None));
        assert_eq!(step.name(), "callable");

        let step = Callable::new(|| Ok(None)).with_name("bump-version");
        assert_eq!(step.name(), "bump-version");
    }
}
