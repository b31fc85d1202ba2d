//! Step execution outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Outcome status of one step execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Step completed successfully
    Success,
    /// Step ran and failed, or errored before running
    Failure,
    /// Step was not executed (gating, dry-run, or operator request)
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("SUCCESS"),
            Status::Failure => f.write_str("FAILURE"),
            Status::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// The recorded outcome of one step execution
///
/// Produced once per executed (or gated) step and consumed by the script
/// aggregator, logging, and notification.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    step: String,
    status: Status,
    message: String,
    output: Vec<String>,
    exit_code: Option<i32>,
    timestamp: DateTime<Utc>,
}

impl StepResult {
    /// Record a successful execution
    pub fn success(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, Status::Success, message)
    }

    /// Record a failed execution
    pub fn failure(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, Status::Failure, message)
    }

    /// Record a skipped step
    pub fn skipped(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, Status::Skipped, message)
    }

    fn new(step: impl Into<String>, status: Status, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status,
            message: message.into(),
            output: Vec::new(),
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach captured output lines
    pub fn with_output(mut self, output: Vec<String>) -> Self {
        self.output = output;
        self
    }

    /// Attach the subprocess exit code
    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Name of the step that produced this result
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Outcome status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable outcome message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw captured output lines
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Subprocess exit code, where applicable
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// When the result was recorded
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether this result is a failure
    pub fn is_failure(&self) -> bool {
        self.status == Status::Failure
    }

    /// Whether this result is a success
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
