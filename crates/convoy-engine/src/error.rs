//! Error types for the execution engine
//!
//! Two families exist on purpose: [`Error`] is fatal and reaches the caller
//! (nothing has run yet), while [`StepError`] is always caught at the step
//! boundary and converted into a FAILURE result.

use thiserror::Error;

/// Fatal configuration error raised before any step executes
#[derive(Error, Debug)]
pub enum Error {
    /// Requested environment is not registered
    #[error("unknown environment: {name}")]
    UnknownEnvironment {
        /// The requested environment name
        name: String,
    },

    /// Requested script is not registered
    #[error("unknown script: {name}")]
    UnknownScript {
        /// The requested script name
        name: String,
    },

    /// Script was run without an environment bound
    #[error("script {script} has no environment bound")]
    NoEnvironment {
        /// The script that was run
        script: String,
    },

    /// Requested host does not exist in the environment
    #[error("no host named {hostname} in environment {environment}")]
    UnknownHost {
        /// The requested hostname
        hostname: String,
        /// The environment that was searched
        environment: String,
    },
}

/// Result type alias for fatal errors
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised inside a step
///
/// Never propagates past [`Script::run`](crate::Script::run); the engine
/// records it as a FAILURE result carrying this error's message.
#[derive(Error, Debug)]
pub enum StepError {
    /// A precondition failed before any side effect occurred
    #[error("{0}")]
    Precondition(String),

    /// Tunnel setup or port allocation failed
    #[error(transparent)]
    Transport(#[from] ssh_tunnel::Error),

    /// Database handling failed
    #[error(transparent)]
    Database(#[from] db_tools::Error),

    /// Subprocess could not be launched
    #[error("failed to run command: {0}")]
    Spawn(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Explicit failure signaled by a callable
    #[error("{0}")]
    Failed(String),
}
