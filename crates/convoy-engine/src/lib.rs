//! Deployment script execution engine
//!
//! A [`Project`] groups named [`Environment`]s (SSH-reachable hosts plus
//! configuration) and [`Script`]s (ordered sequences of [`Step`]s). The
//! engine sequences steps, applies environment and dry-run gating, converts
//! every step-level error into a [`StepResult`], and stops on the first
//! failure unless told otherwise.

#![warn(missing_docs)]

pub mod environment;
pub mod error;
pub mod project;
pub mod result;
pub mod script;
pub mod step;

pub use environment::Environment;
pub use error::{Error, Result, StepError};
pub use project::Project;
pub use result::{Status, StepResult};
pub use script::Script;
pub use step::{
    select_database, AuthorizedOperation, Callable, ConsoleNotifier, CopyFile, DatabaseSelector,
    Direction, DumpDatabase, FindDatabases, HostScope, LogAndNotify, Notifier, OperatorPrompt,
    RestoreDatabase, RunScript, ShellCommand, SshCommand, StartBackgroundProcess, Step,
    StepContext, SyncDirectory,
};
