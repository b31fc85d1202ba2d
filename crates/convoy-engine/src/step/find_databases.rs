//! Database discovery step

use crate::error::StepError;
use crate::result::StepResult;
use crate::step::{Step, StepContext};
use async_trait::async_trait;
use db_tools::Database;
use std::sync::Mutex;

/// Narrows a discovered database list to exactly one entry
#[derive(Debug, Clone, Default)]
pub struct DatabaseSelector {
    name: Option<String>,
    hostname: Option<String>,
}

impl DatabaseSelector {
    /// Match any database
    pub fn any() -> Self {
        Self::default()
    }

    /// Require a specific database name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Require a specific database server hostname
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    fn matches(&self, database: &Database) -> bool {
        if let Some(name) = &self.name {
            if database.name() != name {
                return false;
            }
        }
        if let Some(hostname) = &self.hostname {
            if database.hostname() != hostname {
                return false;
            }
        }
        true
    }
}

/// Select exactly one database from a discovered list
///
/// Zero matches is an error, and so is more than one: ambiguity is never
/// resolved by silently picking the first entry. The error lists the
/// candidates so the operator can narrow the selection.
pub fn select_database(
    databases: &[Database],
    selector: &DatabaseSelector,
) -> Result<Database, StepError> {
    let matches: Vec<&Database> = databases.iter().filter(|db| selector.matches(db)).collect();

    match matches.len() {
        0 => Err(StepError::Precondition(
            "no database matched the selection".to_string(),
        )),
        1 => Ok(matches[0].clone()),
        _ => {
            let names: Vec<String> = matches.iter().map(|db| db.summary()).collect();
            Err(StepError::Precondition(format!(
                "multiple databases matched; select one explicitly: {}",
                names.join(", ")
            )))
        }
    }
}

/// Discovers the bound environment's databases
///
/// Downstream steps and commands read the discovered list through the
/// accessors, so construct this step inside an `Arc` and keep a clone.
#[derive(Default)]
pub struct FindDatabases {
    discovered: Mutex<Vec<Database>>,
}

impl FindDatabases {
    /// Create the discovery step
    pub fn new() -> Self {
        Self::default()
    }

    /// Databases found by the last run
    pub fn databases(&self) -> Vec<Database> {
        self.lock().clone()
    }

    /// Select exactly one discovered database
    pub fn selected_database(&self, selector: &DatabaseSelector) -> Result<Database, StepError> {
        select_database(&self.lock(), selector)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Database>> {
        self.discovered.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Step for FindDatabases {
    fn name(&self) -> String {
        "find-databases".to_string()
    }

    fn supports_dry_run(&self) -> bool {
        // Discovery is read-only
        true
    }

    async fn run(&self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        let databases = ctx.environment.databases().to_vec();

        let output: Vec<String> = databases
            .iter()
            .map(|db| format!("found {}", db.summary()))
            .collect();

        let message = match databases.len() {
            0 => "no databases configured".to_string(),
            1 => "found 1 database".to_string(),
            n => format!("found {} databases", n),
        };

        *self.lock() = databases;

        Ok(StepResult::success(self.name(), message).with_output(output))
    }
}
