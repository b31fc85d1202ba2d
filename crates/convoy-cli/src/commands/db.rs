//! `convoy db` commands

use crate::commands::print_results;
use crate::config;
use anyhow::{bail, Context, Result};
use async_process::Command;
use convoy_engine::{
    select_database, ConsoleNotifier, DatabaseSelector, DumpDatabase, Environment, LogAndNotify,
    RestoreDatabase, Script,
};
use db_tools::Database;
use ssh_tunnel::Host;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Open an interactive shell on the selected database
pub async fn shell(
    config_path: &Path,
    environment_name: &str,
    hostname: Option<String>,
    database_name: Option<String>,
) -> Result<()> {
    let project = config::load(config_path)?;
    let environment = project.environment(environment_name)?;

    let host = select_host(environment, hostname.as_deref())?;
    let database = pick_database(environment, database_name, None)?;

    let mut tunnel = environment.ssh_tunnel_to(host);
    tunnel.set_up().context("could not open tunnel")?;

    println!("Connected to {} via {}.", database.summary(), host.hostname());

    let command = tunnel.assemble_ssh_command(&database.shell_command(), &["-t"]);
    debug!(%command, "opening database shell");

    let status = Command::new("sh").arg("-c").arg(&command).status().await;
    tunnel.tear_down();

    let status = status.context("could not start database shell")?;
    if !status.success() {
        bail!("database shell exited with {}", status);
    }

    Ok(())
}

/// Restore a local dump file into the selected database
pub async fn restore(
    config_path: &Path,
    environment_name: &str,
    dump_file: &Path,
    database_name: Option<String>,
    hostname: Option<String>,
) -> Result<()> {
    let project = config::load(config_path)?;
    let environment = project.environment(environment_name)?.clone();
    let database = pick_database(&environment, database_name, hostname)?;

    let script = Script::new("db-restore", "Restore a dump file into a database.")
        .with_step(RestoreDatabase::new(database, dump_file))
        .with_step(LogAndNotify::new(Arc::new(ConsoleNotifier)))
        .with_environment(environment);

    let results = script.run().await?;
    print_results(&results);

    if results.iter().any(|r| r.is_failure()) {
        bail!("restore failed");
    }

    Ok(())
}

/// Dump the selected database into a local file
pub async fn dump(
    config_path: &Path,
    environment_name: &str,
    target_file: &Path,
    database_name: Option<String>,
    hostname: Option<String>,
) -> Result<()> {
    let project = config::load(config_path)?;
    let environment = project.environment(environment_name)?.clone();
    let database = pick_database(&environment, database_name, hostname)?;

    let script = Script::new("db-dump", "Dump a database into a local file.")
        .with_step(DumpDatabase::new(database, target_file))
        .with_step(LogAndNotify::new(Arc::new(ConsoleNotifier)))
        .with_environment(environment);

    let results = script.run().await?;
    print_results(&results);

    if results.iter().any(|r| r.is_failure()) {
        bail!("dump failed");
    }

    Ok(())
}

fn select_host<'a>(environment: &'a Environment, hostname: Option<&str>) -> Result<&'a Host> {
    match hostname {
        Some(name) => Ok(environment.host_by_name(name).ok_or_else(|| {
            convoy_engine::Error::UnknownHost {
                hostname: name.to_string(),
                environment: environment.name().to_string(),
            }
        })?),
        None => environment
            .first_host()
            .with_context(|| format!("environment {} has no hosts", environment.name())),
    }
}

fn pick_database(
    environment: &Environment,
    name: Option<String>,
    hostname: Option<String>,
) -> Result<Database> {
    let mut selector = DatabaseSelector::any();
    if let Some(name) = name {
        selector = selector.with_name(name);
    }
    if let Some(hostname) = hostname {
        selector = selector.with_hostname(hostname);
    }

    select_database(environment.databases(), &selector)
        .with_context(|| format!("in environment {}", environment.name()))
}
