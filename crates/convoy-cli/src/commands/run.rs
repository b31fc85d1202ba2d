//! `convoy run` command

use crate::commands::print_results;
use crate::config;
use anyhow::Result;
use convoy_engine::{ConsoleNotifier, LogAndNotify};
use std::path::Path;
use std::sync::Arc;

/// Flags controlling a script run
pub struct Options {
    /// Replace destructive steps with non-destructive alternates
    pub dry_run: bool,
    /// List step names without executing anything
    pub list_steps: bool,
    /// Print results as JSON
    pub json: bool,
    /// Steps to skip by name
    pub skip_steps: Vec<String>,
}

/// Run (or introspect) a configured script against an environment
pub async fn run(
    config_path: &Path,
    script_name: &str,
    environment_name: &str,
    options: Options,
) -> Result<()> {
    let mut project = config::load(config_path)?;

    if options.list_steps {
        for name in project.script(script_name)?.step_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let environment = project.environment(environment_name)?.clone();
    let script = project.script_mut(script_name)?;

    script.set_environment(environment);
    script.set_dry_run(options.dry_run);
    script.add_step(LogAndNotify::new(Arc::new(ConsoleNotifier)));
    for name in &options.skip_steps {
        script.skip_step(name.clone());
    }

    let results = script.run().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }

    if results.iter().any(|r| r.is_failure()) {
        anyhow::bail!("script {} failed", script_name);
    }

    Ok(())
}
