//! `convoy scripts` and `convoy environments` commands

use crate::config;
use anyhow::Result;
use std::path::Path;

/// List the project's scripts with their step counts
pub async fn list_scripts(config_path: &Path) -> Result<()> {
    let project = config::load(config_path)?;

    for script in project.scripts() {
        println!(
            "{} ({} steps): {}",
            script.name(),
            script.step_names().len(),
            script.description()
        );
    }

    Ok(())
}

/// List the project's environments with their hosts
pub async fn list_environments(config_path: &Path) -> Result<()> {
    let project = config::load(config_path)?;

    for environment in project.environments() {
        let hosts: Vec<&str> = environment.hosts().iter().map(|h| h.hostname()).collect();
        let suffix = if environment.is_dev() { " (dev)" } else { "" };
        println!("{}{}: {}", environment.name(), suffix, hosts.join(", "));
    }

    Ok(())
}
