//! Project composition root

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::script::Script;
use indexmap::IndexMap;

/// Registry of a project's environments and scripts
///
/// The composition root for a run: commands look up the requested
/// environment and script here, and unknown names fail before any step
/// executes.
#[derive(Default)]
pub struct Project {
    name: String,
    environments: IndexMap<String, Environment>,
    scripts: IndexMap<String, Script>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("environments", &self.environments.keys().collect::<Vec<_>>())
            .field("scripts", &self.scripts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Project {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environments: IndexMap::new(),
            scripts: IndexMap::new(),
        }
    }

    /// Get the project name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an environment
    pub fn add_environment(&mut self, environment: Environment) -> &mut Self {
        self.environments
            .insert(environment.name().to_string(), environment);
        self
    }

    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment {
                name: name.to_string(),
            })
    }

    /// All registered environments, in registration order
    pub fn environments(&self) -> impl Iterator<Item = &Environment> {
        self.environments.values()
    }

    /// Register a script
    pub fn add_script(&mut self, script: Script) -> &mut Self {
        self.scripts.insert(script.name().to_string(), script);
        self
    }

    /// Look up a script by name
    pub fn script(&self, name: &str) -> Result<&Script> {
        self.scripts.get(name).ok_or_else(|| Error::UnknownScript {
            name: name.to_string(),
        })
    }

    /// Look up a script by name for mutation (binding, gating)
    pub fn script_mut(&mut self, name: &str) -> Result<&mut Script> {
        self.scripts
            .get_mut(name)
            .ok_or_else(|| Error::UnknownScript {
                name: name.to_string(),
            })
    }

    /// All registered scripts, in registration order
    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_lookups_are_fatal_errors() {
        let project = Project::new("app");

        assert!(matches!(
            project.environment("staging"),
            Err(Error::UnknownEnvironment { .. })
        ));
        assert!(matches!(
            project.script("deploy"),
            Err(Error::UnknownScript { .. })
        ));
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut project = Project::new("app");
        project.add_environment(Environment::new("staging"));
        project.add_environment(Environment::new("production"));

        let names: Vec<&str> = project.environments().map(|e| e.name()).collect();
        assert_eq!(names, vec!["staging", "production"]);
    }
}
