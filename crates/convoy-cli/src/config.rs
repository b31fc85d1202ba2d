//! Project file loading with environment variable substitution

use convoy_engine::{
    CopyFile, Environment, Project, Script, ShellCommand, SshCommand, StartBackgroundProcess,
    SyncDirectory,
};
use db_tools::Database;
use regex::Regex;
use serde::Deserialize;
use ssh_tunnel::Host;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a project file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Project file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Project file is not valid YAML
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// A referenced environment variable is not set
    #[error("environment variable not set: {0}")]
    EnvVarNotFound(String),

    /// Project file is structurally invalid
    #[error("{0}")]
    ValidationError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level project file structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    /// Project name
    pub name: String,
    /// Deployment environments
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
    /// Scripts runnable against any environment
    #[serde(default)]
    pub scripts: Vec<ScriptConfig>,
}

/// One environment in the project file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Environment name
    pub name: String,
    /// Whether this is a dev environment
    #[serde(default)]
    pub dev: bool,
    /// Hosts in precedence order
    #[serde(default)]
    pub hosts: Vec<Host>,
    /// Databases reachable from the hosts
    #[serde(default)]
    pub databases: Vec<Database>,
}

/// One script in the project file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptConfig {
    /// Script name
    pub name: String,
    /// Script description
    #[serde(default)]
    pub description: String,
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Transfer direction in the project file
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionConfig {
    /// Local to remote
    #[default]
    Up,
    /// Remote to local
    Down,
}

/// One step in a configured script
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepConfig {
    /// Local shell command
    Shell {
        /// Command line to run
        command: String,
        /// Explicit step name
        #[serde(default)]
        name: Option<String>,
        /// Non-destructive alternate for dry-run mode
        #[serde(default)]
        dry_run_command: Option<String>,
        /// Environment this step is limited to
        #[serde(default)]
        environment: Option<String>,
        /// Working directory for the command
        #[serde(default)]
        working_dir: Option<PathBuf>,
    },
    /// Remote SSH command
    Ssh {
        /// Command line to run remotely
        command: String,
        /// Explicit step name
        #[serde(default)]
        name: Option<String>,
        /// Run on every host instead of only the first
        #[serde(default)]
        all_hosts: bool,
        /// Environment this step is limited to
        #[serde(default)]
        environment: Option<String>,
    },
    /// Background remote process
    Background {
        /// Command line to launch remotely
        command: String,
        /// Explicit step name
        #[serde(default)]
        name: Option<String>,
    },
    /// Directory synchronization
    Rsync {
        /// Local path
        local: PathBuf,
        /// Remote path
        remote: String,
        /// Transfer direction
        #[serde(default)]
        direction: DirectionConfig,
        /// Delete extraneous files on the receiving side
        #[serde(default)]
        delete: bool,
        /// Include patterns, applied ahead of excludes
        #[serde(default)]
        includes: Vec<String>,
        /// Exclude patterns
        #[serde(default)]
        excludes: Vec<String>,
        /// Sync with every host instead of only the first
        #[serde(default)]
        all_hosts: bool,
        /// Explicit step name
        #[serde(default)]
        name: Option<String>,
        /// Environment this step is limited to
        #[serde(default)]
        environment: Option<String>,
    },
    /// Single file copy
    Scp {
        /// Local path
        local: PathBuf,
        /// Remote path
        remote: String,
        /// Transfer direction
        #[serde(default)]
        direction: DirectionConfig,
        /// Copy a directory tree
        #[serde(default)]
        recursive: bool,
        /// Explicit step name
        #[serde(default)]
        name: Option<String>,
        /// Environment this step is limited to
        #[serde(default)]
        environment: Option<String>,
    },
}

/// Load a project from a YAML file
pub fn load(path: impl AsRef<Path>) -> Result<Project> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse a project from a YAML string
pub fn parse_str(content: &str) -> Result<Project> {
    let substituted = substitute_env_vars(content)?;
    let file: ProjectFile = serde_yaml::from_str(&substituted)?;
    validate(&file)?;
    Ok(build_project(file))
}

/// Substitute `${VAR}` and `${VAR:-default}` references with values from
/// the process environment
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in re.captures_iter(input) {
        let full_match = &cap[0];
        let var_expr = &cap[1];

        let (var_name, default_value) = if let Some(pos) = var_expr.find(":-") {
            (&var_expr[..pos], Some(&var_expr[pos + 2..]))
        } else {
            (var_expr, None)
        };

        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                if let Some(default) = default_value {
                    result = result.replace(full_match, default);
                } else {
                    missing.push(var_name.to_string());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }

    Ok(result)
}

fn validate(file: &ProjectFile) -> Result<()> {
    let mut environment_names = HashSet::new();
    for environment in &file.environments {
        if !environment_names.insert(environment.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate environment: {}",
                environment.name
            )));
        }
    }

    let mut script_names = HashSet::new();
    for script in &file.scripts {
        if !script_names.insert(script.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate script: {}",
                script.name
            )));
        }

        for step in &script.steps {
            let restriction = match step {
                StepConfig::Shell { environment, .. }
                | StepConfig::Ssh { environment, .. }
                | StepConfig::Rsync { environment, .. }
                | StepConfig::Scp { environment, .. } => environment.as_deref(),
                StepConfig::Background { .. } => None,
            };

            if let Some(name) = restriction {
                if !environment_names.contains(name) {
                    return Err(ConfigError::ValidationError(format!(
                        "script '{}' restricts a step to unknown environment '{}'",
                        script.name, name
                    )));
                }
            }
        }
    }

    Ok(())
}

fn build_project(file: ProjectFile) -> Project {
    let mut project = Project::new(file.name);

    for config in file.environments {
        let mut environment = Environment::new(config.name).with_dev(config.dev);
        for host in config.hosts {
            environment = environment.with_host(host);
        }
        for database in config.databases {
            environment = environment.with_database(database);
        }
        project.add_environment(environment);
    }

    for config in file.scripts {
        let mut script = Script::new(config.name, config.description);
        for step in config.steps {
            add_step(&mut script, step);
        }
        project.add_script(script);
    }

    project
}

fn add_step(script: &mut Script, config: StepConfig) {
    match config {
        StepConfig::Shell {
            command,
            name,
            dry_run_command,
            environment,
            working_dir,
        } => {
            let mut step = ShellCommand::new(command);
            if let Some(name) = name {
                step = step.with_name(name);
            }
            if let Some(alternate) = dry_run_command {
                step = step.with_dry_run_command(alternate);
            }
            if let Some(environment) = environment {
                step = step.only_in_environment(environment);
            }
            if let Some(dir) = working_dir {
                step = step.with_working_dir(dir);
            }
            script.add_step(step);
        }
        StepConfig::Ssh {
            command,
            name,
            all_hosts,
            environment,
        } => {
            let mut step = SshCommand::new(command);
            if let Some(name) = name {
                step = step.with_name(name);
            }
            if all_hosts {
                step = step.on_all_hosts();
            }
            if let Some(environment) = environment {
                step = step.only_in_environment(environment);
            }
            script.add_step(step);
        }
        StepConfig::Background { command, name } => {
            let mut step = StartBackgroundProcess::new(command);
            if let Some(name) = name {
                step = step.with_name(name);
            }
            script.add_step(step);
        }
        StepConfig::Rsync {
            local,
            remote,
            direction,
            delete,
            includes,
            excludes,
            all_hosts,
            name,
            environment,
        } => {
            let mut step = match direction {
                DirectionConfig::Up => SyncDirectory::up(local, remote),
                DirectionConfig::Down => SyncDirectory::down(local, remote),
            };
            if delete {
                step = step.with_delete();
            }
            for pattern in includes {
                step = step.with_include(pattern);
            }
            for pattern in excludes {
                step = step.with_exclude(pattern);
            }
            if all_hosts {
                step = step.on_all_hosts();
            }
            if let Some(name) = name {
                step = step.with_name(name);
            }
            if let Some(environment) = environment {
                step = step.only_in_environment(environment);
            }
            script.add_step(step);
        }
        StepConfig::Scp {
            local,
            remote,
            direction,
            recursive,
            name,
            environment,
        } => {
            let mut step = match direction {
                DirectionConfig::Up => CopyFile::up(local, remote),
                DirectionConfig::Down => CopyFile::down(local, remote),
            };
            if recursive {
                step = step.recursive();
            }
            if let Some(name) = name {
                step = step.with_name(name);
            }
            if let Some(environment) = environment {
                step = step.only_in_environment(environment);
            }
            script.add_step(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
name: example-app
environments:
  - name: staging
    hosts:
      - hostname: web1.staging.example.com
        user: deploy
    databases:
      - type: postgres
        name: app
        username: app
        password: pw
  - name: joe-dev
    dev: true
    hosts:
      - hostname: dev.local
scripts:
  - name: deploy
    description: Deploy the application.
    steps:
      - type: shell
        command: make build
        name: build
      - type: rsync
        local: ./public
        remote: /var/www/app
        delete: true
        excludes: [".git"]
      - type: ssh
        command: sudo service php-fpm reload
        all_hosts: true
"#;

    #[test]
    fn test_parse_example_project() {
        let project = parse_str(EXAMPLE).unwrap();

        assert_eq!(project.name(), "example-app");
        assert_eq!(project.environments().count(), 2);

        let staging = project.environment("staging").unwrap();
        assert_eq!(staging.hosts().len(), 1);
        assert_eq!(staging.databases().len(), 1);
        assert!(!staging.is_dev());
        assert!(project.environment("joe-dev").unwrap().is_dev());

        let deploy = project.script("deploy").unwrap();
        assert_eq!(deploy.step_names(), vec!["build", "rsync", "ssh-sudo"]);
    }

    #[test]
    fn test_unknown_environment_restriction_is_rejected() {
        let yaml = r#"
name: app
environments:
  - name: staging
scripts:
  - name: deploy
    steps:
      - type: shell
        command: make build
        environment: production
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_duplicate_environment_is_rejected() {
        let yaml = "name: app\nenvironments:\n  - name: staging\n  - name: staging\n";
        assert!(matches!(
            parse_str(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        let path = std::env::var("PATH").unwrap();
        let result = substitute_env_vars("bin: ${PATH}").unwrap();
        assert_eq!(result, format!("bin: {}", path));

        let result = substitute_env_vars("user: ${CONVOY_TEST_MISSING:-fallback}").unwrap();
        assert_eq!(result, "user: fallback");

        assert!(matches!(
            substitute_env_vars("user: ${CONVOY_TEST_MISSING}"),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
