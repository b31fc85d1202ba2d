//! Convoy command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "convoy")]
#[command(about = "Convoy - deployment automation over SSH")]
#[command(version)]
struct Cli {
    /// Project file path
    #[arg(short, long, global = true, default_value = "convoy.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against an environment
    Run {
        /// The script to run
        script: String,

        /// The environment to run against
        environment: String,

        /// Replace destructive steps with non-destructive alternates
        #[arg(long)]
        dry_run: bool,

        /// Skip the named step (repeatable)
        #[arg(long = "skip-step")]
        skip_steps: Vec<String>,

        /// List step names without executing anything
        #[arg(long)]
        list_steps: bool,

        /// Print results as JSON instead of the human-readable summary
        #[arg(long)]
        json: bool,
    },

    /// List the project's scripts
    Scripts,

    /// List the project's environments
    Environments,

    /// Database commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Open an interactive database shell
    Shell {
        /// The environment to connect to
        environment: String,

        /// Connect through a specific host
        #[arg(long)]
        hostname: Option<String>,

        /// Select a database by name
        #[arg(long)]
        database: Option<String>,
    },

    /// Restore a local dump file into a database
    Restore {
        /// The environment to restore into
        environment: String,

        /// The dump file to restore
        dump_file: PathBuf,

        /// Select a database by name
        #[arg(long)]
        database: Option<String>,

        /// Select a database by server hostname
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Dump a database into a local file
    Dump {
        /// The environment to dump from
        environment: String,

        /// The local file to write
        target_file: PathBuf,

        /// Select a database by name
        #[arg(long)]
        database: Option<String>,

        /// Select a database by server hostname
        #[arg(long)]
        hostname: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    smol::block_on(async {
        let cli = Cli::parse();

        match cli.command {
            Commands::Run {
                script,
                environment,
                dry_run,
                skip_steps,
                list_steps,
                json,
            } => {
                commands::run::run(
                    &cli.config,
                    &script,
                    &environment,
                    commands::run::Options {
                        dry_run,
                        list_steps,
                        json,
                        skip_steps,
                    },
                )
                .await
            }
            Commands::Scripts => commands::scripts::list_scripts(&cli.config).await,
            Commands::Environments => commands::scripts::list_environments(&cli.config).await,
            Commands::Db { command } => match command {
                DbCommands::Shell {
                    environment,
                    hostname,
                    database,
                } => commands::db::shell(&cli.config, &environment, hostname, database).await,
                DbCommands::Restore {
                    environment,
                    dump_file,
                    database,
                    hostname,
                } => {
                    commands::db::restore(&cli.config, &environment, &dump_file, database, hostname)
                        .await
                }
                DbCommands::Dump {
                    environment,
                    target_file,
                    database,
                    hostname,
                } => {
                    commands::db::dump(&cli.config, &environment, &target_file, database, hostname)
                        .await
                }
            },
        }
    })
}
