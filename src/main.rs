mod commands;
mod config;
mod diagnostics;
mod dispatch;
mod docker;
mod env;
mod errors;
mod logging;
mod naming;
mod platform;
mod project;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use commands::{Command, CommandRunner};
use dispatch::{DispatchError, Dispatcher, InvocationOptions};
use std::path::PathBuf;

/// Define and run multi-container applications with Docker.
#[derive(Debug, Parser)]
#[command(name = "compose", version, disable_help_subcommand = true)]
struct Cli {
    /// Specify an alternate compose file (default: docker-compose.yml)
    #[arg(short = 'f', long = "file", global = true)]
    file: Option<String>,

    /// Specify an alternate project name (default: directory name)
    #[arg(short = 'p', long = "project-name", global = true)]
    project_name: Option<String>,

    /// Directory used to find the compose file
    #[arg(long, global = true, default_value = ".")]
    project_directory: PathBuf,

    /// Show more output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env may set RUST_LOG, so it is read before the subscriber exists
    let dotenv = env::load_env(&cli.project_directory);
    logging::init(cli.verbose);
    for reason in &dotenv.skipped {
        tracing::warn!("ignoring environment file {reason}");
    }
    if !dotenv.loaded.is_empty() {
        tracing::debug!(files = ?dotenv.loaded, "loaded environment files");
    }

    let invocation = InvocationOptions {
        command: cli.command.name().to_string(),
        file: cli.file.clone(),
        project_name: cli.project_name.clone(),
        verbose: cli.verbose,
    };
    let runner = CommandRunner::new(Cli::command().render_long_help().to_string());
    let dispatcher = Dispatcher::for_host(cli.project_directory.clone());

    match dispatcher.dispatch(&invocation, &runner, &cli.command).await {
        Ok(()) => Ok(()),
        Err(DispatchError::User(err)) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
        Err(DispatchError::Other(err)) => Err(err),
    }
}
