use crate::dispatch::{Handler, HELP_COMMAND};
use crate::docker::{render_version, EngineInfo, VersionInfo};
use crate::project::Project;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::Subcommand;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show usage
    Help,
    /// Show the resolved project and its services
    Config {
        /// Print the service names, one per line
        #[arg(long)]
        services: bool,
    },
    /// Show tool and engine versions
    Version {
        /// Only print the tool version
        #[arg(long)]
        short: bool,
    },
    /// Check that the engine answers
    Ping,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => HELP_COMMAND,
            Command::Config { .. } => "config",
            Command::Version { .. } => "version",
            Command::Ping => "ping",
        }
    }
}

/// Runs a parsed `Command` and prints its output to stdout.
pub struct CommandRunner {
    usage: String,
}

impl CommandRunner {
    pub fn new(usage: String) -> Self {
        Self { usage }
    }
}

#[async_trait]
impl Handler<Command> for CommandRunner {
    async fn handle(&self, project: Option<Project>, command: &Command) -> Result<()> {
        let output = match (command, project) {
            (Command::Help, _) => self.usage.clone(),
            (_, None) => return Err(anyhow!("`{}` needs a project", command.name())),
            (Command::Config { services }, Some(project)) => render_config(&project, *services),
            (Command::Version { short: true }, Some(_)) => tool_version(),
            (Command::Version { short: false }, Some(project)) => {
                let engine = project.client.version().await?;
                render_versions(&engine)
            }
            (Command::Ping, Some(project)) => {
                project.client.ping().await?;
                let info = project.client.info().await?;
                render_ping(&project.client.base_url(), &info)
            }
        };
        println!("{}", output.trim_end());
        Ok(())
    }
}

fn tool_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn render_config(project: &Project, services_only: bool) -> String {
    if services_only {
        return project.service_names().join("\n");
    }

    let mut out = vec![format!("project: {}", project.name), "services:".to_string()];
    for service in &project.services {
        let source = match (&service.image, &service.build) {
            (Some(image), _) => format!("image {image}"),
            (None, Some(build)) => format!("build {build}"),
            (None, None) => String::new(),
        };
        out.push(format!("  {}: {}", service.name, source));
    }
    out.join("\n")
}

fn render_versions(engine: &VersionInfo) -> String {
    format!(
        "compose version {}\nDocker: {}",
        tool_version(),
        render_version(engine)
    )
}

fn render_ping(base_url: &str, info: &EngineInfo) -> String {
    let count = |n: Option<i64>| n.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
    format!(
        "Docker at {base_url} is up (server {}, host {}): {} containers ({} running), {} images",
        info.server_version.as_deref().unwrap_or("unknown"),
        info.name.as_deref().unwrap_or("unknown"),
        count(info.containers),
        count(info.containers_running),
        count(info.images),
    )
}
