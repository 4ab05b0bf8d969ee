use crate::config::{load_config, resolve_config_path};
use crate::diagnostics::diagnose;
use crate::docker::{BollardConnector, ClientFactory, EngineError};
use crate::env::{EnvSource, ProcessEnv};
use crate::errors::UserError;
use crate::logging::{LogSink, TracingSink};
use crate::naming::resolve_project_name;
use crate::platform::{ExecutableLocator, HostPlatform, PlatformClassifier, SearchPath};
use crate::project::Project;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const HELP_COMMAND: &str = "help";

/// Global options of one invocation, as parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOptions {
    pub command: String,
    pub file: Option<String>,
    pub project_name: Option<String>,
    pub verbose: bool,
}

/// A command body. `project` is `None` only for `help`.
#[async_trait]
pub trait Handler<O: ?Sized + Sync>: Sync {
    async fn handle(&self, project: Option<Project>, options: &O) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    User(#[from] UserError),

    /// Not a user error: passed through untouched.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct Dispatcher {
    base_dir: PathBuf,
    env: Box<dyn EnvSource>,
    log: Arc<dyn LogSink>,
    clients: ClientFactory,
    locator: Box<dyn ExecutableLocator>,
    platform: Box<dyn PlatformClassifier>,
}

impl Dispatcher {
    pub fn new(
        base_dir: PathBuf,
        env: Box<dyn EnvSource>,
        log: Arc<dyn LogSink>,
        clients: ClientFactory,
        locator: Box<dyn ExecutableLocator>,
        platform: Box<dyn PlatformClassifier>,
    ) -> Self {
        Self {
            base_dir,
            env,
            log,
            clients,
            locator,
            platform,
        }
    }

    /// Wire the dispatcher to the real process environment, engine and host.
    pub fn for_host(base_dir: PathBuf) -> Self {
        let log: Arc<dyn LogSink> = Arc::new(TracingSink);
        let connector = BollardConnector::from_env(&ProcessEnv);
        let clients = ClientFactory::new(Box::new(connector), log.clone());
        Self::new(
            base_dir,
            Box::new(ProcessEnv),
            log,
            clients,
            Box::new(SearchPath),
            Box::new(HostPlatform::default()),
        )
    }

    /// Resolve the project and run `handler` against it. Engine connection
    /// and TLS failures come back as diagnosed `UserError`s.
    pub async fn dispatch<O, H>(
        &self,
        options: &InvocationOptions,
        handler: &H,
        command_options: &O,
    ) -> Result<(), DispatchError>
    where
        O: ?Sized + Sync,
        H: Handler<O> + ?Sized,
    {
        self.perform_command(options, handler, command_options)
            .await
            .map_err(|err| self.translate(err))
    }

    async fn perform_command<O, H>(
        &self,
        options: &InvocationOptions,
        handler: &H,
        command_options: &O,
    ) -> anyhow::Result<()>
    where
        O: ?Sized + Sync,
        H: Handler<O> + ?Sized,
    {
        if options.command == HELP_COMMAND {
            // help must work outside of any project
            return handler.handle(None, command_options).await;
        }

        let config_path = resolve_config_path(
            &self.base_dir,
            options.file.as_deref(),
            self.env.as_ref(),
            self.log.as_ref(),
        );
        let project = self
            .get_project(&config_path, options.project_name.as_deref(), options.verbose)
            .await?;

        handler.handle(Some(project), command_options).await
    }

    async fn get_project(
        &self,
        config_path: &Path,
        project_name: Option<&str>,
        verbose: bool,
    ) -> anyhow::Result<Project> {
        let name = resolve_project_name(
            config_path,
            project_name,
            self.env.as_ref(),
            self.log.as_ref(),
        );
        let config = load_config(config_path)?;
        let client = self.clients.build_client(verbose).await?;

        tracing::debug!(project = %name, config = %config_path.display(), "resolved project");
        Project::from_config(&name, &config, client)
            .map_err(|e| UserError::Generic(e.to_string()).into())
    }

    fn translate(&self, err: anyhow::Error) -> DispatchError {
        if let Some(user) = err.downcast_ref::<UserError>() {
            return DispatchError::User(user.clone());
        }

        let diagnosed = match err.downcast_ref::<EngineError>() {
            Some(EngineError::Tls(message)) => Some(UserError::Tls(message.clone())),
            Some(EngineError::Connection { base_url, .. }) => {
                Some(diagnose(self.locator.as_ref(), self.platform.as_ref(), base_url))
            }
            _ => None,
        };

        match diagnosed {
            Some(user) => DispatchError::User(user),
            None => DispatchError::Other(err),
        }
    }
}
