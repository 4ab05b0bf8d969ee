use crate::env::EnvSource;
use crate::logging::LogSink;
use async_trait::async_trait;
use bollard::Docker;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use thiserror::Error;

pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

#[cfg(windows)]
pub const DEFAULT_DOCKER_HOST: &str = "npipe:////./pipe/docker_engine";
#[cfg(not(windows))]
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot connect to the Docker daemon at {base_url}: {message}")]
    Connection { base_url: String, message: String },

    #[error("{0}")]
    Tls(String),

    #[error("Docker API error: {0}")]
    Api(String),
}

const TLS_MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];
const CONNECT_MARKERS: [&str; 3] = [
    "socket not found",
    "error trying to connect",
    "client error (connect)",
];

/// Sort an engine failure into connection / TLS / API by walking its source
/// chain. I/O connect failures anywhere in the chain win. A response from the
/// engine is always `Api`, whatever its text says. TLS keywords are only
/// looked for in transport errors, never in bollard's own messages.
pub fn classify(err: &(dyn StdError + 'static), base_url: &str) -> EngineError {
    let mut messages: Vec<String> = Vec::new();
    let mut transport: Vec<String> = Vec::new();
    let mut connect_io = false;
    let mut current = Some(err);
    while let Some(e) = current {
        let msg = e.to_string();
        match e.downcast_ref::<bollard::errors::Error>() {
            Some(bollard::errors::Error::DockerResponseServerError { .. }) => {
                return EngineError::Api(msg);
            }
            Some(_) => {}
            None => {
                if let Some(io_err) = e.downcast_ref::<io::Error>() {
                    connect_io |= is_connect_failure(io_err.kind());
                }
                transport.push(msg.to_lowercase());
            }
        }
        if !messages.iter().any(|m| m.contains(&msg)) {
            messages.push(msg);
        }
        current = e.source();
    }

    let message = messages.join(": ");
    let tls = transport.iter().any(|t| TLS_MARKERS.iter().any(|m| t.contains(m)));
    let connect_text = CONNECT_MARKERS.iter().any(|m| message.to_lowercase().contains(m));

    if connect_io || (!tls && connect_text) {
        EngineError::Connection {
            base_url: base_url.to_string(),
            message,
        }
    } else if tls {
        EngineError::Tls(message)
    } else {
        EngineError::Api(message)
    }
}

fn is_connect_failure(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::TimedOut
    )
}

/// Ordered `(field, value)` pairs as reported by the engine's version endpoint.
pub type VersionInfo = Vec<(String, String)>;

pub fn render_version(info: &VersionInfo) -> String {
    info.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn version_fields(raw: &Value) -> VersionInfo {
    let Value::Object(map) = raw else {
        return vec![];
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), rendered)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "ServerVersion", default)]
    pub server_version: Option<String>,
    #[serde(rename = "Containers", default)]
    pub containers: Option<i64>,
    #[serde(rename = "ContainersRunning", default)]
    pub containers_running: Option<i64>,
    #[serde(rename = "Images", default)]
    pub images: Option<i64>,
}

/// The slice of the engine API the CLI talks to.
#[async_trait]
pub trait EngineClient: Send + Sync {
    fn base_url(&self) -> String;
    async fn ping(&self) -> Result<(), EngineError>;
    async fn version(&self) -> Result<VersionInfo, EngineError>;
    async fn info(&self) -> Result<EngineInfo, EngineError>;
}

#[async_trait]
impl EngineClient for Box<dyn EngineClient> {
    fn base_url(&self) -> String {
        (**self).base_url()
    }

    async fn ping(&self) -> Result<(), EngineError> {
        (**self).ping().await
    }

    async fn version(&self) -> Result<VersionInfo, EngineError> {
        (**self).version().await
    }

    async fn info(&self) -> Result<EngineInfo, EngineError> {
        (**self).info().await
    }
}

pub struct BollardClient {
    docker: Docker,
    base_url: String,
}

impl BollardClient {
    fn fail(&self, err: bollard::errors::Error) -> EngineError {
        classify(&err, &self.base_url)
    }
}

#[async_trait]
impl EngineClient for BollardClient {
    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    async fn ping(&self) -> Result<(), EngineError> {
        self.docker.ping().await.map_err(|e| self.fail(e))?;
        Ok(())
    }

    async fn version(&self) -> Result<VersionInfo, EngineError> {
        let version = self.docker.version().await.map_err(|e| self.fail(e))?;
        let raw = serde_json::to_value(&version).map_err(|e| EngineError::Api(e.to_string()))?;
        Ok(version_fields(&raw))
    }

    async fn info(&self) -> Result<EngineInfo, EngineError> {
        let info = self.docker.info().await.map_err(|e| self.fail(e))?;
        let raw = serde_json::to_value(&info).map_err(|e| EngineError::Api(e.to_string()))?;
        serde_json::from_value(raw).map_err(|e| EngineError::Api(e.to_string()))
    }
}

/// Opens the base (undecorated) engine client.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn EngineClient>, EngineError>;
}

/// Connects with bollard's defaults: `DOCKER_HOST` if set, else the local socket.
#[derive(Debug, Clone)]
pub struct BollardConnector {
    base_url: String,
}

impl BollardConnector {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self {
            base_url: env
                .non_empty(DOCKER_HOST_ENV)
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
        }
    }
}

impl Connector for BollardConnector {
    fn connect(&self) -> Result<Box<dyn EngineClient>, EngineError> {
        let docker = Docker::connect_with_defaults().map_err(|e| classify(&e, &self.base_url))?;
        Ok(Box::new(BollardClient {
            docker,
            base_url: self.base_url.clone(),
        }))
    }
}

pub struct ClientFactory {
    connector: Box<dyn Connector>,
    log: Arc<dyn LogSink>,
}

impl ClientFactory {
    pub fn new(connector: Box<dyn Connector>, log: Arc<dyn LogSink>) -> Self {
        Self { connector, log }
    }

    /// Connect to the engine. With `verbose`, report tool and engine versions
    /// and wrap the client so every call is logged.
    pub async fn build_client(&self, verbose: bool) -> Result<Box<dyn EngineClient>, EngineError> {
        let client = self.connector.connect()?;
        if !verbose {
            return Ok(client);
        }

        let version = client.version().await?;
        self.log
            .info(&format!("Compose version {}", env!("CARGO_PKG_VERSION")));
        self.log.info(&format!("Docker base_url: {}", client.base_url()));
        self.log
            .info(&format!("Docker version: {}", render_version(&version)));

        Ok(Box::new(VerboseProxy::new("docker", client, self.log.clone())))
    }
}

/// Transparent decorator: forwards every call unchanged and logs the call and
/// its outcome. `base_url` is a plain accessor and is not logged.
pub struct VerboseProxy<C> {
    name: String,
    inner: C,
    log: Arc<dyn LogSink>,
}

impl<C: EngineClient> VerboseProxy<C> {
    pub fn new(name: &str, inner: C, log: Arc<dyn LogSink>) -> Self {
        Self {
            name: name.to_string(),
            inner,
            log,
        }
    }

    fn log_call(&self, method: &str, args: &str) {
        self.log.info(&format!("{} {method} <- ({args})", self.name));
    }

    fn log_result<T: Debug>(&self, method: &str, result: &Result<T, EngineError>) {
        let rendered = match result {
            Ok(value) => format!("{value:?}"),
            Err(err) => format!("error: {err}"),
        };
        self.log.info(&format!("{} {method} -> {rendered}", self.name));
    }
}

#[async_trait]
impl<C: EngineClient> EngineClient for VerboseProxy<C> {
    fn base_url(&self) -> String {
        self.inner.base_url()
    }

    async fn ping(&self) -> Result<(), EngineError> {
        self.log_call("ping", "");
        let result = self.inner.ping().await;
        self.log_result("ping", &result);
        result
    }

    async fn version(&self) -> Result<VersionInfo, EngineError> {
        self.log_call("version", "");
        let result = self.inner.version().await;
        self.log_result("version", &result);
        result
    }

    async fn info(&self) -> Result<EngineInfo, EngineError> {
        self.log_call("info", "");
        let result = self.inner.info().await;
        self.log_result("info", &result);
        result
    }
}
