//! Resolved project: a named set of services bound to an engine client.

use crate::docker::EngineClient;
use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub image: Option<String>,
    pub build: Option<String>,
}

pub struct Project {
    pub name: String,
    pub services: Vec<Service>,
    pub client: Box<dyn EngineClient>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("services", &self.services)
            .field("engine", &self.client.base_url())
            .finish()
    }
}

impl Project {
    pub fn from_config(
        name: &str,
        config: &Value,
        client: Box<dyn EngineClient>,
    ) -> Result<Self, ConfigError> {
        let Value::Mapping(map) = config else {
            return Err(ConfigError(
                "Top level object needs to be a dictionary. Check your .yml file \
                 that you have defined a service at the top level."
                    .to_string(),
            ));
        };

        let mut services = Vec::with_capacity(map.len());
        for (key, body) in map {
            let service_name = match key {
                Value::String(s) => s.clone(),
                other => scalar_text(other),
            };
            services.push(service_from_config(&service_name, body)?);
        }

        Ok(Self {
            name: name.to_string(),
            services,
            client,
        })
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }
}

fn service_from_config(name: &str, body: &Value) -> Result<Service, ConfigError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError(format!(
            "Invalid service name \"{name}\" - only [a-zA-Z0-9] are allowed"
        )));
    }

    let Value::Mapping(fields) = body else {
        return Err(ConfigError(format!(
            "Service \"{name}\" doesn't have any configuration options. \
             All top level keys in your docker-compose.yml must map to a dictionary \
             of configuration options."
        )));
    };

    let image = fields.get("image").map(scalar_text);
    let build = fields.get("build").map(scalar_text);

    match (&image, &build) {
        (Some(_), Some(_)) => Err(ConfigError(format!(
            "Service {name} has both an image and build path specified. \
             A service can either be built to image or use an existing image, not both."
        ))),
        (None, None) => Err(ConfigError(format!(
            "Service {name} has neither an image nor a build path specified. \
             Exactly one must be provided."
        ))),
        _ => Ok(Service {
            name: name.to_string(),
            image,
            build,
        }),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
