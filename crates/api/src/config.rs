// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Service configuration
//!
//! Sources, later overriding earlier:
//! 1. built-in defaults
//! 2. `config.json`, then `config.{environment}.json` (both optional)
//! 3. `SERVER_*` environment variables, nested keys joined with `__`
//!
//! `ENVIRONMENT` selects the environment-specific file and overrides the
//! `environment` key. The merged values are validated as a whole, since port 0
//! is only acceptable when testing.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Result, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

/// Artifact location used when none is configured
pub const DEFAULT_ARTIFACT_PATH: &str = "models/model.json";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// A listening port checked against the environment it is used in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPort(u16);

impl ServerPort {
    /// Validate `port` for `environment`
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 outside of testing
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        ensure!(
            port != 0 || environment == Environment::Testing,
            "port cannot be 0 in the {environment} environment"
        );
        Ok(Self(port))
    }

    /// Port value
    pub fn value(self) -> u16 {
        self.0
    }
}

/// Per-request timeout, between 1 and 300 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Validate a timeout given in whole seconds
    ///
    /// # Errors
    ///
    /// Returns an error if `seconds` is 0 or above 300
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(
            seconds <= MAX_TIMEOUT_SECONDS,
            "timeout cannot exceed {MAX_TIMEOUT_SECONDS} seconds"
        );
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Timeout as a duration
    pub fn value(self) -> Duration {
        self.0
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Merged configuration before validation
#[derive(Debug, Deserialize)]
struct RawServerConfig {
    host: IpAddr,
    port: u16,
    timeout_seconds: u64,
    environment: Environment,
    artifact_path: PathBuf,
}

/// Validated service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening address
    pub host: IpAddr,
    /// Listening port
    pub port: ServerPort,
    /// Per-request timeout
    pub timeout_seconds: TimeoutSeconds,
    /// Deployment environment
    pub environment: Environment,
    /// Location of the fitted pipeline artifact
    pub artifact_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort(DEFAULT_PORT),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        }
    }
}

impl TryFrom<RawServerConfig> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawServerConfig) -> Result<Self> {
        ensure!(
            raw.artifact_path.file_name().is_some(),
            "artifact_path '{}' does not name a file",
            raw.artifact_path.display()
        );

        Ok(Self {
            host: raw.host,
            port: ServerPort::new(raw.port, raw.environment)?,
            timeout_seconds: TimeoutSeconds::new(raw.timeout_seconds)?,
            environment: raw.environment,
            artifact_path: raw.artifact_path,
        })
    }
}

impl ServerConfig {
    /// Load and validate configuration from files and the process environment
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if a source cannot be read or a value is invalid.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Merge every configuration source and validate the result
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT").ok().map(|e| e.to_lowercase());
        let file_suffix = environment.as_deref().unwrap_or("development");

        let mut builder = Self::defaults()?
            .add_source(File::with_name("config.json").required(false))
            .add_source(File::with_name(&format!("config.{file_suffix}.json")).required(false))
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        if let Some(environment) = environment {
            builder = builder.set_override("environment", environment)?;
        }

        Self::from_config(builder.build()?)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", DEFAULT_PORT)?
            .set_default("timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default("environment", "development")?
            .set_default("artifact_path", DEFAULT_ARTIFACT_PATH)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawServerConfig = config.try_deserialize()?;
        Self::try_from(raw).map_err(|e| ConfigError::Message(e.to_string()))
    }

    /// Configuration for tests: loopback, OS-assigned port, short timeout
    pub fn for_testing() -> Self {
        Self {
            port: ServerPort(0),
            timeout_seconds: TimeoutSeconds(Duration::from_secs(5)),
            environment: Environment::Testing,
            ..Self::default()
        }
    }

    /// Serve the artifact at `artifact_path` instead of the configured one
    #[must_use]
    pub fn with_artifact_path(mut self, artifact_path: impl Into<PathBuf>) -> Self {
        self.artifact_path = artifact_path.into();
        self
    }

    /// Address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}
