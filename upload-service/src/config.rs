//! Service configuration.
//!
//! Loaded once at startup from `<config-path>/simplerest.yaml`, with
//! `SIMPLEREST_*` environment variables layered on top, then passed by
//! reference to whatever needs it.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use shared::observability::{LogConfig, LogFormat};
use thiserror::Error;

use crate::storage::s3_client::S3Settings;

/// Base name of the configuration file, any supported extension
pub const CONFIG_NAME: &str = "simplerest";

/// Prefix for environment overrides, e.g. `SIMPLEREST_BIND_PORT`
pub const ENV_PREFIX: &str = "SIMPLEREST";

pub const AWS_SECRET_ID: &str = "AWS_SECRET_ID";
pub const AWS_SECRET_KEY: &str = "AWS_SECRET_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(&'static str),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing simplerest.yaml
    #[arg(long, env = "SIMPLEREST_CONFIG_PATH", default_value = "./configs")]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `":8080"`, `"8080"` or `"host:port"`
    pub bind_port: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Accepted for compatibility with existing config files; not used.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Accepted for compatibility with existing config files; not used.
    #[serde(default)]
    pub session_key: Option<String>,
    pub aws_bucket_name: String,
    /// Key prefix for uploaded objects, e.g. `pictures/`
    #[serde(default)]
    pub aws_pictures_folder_name: String,
    #[serde(default = "default_region")]
    pub aws_region: String,
    #[serde(default)]
    pub aws_endpoint_url: Option<String>,
    /// Send failure bodies with 200 instead of a 4xx/5xx status
    #[serde(default)]
    pub legacy_status_codes: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_region() -> String {
    "eu-central-1".to_string()
}

impl AppConfig {
    /// Read `simplerest.*` from `config_dir`, then apply environment overrides.
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let file = config_dir.join(CONFIG_NAME);
        let builder = config::Config::builder()
            .add_source(File::with_name(&file.to_string_lossy()).required(true))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ConfigResult<Self> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.aws_bucket_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("aws_bucket_name must not be empty".to_string()));
        }
        self.listen_address()?;
        Ok(())
    }

    /// Address to bind, with a bare port or `:port` meaning all interfaces.
    pub fn listen_address(&self) -> ConfigResult<String> {
        let raw = self.bind_port.trim();
        let address = match raw.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None if raw.parse::<u16>().is_ok() => format!("0.0.0.0:{raw}"),
            None => raw.to_string(),
        };

        let port_ok = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !port_ok {
            return Err(ConfigError::InvalidValue(format!("bind_port {raw:?}")));
        }
        Ok(address)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            filter: self.log_level.clone(),
            format: self.log_format,
            service_name: env!("CARGO_PKG_NAME").to_string(),
            ..Default::default()
        }
    }

    pub fn s3_settings(&self, credentials: AwsCredentials) -> S3Settings {
        S3Settings {
            region: self.aws_region.clone(),
            endpoint_url: self.aws_endpoint_url.clone(),
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
        }
    }
}

/// Static access key pair for the storage backend
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl AwsCredentials {
    /// Both `AWS_SECRET_ID` and `AWS_SECRET_KEY` must be set.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let access_key_id =
            lookup(AWS_SECRET_ID).ok_or(ConfigError::EnvVarNotFound(AWS_SECRET_ID))?;
        let secret_access_key =
            lookup(AWS_SECRET_KEY).ok_or(ConfigError::EnvVarNotFound(AWS_SECRET_KEY))?;
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}
