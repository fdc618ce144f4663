use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelConfig;
use crate::error::{CalendarError, Result};
use crate::scheduler::{SchedulerConfig, MAX_HORIZON_SECS};
use crate::sender::SenderConfig;
use crate::storage::DatabaseConfig;

/// Default configuration file looked up by the CLI
pub const DEFAULT_CONFIG_PATH: &str = "calendar.toml";

/// Settings for every calendar service, one TOML section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub sender: SenderConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address for the HTTP server (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns the server bind address string (e.g., "127.0.0.1:8080").
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "a3s_calendar=debug")
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl CalendarConfig {
    /// Load configuration from `path`.
    /// Returns default config if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: CalendarConfig = toml::from_str(content)?;
        if config.scheduler.interval_secs == 0 {
            return Err(CalendarError::Config(
                "scheduler.interval_secs must be greater than zero".to_string(),
            ));
        }
        if config.scheduler.horizon_secs > MAX_HORIZON_SECS {
            return Err(CalendarError::Config(format!(
                "scheduler.horizon_secs must not exceed {}",
                MAX_HORIZON_SECS
            )));
        }
        Ok(config)
    }
}
