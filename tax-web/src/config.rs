//! Service configuration.
//!
//! Read from a TOML file; every section and key is optional. Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! shutdown_timeout_secs = 5
//! static_dir = "static"
//!
//! [storage]
//! backend = "memory"
//!
//! [export]
//! enabled = true
//! dir = "exports"
//! sheet = "tax-records"
//!
//! [logging]
//! level = "info"
//! file = "tax-calculator.log"
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tax_core::db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: DbConfig,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerSettings {
    /// Resolves `host` (an IP literal or a hostname such as `localhost`)
    /// and returns the first address found.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = || ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port));
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Spreadsheet export of every computed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    pub sheet: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("exports"),
            sheet: "tax-records".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins at startup.
    pub level: String,
    /// Append log output to this file as well as stdout.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
