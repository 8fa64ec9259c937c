//! Configuration loading
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error. A config file named
//! explicitly (CLI or `JUKEVOTE_CONFIG`) must exist and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_CONFIG: &str = "JUKEVOTE_CONFIG";
pub const ENV_STORAGE: &str = "JUKEVOTE_STORAGE";
pub const ENV_DATABASE: &str = "JUKEVOTE_DATABASE";
pub const ENV_HOST: &str = "JUKEVOTE_HOST";
pub const ENV_PORT: &str = "JUKEVOTE_PORT";

pub const DEFAULT_DATABASE_PATH: &str = "songs.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Where songs are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process lifetime only
    Memory,
    /// Single-table SQLite file
    #[default]
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("unknown storage backend '{}' (expected memory or sqlite)", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub storage: Option<StorageBackend>,
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub logging: LoggingConfig,
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

impl TomlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }
}

/// Command-line overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub storage: Option<StorageBackend>,
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageBackend,
    /// Relative paths resolve against the working directory
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            config_file: None,
        }
    }
}

impl Config {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let config_file = locate_config_file(overrides.config_file.clone())?;
        let toml_config = match &config_file {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };

        let defaults = Config::default();

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => match env_var(ENV_STORAGE) {
                Some(value) => value.parse().map_err(Error::Config)?,
                None => toml_config.storage.unwrap_or(defaults.storage),
            },
        };

        let database_path = overrides
            .database_path
            .or_else(|| env_var(ENV_DATABASE).map(PathBuf::from))
            .or(toml_config.database_path)
            .unwrap_or(defaults.database_path);

        let host = overrides
            .host
            .or_else(|| env_var(ENV_HOST))
            .or(toml_config.host)
            .unwrap_or(defaults.host);

        let port = match overrides.port {
            Some(port) => port,
            None => match env_var(ENV_PORT) {
                Some(value) => value
                    .parse()
                    .map_err(|_| Error::Config(format!("{} is not a valid port: {}", ENV_PORT, value)))?,
                None => toml_config.port.unwrap_or(defaults.port),
            },
        };

        let log_level = overrides
            .log_level
            .or(toml_config.logging.level)
            .unwrap_or(defaults.log_level);

        Ok(Config {
            storage,
            database_path,
            host,
            port,
            log_level,
            config_file,
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Explicit file (CLI, then env) or the per-user default if it exists
fn locate_config_file(cli_path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_path.or_else(|| env_var(ENV_CONFIG).map(PathBuf::from)) {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        return Ok(Some(path));
    }

    Ok(default_config_path().filter(|path| path.exists()))
}

/// `<config_dir>/jukevote/config.toml` for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jukevote").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert_eq!("SQLite".parse::<StorageBackend>(), Ok(StorageBackend::Sqlite));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_toml_config_partial() {
        let config: TomlConfig = toml::from_str(
            r#"
            storage = "memory"
            port = 8080

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage, Some(StorageBackend::Memory));
        assert_eq!(config.port, Some(8080));
        assert!(config.database_path.is_none());
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_toml_config_rejects_unknown_keys() {
        assert!(toml::from_str::<TomlConfig>("prot = 8080").is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }
}
