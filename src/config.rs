use crate::core::db::ConnectOptions;
use crate::core::{DbmanError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub logging: Option<LoggingConfig>,
}

/// Where to connect and as whom.
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    pub server: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub create_if_missing: Option<bool>,
}

/// Logging configuration for the command-line front end.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Config {
    /// Builds connector options from the `[connection]` table
    pub fn connect_options(&self) -> ConnectOptions {
        let connection = &self.connection;
        let mut options = ConnectOptions::new(&connection.server, &connection.database)
            .credentials(
                connection.user.clone().unwrap_or_default(),
                connection.password.clone().unwrap_or_default(),
            );
        if let Some(create) = connection.create_if_missing {
            options = options.create_if_missing(create);
        }
        options
    }

    /// Maximum log level; `warn` when unset.
    ///
    /// # Errors
    ///
    /// Returns `DbmanError::Config` for an unknown level name.
    pub fn log_level(&self) -> Result<Level> {
        match self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            Some(level) => level
                .parse::<Level>()
                .map_err(|_| DbmanError::Config(format!("unknown log level {:?}", level))),
            None => Ok(Level::WARN),
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| DbmanError::Config(format!("{}: {}", path.display(), e)))
}

/// `<config dir>/dbman/config.toml`, when the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dbman").join("config.toml"))
}
