use crate::core::{OralabError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
///
/// Every field has a default, so a missing configuration file yields a
/// usable configuration. Credentials can be supplied through environment
/// variables instead of the file (`ORALAB_DB_USER`, `ORALAB_DB_PASSWORD`,
/// `ORALAB_DB_CONNECT`) so they never have to be written to disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Database connection configuration.
///
/// The account is expected to be an ordinary least-privilege user with
/// read access to the sample schema and the data dictionary views the
/// routes consult. Elevated accounts are never required.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub connect_string: String,
    pub user: String,
    pub password: String,
    /// Schema whose tables the table-listing routes expose.
    pub sample_schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            connect_string: "localhost:1521/xe".to_string(),
            user: "oralab".to_string(),
            password: String::new(),
            sample_schema: "HR".to_string(),
        }
    }
}

impl Config {
    /// Applies `ORALAB_*` environment overrides on top of the file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(user) = env::var("ORALAB_DB_USER") {
            self.database.user = user;
        }
        if let Ok(password) = env::var("ORALAB_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Ok(connect) = env::var("ORALAB_DB_CONNECT") {
            self.database.connect_string = connect;
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// A missing file yields the defaults; a present but malformed file is a
/// configuration error. Environment overrides are applied in both cases.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let mut config = if path.as_ref().exists() {
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| OralabError::Config(format!("{}: {}", path.as_ref().display(), e)))?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}
