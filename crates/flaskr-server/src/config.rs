//! Server configuration loading from file and environment variables.

use flaskr_db::DbSettings;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Testing mode: internal error details are returned to the client
    /// instead of being masked.
    #[serde(default, alias = "TESTING")]
    pub testing: bool,

    /// Key used to sign session cookies.
    #[serde(default = "default_secret_key", alias = "SECRET_KEY")]
    pub secret_key: String,

    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings. Accepts either a table or a bare path string
    /// (`DATABASE = "flaskr.sqlite"`).
    #[serde(default, alias = "DATABASE")]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "DatabaseRepr")]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatabaseRepr {
    Path(String),
    Table {
        #[serde(default = "default_db_path")]
        path: String,
        #[serde(default = "default_busy_timeout_ms")]
        busy_timeout_ms: u64,
    },
}

impl From<DatabaseRepr> for DatabaseConfig {
    fn from(repr: DatabaseRepr) -> Self {
        match repr {
            DatabaseRepr::Path(path) => Self {
                path,
                busy_timeout_ms: default_busy_timeout_ms(),
            },
            DatabaseRepr::Table {
                path,
                busy_timeout_ms,
            } => Self {
                path,
                busy_timeout_ms,
            },
        }
    }
}

impl DatabaseConfig {
    /// Connection settings for a request context.
    pub fn settings(&self) -> DbSettings {
        DbSettings {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }

    /// Creates the directory holding the database file, if any.
    ///
    /// In-memory and bare-filename paths need nothing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created.
    pub fn ensure_parent_dir(&self) -> std::io::Result<()> {
        if self.path.is_empty() || self.path == ":memory:" {
            return Ok(());
        }
        match Path::new(&self.path).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flaskr_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "instance/flaskr.sqlite".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_secret_key() -> String {
    "dev".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            testing: false,
            secret_key: default_secret_key(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Configuration for tests: testing mode on, database at `db_path`.
    pub fn for_testing(db_path: impl Into<String>) -> Self {
        Self {
            testing: true,
            database: DatabaseConfig {
                path: db_path.into(),
                busy_timeout_ms: default_busy_timeout_ms(),
            },
            ..Self::default()
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// The TOML file was read.
    File,
    /// No file was given or it did not exist.
    Defaults,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `FLASKR_TESTING` overrides `testing` (set to "true" or "1" to enable)
/// - `FLASKR_SECRET_KEY` overrides `secret_key`
/// - `FLASKR_HOST` overrides `server.host`
/// - `FLASKR_PORT` overrides `server.port`
/// - `FLASKR_DATABASE` overrides `database.path`
/// - `FLASKR_LOG_LEVEL` overrides `logging.level`
/// - `FLASKR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<(Config, ConfigSource), ConfigError> {
    let (config, source) = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => (toml::from_str(&contents)?, ConfigSource::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Config::default(), ConfigSource::Defaults)
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => (Config::default(), ConfigSource::Defaults),
    };

    Ok((
        apply_env_overrides(config, |key| std::env::var(key).ok()),
        source,
    ))
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Applies `FLASKR_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(testing) = lookup("FLASKR_TESTING") {
        config.testing = is_truthy(&testing);
    }
    if let Some(key) = lookup("FLASKR_SECRET_KEY") {
        config.secret_key = key;
    }
    if let Some(host) = lookup("FLASKR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("FLASKR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = lookup("FLASKR_DATABASE") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("FLASKR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("FLASKR_LOG_JSON") {
        config.logging.json = is_truthy(&json);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let (config, source) =
            load_config(Some(&path.to_string_lossy())).expect("missing file is fine");
        assert_eq!(source, ConfigSource::Defaults);
        assert!(!config.testing);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.secret_key, "dev");
    }

    #[test]
    fn parses_flask_style_keys() {
        let config: Config = toml::from_str(
            r#"
            TESTING = true
            DATABASE = "/tmp/flaskr-test.sqlite"
            "#,
        )
        .expect("should parse");
        assert!(config.testing);
        assert_eq!(config.database.path, "/tmp/flaskr-test.sqlite");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
    }

    #[test]
    fn parses_sectioned_keys() {
        let config: Config = toml::from_str(
            r#"
            testing = false
            secret_key = "s3cret"

            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            path = "blog.sqlite"
            busy_timeout_ms = 250

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .expect("should parse");
        assert_eq!(config.secret_key, "s3cret");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.settings(), DbSettings {
            path: "blog.sqlite".to_string(),
            busy_timeout_ms: 250,
        });
        assert!(config.logging.json);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("FLASKR_TESTING", "1"),
            ("FLASKR_DATABASE", "override.sqlite"),
            ("FLASKR_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();
        let config = apply_env_overrides(Config::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert!(config.testing);
        assert_eq!(config.database.path, "override.sqlite");
        assert_eq!(config.server.port, 5000, "unparseable port is ignored");
    }

    #[test]
    fn reports_file_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flaskr.toml");
        std::fs::write(&path, "secret_key = \"from-file\"\n").expect("write config");
        let (config, source) = load_config(Some(&path.to_string_lossy())).expect("should load");
        assert_eq!(source, ConfigSource::File);
        assert!(!config.secret_key.is_empty());
    }

    #[test]
    fn ensure_parent_dir_creates_nested_instance_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("instance").join("nested").join("flaskr.sqlite");
        let config = DatabaseConfig {
            path: db_path.to_string_lossy().into_owned(),
            busy_timeout_ms: 5_000,
        };
        config.ensure_parent_dir().expect("should create");
        assert!(dir.path().join("instance").join("nested").is_dir());
        config.ensure_parent_dir().expect("existing dir is fine");
    }

    #[test]
    fn ensure_parent_dir_skips_memory_and_bare_names() {
        for path in [":memory:", "", "flaskr.sqlite"] {
            let config = DatabaseConfig {
                path: path.to_string(),
                busy_timeout_ms: 5_000,
            };
            config.ensure_parent_dir().expect("nothing to create");
        }
    }

    #[test]
    fn for_testing_enables_testing_mode() {
        let config = Config::for_testing("x.sqlite");
        assert!(config.testing);
        assert_eq!(config.database.path, "x.sqlite");
    }
}
