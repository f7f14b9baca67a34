//! Process configuration built once at startup.
//!
//! # Responsibility
//! - Read database and logging settings from the environment.
//! - Hand one explicit `AppConfig` value to every component that needs it.
//!
//! # Invariants
//! - `DB_DATABASE` is required; every other key has a default.
//! - `DB_PORT` must parse as a TCP port.
//! - The password is never rendered by `Debug` or `summary()`.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

/// Identifier of the newest migration this binary expects to find applied.
pub const LATEST_MIGRATION_VERSION: &str = "0003_reference_seed";

pub const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DATA_DIR: &str = "data";
const DATABASE_FILE_EXTENSION: &str = "sqlite3";

pub const ENV_RUNNING_IN_DOCKER: &str = "RUNNING_IN_DOCKER";
pub const ENV_DB_HOST_DOCKER: &str = "DB_HOST_DOCKER";
pub const ENV_DB_HOST_VENV: &str = "DB_HOST_VENV";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_DATABASE: &str = "DB_DATABASE";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "MONEYMONKEY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MONEYMONKEY_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required key is absent or blank.
    Missing(&'static str),
    /// Key is present but cannot be used.
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required configuration `{key}`"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid configuration `{key}`=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Database connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Host chosen from the docker/venv pair.
    pub host: String,
    pub user: String,
    pub password: String,
    /// Database name; also names the SQLite file inside `data_dir`.
    pub database: String,
    pub port: u16,
    /// Directory holding the database file.
    pub data_dir: PathBuf,
}

impl DbConfig {
    /// Builds a config pointing at `database` inside `data_dir`.
    ///
    /// Network fields take their defaults.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, database: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            user: String::new(),
            password: String::new(),
            database: database.into(),
            port: DEFAULT_DB_PORT,
            data_dir: data_dir.into(),
        }
    }

    /// Path of the database file this configuration resolves to.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{DATABASE_FILE_EXTENSION}", self.database))
    }

    /// Connection target rendered for diagnostics, without credentials.
    pub fn connection_label(&self) -> String {
        if self.user.is_empty() {
            format!("{}:{}/{}", self.host, self.port, self.database)
        } else {
            format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
        }
    }
}

impl Debug for DbConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// Application-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db: DbConfig,
    /// Migration identifier the gate compares against.
    pub latest_migration_version: String,
    /// Log level name accepted by `init_logging`.
    pub log_level: String,
    /// Absolute directory for log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Builds a config around `db` with embedded defaults for everything else.
    pub fn new(db: DbConfig) -> Self {
        Self {
            db,
            latest_migration_version: LATEST_MIGRATION_VERSION.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }

    /// Reads configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a key to its value.
    ///
    /// # Errors
    /// - `Missing` when `DB_DATABASE` is absent or blank.
    /// - `Invalid` when `DB_PORT` is not a valid port.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let in_docker = read(ENV_RUNNING_IN_DOCKER).as_deref() == Some("true");
        let host_key = if in_docker {
            ENV_DB_HOST_DOCKER
        } else {
            ENV_DB_HOST_VENV
        };
        let host = read(host_key).unwrap_or_else(|| DEFAULT_DB_HOST.to_string());

        let database = read(ENV_DB_DATABASE).ok_or(ConfigError::Missing(ENV_DB_DATABASE))?;
        let port = match read(ENV_DB_PORT) {
            Some(value) => parse_port(&value)?,
            None => DEFAULT_DB_PORT,
        };

        let db = DbConfig {
            host,
            user: read(ENV_DB_USER).unwrap_or_default(),
            // Passwords may legitimately carry surrounding spaces.
            password: lookup(ENV_DB_PASSWORD).unwrap_or_default(),
            database,
            port,
            data_dir: PathBuf::from(
                read(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
        };

        let mut config = Self::new(db);
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        Ok(config)
    }

    /// One-line description used as failure context in logs.
    pub fn summary(&self) -> String {
        format!(
            "target={} db_path={} expected_version={}",
            self.db.connection_label(),
            self.db.database_path().display(),
            self.latest_migration_version
        )
    }
}

fn parse_port(value: &str) -> ConfigResult<u16> {
    value.parse::<u16>().map_err(|err| ConfigError::Invalid {
        key: ENV_DB_PORT,
        value: value.to_string(),
        reason: err.to_string(),
    })
}
