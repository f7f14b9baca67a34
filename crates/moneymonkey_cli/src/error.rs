use moneymonkey_core::{ConfigError, DbError, LoggingError, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures that end the process, each with its own exit code.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    /// Migration gate failed; nothing else may run.
    Startup(DbError),
    Repo(RepoError),
    /// An admin action was rejected; the message was already printed.
    Rejected,
    Io(std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Logging(_) => 2,
            Self::Startup(_) => 3,
            Self::Repo(_) => 4,
            Self::Rejected => 1,
            Self::Io(_) => 10,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Startup(err) => write!(f, "Database setup failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Rejected => write!(f, "action rejected"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Startup(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Rejected => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
