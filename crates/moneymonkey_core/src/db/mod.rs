//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Hand out raw connections and transactional sessions.
//! - Apply schema migrations in deterministic order.
//! - Gate application start on the schema being at the expected version.
//!
//! # Invariants
//! - Applied migrations are tracked as rows of `schema_migrations`.
//! - Core code must not read/write application data before the gate passes.

use crate::config::ConfigError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod connector;
pub mod gate;
pub mod migrations;

pub use connector::{Connector, Session, SqliteConnector};
pub use gate::{GateOutcome, MigrationGate};
pub use migrations::{MigrationRunner, MigrationTarget, SqliteMigrationRunner};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Config(ConfigError),
    /// Filesystem failure while preparing the database location.
    Io(std::io::Error),
    /// Database records a migration this binary does not know.
    UnknownSchemaVersion {
        db_version: String,
        latest_supported: &'static str,
    },
    /// Requested upgrade target is not a registered migration.
    UnknownMigration(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::UnknownSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version `{db_version}` is unknown to this build (latest supported `{latest_supported}`)"
            ),
            Self::UnknownMigration(version) => {
                write!(f, "no registered migration `{version}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnknownSchemaVersion { .. } => None,
            Self::UnknownMigration(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<ConfigError> for DbError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Storage failure classes the repository layer maps onto domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
}

impl DbError {
    /// Returns the violated constraint class, if this is a constraint failure.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Sqlite(err) => constraint_kind(err),
            _ => None,
        }
    }
}

/// Classifies a SQLite error by its extended result code.
pub fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    match failure.extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Some(ConstraintKind::Unique)
        }
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
        rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => Some(ConstraintKind::Check),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{constraint_kind, ConstraintKind, DbError};
    use rusqlite::Connection;

    fn reference_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(include_str!("migrations/0001_reference_schema.sql"))
            .unwrap();
        conn.execute_batch(include_str!("migrations/0002_market_schema.sql"))
            .unwrap();
        conn.execute_batch(
            "INSERT INTO sectors (id, name) VALUES (1, 'Energy');
             INSERT INTO industries (id, name, sector_id) VALUES (1, 'Oil & Gas', 1);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn classifies_failures_raised_by_the_migrated_schema() {
        let conn = reference_schema();

        let unique = conn
            .execute("INSERT INTO sectors (name) VALUES ('Energy');", [])
            .unwrap_err();
        assert_eq!(constraint_kind(&unique), Some(ConstraintKind::Unique));

        let referenced = conn
            .execute("DELETE FROM sectors WHERE id = 1;", [])
            .unwrap_err();
        assert_eq!(constraint_kind(&referenced), Some(ConstraintKind::ForeignKey));

        let dangling = conn
            .execute(
                "INSERT INTO industries (name, sector_id) VALUES ('Coal', 99);",
                [],
            )
            .unwrap_err();
        assert_eq!(constraint_kind(&dangling), Some(ConstraintKind::ForeignKey));

        let check = conn
            .execute(
                "INSERT INTO stocks (ticker, company_name, industry_id, price)
                 VALUES ('NEG', 'Negative Co', 1, -1);",
                [],
            )
            .unwrap_err();
        assert_eq!(
            DbError::from(check).constraint_kind(),
            Some(ConstraintKind::Check)
        );

        assert_eq!(constraint_kind(&rusqlite::Error::QueryReturnedNoRows), None);
    }
}
