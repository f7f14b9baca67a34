//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from front-end orchestration.
//! - Translate storage failures into a small set of domain errors.
//!
//! # Invariants
//! - Repository writes validate records before any SQL mutation.
//! - Every mutating call runs in one transaction that is either committed or
//!   rolled back before the call returns.
//! - Domain errors pass through unchanged; storage errors are wrapped once.

use crate::db::{ConstraintKind, Connector, DbError};
use crate::model::ValidationError;
use log::{error, warn};
use rusqlite::Transaction;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod catalog_repo;
pub mod market_repo;
pub mod sector_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by every repository in this crate.
#[derive(Debug)]
pub enum RepoError {
    /// Input failed record validation; nothing was sent to storage.
    Validation(ValidationError),
    /// Unique name already taken.
    AlreadyExists { entity: &'static str, name: String },
    /// Referenced row does not exist.
    NotFound { entity: &'static str, name: String },
    /// Row cannot be deleted while other rows reference it.
    StillReferenced { entity: &'static str, name: String },
    /// Storage failure while creating a row.
    Create {
        entity: &'static str,
        name: String,
        source: DbError,
    },
    /// Storage failure while updating a row.
    Update {
        entity: &'static str,
        name: String,
        source: DbError,
    },
    /// Storage failure while deleting a row.
    Delete {
        entity: &'static str,
        name: String,
        source: DbError,
    },
    /// Storage failure on a read path.
    Db(DbError),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error was raised by domain rules rather than storage.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::AlreadyExists { .. }
                | Self::NotFound { .. }
                | Self::StillReferenced { .. }
        )
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::AlreadyExists { .. } => "already_exists",
            Self::NotFound { .. } => "not_found",
            Self::StillReferenced { .. } => "still_referenced",
            Self::Create { .. } => "create_failed",
            Self::Update { .. } => "update_failed",
            Self::Delete { .. } => "delete_failed",
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExists { entity, name } => {
                write!(f, "{entity} with name '{name}' already exists")
            }
            Self::NotFound { entity, name } => write!(f, "{entity} '{name}' does not exist"),
            Self::StillReferenced { entity, name } => write!(
                f,
                "{entity} '{name}' cannot be deleted while other records still reference it"
            ),
            Self::Create {
                entity,
                name,
                source,
            } => write!(f, "failed to create {entity} '{name}': {source}"),
            Self::Update {
                entity,
                name,
                source,
            } => write!(f, "failed to update {entity} '{name}': {source}"),
            Self::Delete {
                entity,
                name,
                source,
            } => write!(f, "failed to delete {entity} '{name}': {source}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Create { source, .. }
            | Self::Update { source, .. }
            | Self::Delete { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::AlreadyExists { .. }
            | Self::NotFound { .. }
            | Self::StillReferenced { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Kind of mutation a write unit performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteKind {
    Create,
    Update,
    Delete,
}

impl WriteKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Identifies one write unit for error translation and logging.
pub(crate) struct WriteOp<'a> {
    pub kind: WriteKind,
    pub entity: &'static str,
    /// Key of the row being written (old name for renames).
    pub key: &'a str,
    /// Name that a unique-constraint violation refers to.
    pub unique_key: &'a str,
}

impl<'a> WriteOp<'a> {
    pub fn new(kind: WriteKind, entity: &'static str, key: &'a str) -> Self {
        Self {
            kind,
            entity,
            key,
            unique_key: key,
        }
    }

    pub fn with_unique_key(mut self, unique_key: &'a str) -> Self {
        self.unique_key = unique_key;
        self
    }

    /// Maps a failure raised inside the unit onto the domain taxonomy.
    fn translate(&self, err: RepoError) -> RepoError {
        let db = match err {
            RepoError::Db(db) => db,
            other => return other,
        };

        match (db.constraint_kind(), self.kind) {
            (Some(ConstraintKind::Unique), _) => RepoError::AlreadyExists {
                entity: self.entity,
                name: self.unique_key.to_string(),
            },
            (Some(ConstraintKind::ForeignKey), WriteKind::Delete) => RepoError::StillReferenced {
                entity: self.entity,
                name: self.key.to_string(),
            },
            (_, WriteKind::Create) => RepoError::Create {
                entity: self.entity,
                name: self.key.to_string(),
                source: db,
            },
            (_, WriteKind::Update) => RepoError::Update {
                entity: self.entity,
                name: self.key.to_string(),
                source: db,
            },
            (_, WriteKind::Delete) => RepoError::Delete {
                entity: self.entity,
                name: self.key.to_string(),
                source: db,
            },
        }
    }
}

/// Runs `work` in one session-scoped transaction.
///
/// Commits on success. On any failure the transaction is rolled back, the
/// failure is logged with operation and key, and translated by
/// [`WriteOp::translate`].
pub(crate) fn run_write<C, T, F>(connector: &C, op: WriteOp<'_>, work: F) -> RepoResult<T>
where
    C: Connector,
    F: FnOnce(&Transaction<'_>) -> RepoResult<T>,
{
    let started_at = Instant::now();
    let mut session = connector
        .get_session()
        .map_err(|err| log_failure(&op, started_at, op.translate(err.into())))?;
    let tx = session
        .begin()
        .map_err(|err| log_failure(&op, started_at, op.translate(err.into())))?;

    match work(&tx) {
        Ok(value) => match tx.commit() {
            Ok(()) => Ok(value),
            // A failed commit drops the transaction, which rolls it back.
            Err(err) => Err(log_failure(&op, started_at, op.translate(err.into()))),
        },
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=repo_rollback module=repo status=error op={} entity={} key={} error={}",
                    op.kind.as_str(),
                    op.entity,
                    op.key,
                    rollback_err
                );
            }
            Err(log_failure(&op, started_at, op.translate(err)))
        }
    }
}

fn log_failure(op: &WriteOp<'_>, started_at: Instant, err: RepoError) -> RepoError {
    if err.is_domain() {
        warn!(
            "event=repo_write module=repo status=rejected op={} entity={} key={} duration_ms={} error_code={} error={}",
            op.kind.as_str(),
            op.entity,
            op.key,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        );
    } else {
        error!(
            "event=repo_write module=repo status=error op={} entity={} key={} duration_ms={} error_code={} error={}",
            op.kind.as_str(),
            op.entity,
            op.key,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        );
    }
    err
}

#[cfg(test)]
mod tests {
    use super::{RepoError, WriteKind, WriteOp};
    use crate::db::DbError;
    use rusqlite::ffi;

    fn constraint_error(extended_code: i32) -> RepoError {
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some("constraint failed".to_string()),
        )))
    }

    #[test]
    fn unique_violation_becomes_already_exists_for_new_name() {
        let op = WriteOp::new(WriteKind::Update, "sector", "Old").with_unique_key("New");
        let err = op.translate(constraint_error(ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert!(matches!(err, RepoError::AlreadyExists { name, .. } if name == "New"));
    }

    #[test]
    fn foreign_key_violation_on_delete_becomes_still_referenced() {
        let op = WriteOp::new(WriteKind::Delete, "sector", "Energy");
        let err = op.translate(constraint_error(ffi::SQLITE_CONSTRAINT_FOREIGNKEY));
        assert!(matches!(err, RepoError::StillReferenced { name, .. } if name == "Energy"));
    }

    #[test]
    fn other_failures_are_wrapped_by_operation() {
        let op = WriteOp::new(WriteKind::Create, "sector", "Energy");
        let err = op.translate(constraint_error(ffi::SQLITE_IOERR));
        assert!(matches!(err, RepoError::Create { .. }));
        assert!(!err.is_domain());
    }

    #[test]
    fn domain_errors_pass_through_unchanged() {
        let op = WriteOp::new(WriteKind::Delete, "sector", "Energy");
        let err = op.translate(RepoError::NotFound {
            entity: "sector",
            name: "Energy".to_string(),
        });
        assert!(matches!(err, RepoError::NotFound { .. }));
    }
}
