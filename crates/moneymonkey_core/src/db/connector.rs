//! Connection and session provider for SQLite.
//!
//! # Responsibility
//! - Open raw connections for version-marker reads.
//! - Build the session factory once and hand out one session per caller.
//!
//! # Invariants
//! - Sessions have `foreign_keys=ON` and a busy timeout.
//! - Sessions never commit or roll back on the caller's behalf.

use super::DbResult;
use crate::config::DbConfig;
use log::{debug, error, info, log, Level};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Supplies raw connections and transactional sessions.
pub trait Connector {
    /// Opens a new raw connection to the configured database.
    fn get_connection(&self) -> DbResult<Connection>;
    /// Returns a new session bound to the shared session factory.
    fn get_session(&self) -> DbResult<Session>;
}

/// One unit of work against the database.
///
/// Callers open transactions explicitly through [`Session::begin`].
pub struct Session {
    conn: Connection,
}

impl Session {
    /// Read access outside of an explicit transaction.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Starts an immediate transaction; dropping it without commit rolls back.
    pub fn begin(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

struct SessionFactory {
    path: PathBuf,
}

impl SessionFactory {
    fn build(config: &DbConfig) -> DbResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        Ok(Self {
            path: config.database_path(),
        })
    }

    fn open(&self) -> DbResult<Session> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Session { conn })
    }
}

/// SQLite-backed connector built from [`DbConfig`].
pub struct SqliteConnector {
    config: DbConfig,
    factory: OnceCell<SessionFactory>,
}

impl SqliteConnector {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            factory: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

impl Connector for SqliteConnector {
    /// # Side effects
    /// - Emits `db_connect` error events with duration on failure.
    fn get_connection(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        let path = self.config.database_path();

        let conn = match Connection::open(&path) {
            Ok(conn) => conn,
            Err(err) => {
                log!(
                    open_failure_level(&self.config.data_dir),
                    "event=db_connect module=db status=error target={} duration_ms={} error_code=db_open_failed error={}",
                    self.config.connection_label(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;

        debug!(
            "event=db_connect module=db status=ok target={} duration_ms={}",
            self.config.connection_label(),
            started_at.elapsed().as_millis()
        );
        Ok(conn)
    }

    fn get_session(&self) -> DbResult<Session> {
        let factory = self.factory.get_or_try_init(|| -> DbResult<SessionFactory> {
            let factory = SessionFactory::build(&self.config).inspect_err(|err| {
                error!(
                    "event=session_factory module=db status=error target={} error_code=factory_build_failed error={}",
                    self.config.connection_label(),
                    err
                );
            })?;
            info!(
                "event=session_factory module=db status=ok target={} path={}",
                self.config.connection_label(),
                factory.path.display()
            );
            Ok(factory)
        })?;

        factory.open().inspect_err(|err| {
            error!(
                "event=session_open module=db status=error target={} error_code=session_open_failed error={}",
                self.config.connection_label(),
                err
            );
        })
    }
}

/// A missing data directory is the normal first-run state; sessions create it.
fn open_failure_level(data_dir: &Path) -> Level {
    if data_dir.is_dir() {
        Level::Error
    } else {
        Level::Warn
    }
}

#[cfg(test)]
mod tests {
    use super::{open_failure_level, Connector, SqliteConnector};
    use log::Level;
    use crate::config::DbConfig;

    #[test]
    fn session_enables_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::new(DbConfig::for_data_dir(dir.path(), "unit"));

        let session = connector.get_session().unwrap();
        let enabled: i64 = session
            .connection()
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn session_factory_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let connector = SqliteConnector::new(DbConfig::for_data_dir(&nested, "unit"));

        connector.get_session().unwrap();
        assert!(nested.join("unit.sqlite3").exists());
    }

    #[test]
    fn first_run_without_data_dir_is_a_warning_until_a_session_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let connector = SqliteConnector::new(DbConfig::for_data_dir(missing, "unit"));

        assert!(connector.get_connection().is_err());
        assert_eq!(open_failure_level(&connector.config().data_dir), Level::Warn);

        connector.get_session().unwrap();
        assert_eq!(open_failure_level(&connector.config().data_dir), Level::Error);
        assert!(connector.get_connection().is_ok());
    }

    #[test]
    fn each_session_is_independent() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::new(DbConfig::for_data_dir(dir.path(), "unit"));

        let mut first = connector.get_session().unwrap();
        first
            .connection()
            .execute_batch("CREATE TABLE scratch (id INTEGER PRIMARY KEY);")
            .unwrap();
        {
            let tx = first.begin().unwrap();
            tx.execute("INSERT INTO scratch (id) VALUES (1);", []).unwrap();
            tx.rollback().unwrap();
        }

        let second = connector.get_session().unwrap();
        let count: i64 = second
            .connection()
            .query_row("SELECT COUNT(*) FROM scratch;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
