//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing identifier order.
//! - Apply pending migrations atomically up to a target.
//!
//! # Invariants
//! - `version` identifiers sort lexicographically in application order.
//! - Every applied migration leaves one row in `schema_migrations`.
//! - A recorded version unknown to this binary is an error, never skipped.

use crate::db::{Connector, DbError, DbResult};
use log::info;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod seed;

/// Table recording applied migration identifiers.
pub const VERSION_TABLE: &str = "schema_migrations";

#[derive(Clone, Copy)]
enum MigrationStep {
    Sql(&'static str),
    Seed(fn(&Transaction<'_>) -> DbResult<()>),
}

#[derive(Clone, Copy)]
struct Migration {
    version: &'static str,
    step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_reference_schema",
        step: MigrationStep::Sql(include_str!("0001_reference_schema.sql")),
    },
    Migration {
        version: "0002_market_schema",
        step: MigrationStep::Sql(include_str!("0002_market_schema.sql")),
    },
    Migration {
        version: "0003_reference_seed",
        step: MigrationStep::Seed(seed::seed_reference_data),
    },
];

/// Returns the newest migration identifier known by this binary ("head").
pub fn latest_version() -> &'static str {
    MIGRATIONS.last().map_or("", |migration| migration.version)
}

/// Returns every registered migration identifier in application order.
pub fn known_versions() -> Vec<&'static str> {
    MIGRATIONS.iter().map(|migration| migration.version).collect()
}

/// Reads the most recently applied migration identifier.
///
/// Returns `Ok(None)` when the version table holds no rows.
///
/// # Errors
/// - Fails when the version table is missing or unreadable.
pub fn current_version(conn: &Connection) -> DbResult<Option<String>> {
    let version = conn
        .query_row(
            &format!("SELECT version_num FROM {VERSION_TABLE} ORDER BY version_num DESC LIMIT 1;"),
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(version)
}

/// Upgrade destination for a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTarget {
    /// Newest registered migration.
    Head,
    /// Apply up to and including this identifier.
    Version(String),
}

impl Display for MigrationTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Version(version) => write!(f, "{version}"),
        }
    }
}

/// Executes ordered schema changes against a database.
pub trait MigrationRunner {
    /// Applies pending migrations up to `target`.
    ///
    /// Returns the identifiers applied by this call, in order.
    fn upgrade(&self, target: &MigrationTarget) -> DbResult<Vec<&'static str>>;
}

/// Runs the registered migrations through a [`Connector`] session.
pub struct SqliteMigrationRunner<'c, C: Connector> {
    connector: &'c C,
}

impl<'c, C: Connector> SqliteMigrationRunner<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> MigrationRunner for SqliteMigrationRunner<'_, C> {
    /// # Side effects
    /// - Applies all pending migrations inside one transaction.
    /// - Emits `migration_apply` events per applied migration.
    fn upgrade(&self, target: &MigrationTarget) -> DbResult<Vec<&'static str>> {
        let target_index = resolve_target(target)?;
        let mut session = self.connector.get_session()?;
        let tx = session.begin()?;

        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (
                version_num TEXT PRIMARY KEY NOT NULL
            );"
        ))?;

        let applied = applied_versions(&tx)?;
        if let Some(unknown) = applied
            .iter()
            .find(|version| !MIGRATIONS.iter().any(|m| m.version == version.as_str()))
        {
            return Err(DbError::UnknownSchemaVersion {
                db_version: unknown.clone(),
                latest_supported: latest_version(),
            });
        }

        let mut newly_applied = Vec::new();
        for migration in &MIGRATIONS[..=target_index] {
            if applied.contains(migration.version) {
                continue;
            }

            let started_at = Instant::now();
            match migration.step {
                MigrationStep::Sql(sql) => tx.execute_batch(sql)?,
                MigrationStep::Seed(apply) => apply(&tx)?,
            }
            tx.execute(
                &format!("INSERT INTO {VERSION_TABLE} (version_num) VALUES (?1);"),
                [migration.version],
            )?;
            info!(
                "event=migration_apply module=db status=ok version={} duration_ms={}",
                migration.version,
                started_at.elapsed().as_millis()
            );
            newly_applied.push(migration.version);
        }

        tx.commit()?;
        Ok(newly_applied)
    }
}

fn resolve_target(target: &MigrationTarget) -> DbResult<usize> {
    match target {
        MigrationTarget::Head if MIGRATIONS.is_empty() => {
            Err(DbError::UnknownMigration("head".to_string()))
        }
        MigrationTarget::Head => Ok(MIGRATIONS.len() - 1),
        MigrationTarget::Version(version) => MIGRATIONS
            .iter()
            .position(|migration| migration.version == version.as_str())
            .ok_or_else(|| DbError::UnknownMigration(version.clone())),
    }
}

fn applied_versions(conn: &Connection) -> DbResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("SELECT version_num FROM {VERSION_TABLE};"))?;
    let mut rows = stmt.query([])?;
    let mut versions = BTreeSet::new();
    while let Some(row) = rows.next()? {
        versions.insert(row.get::<_, String>(0)?);
    }
    Ok(versions)
}
