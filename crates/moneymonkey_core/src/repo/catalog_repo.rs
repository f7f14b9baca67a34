//! Industry and metric-name catalog access.
//!
//! # Responsibility
//! - Read the seeded taxonomy below the sector level.
//! - Attach new industries to an existing sector.
//!
//! # Invariants
//! - Industries are listed per sector in insertion order.
//! - An industry always references exactly one existing sector.

use super::{run_write, RepoError, RepoResult, WriteKind, WriteOp};
use crate::db::Connector;
use crate::model::{validate_name, Industry, RowId, Validatable, NAME_MAX_CHARS};
use rusqlite::OptionalExtension;

/// Read/insert interface for the reference catalog below sectors.
pub trait CatalogRepository {
    /// Lists industry names of `sector` in insertion order.
    fn list_industries(&self, sector: &str) -> RepoResult<Vec<String>>;
    /// Creates one industry under `sector` and returns its id.
    fn create_industry(&self, sector: &str, name: &str) -> RepoResult<RowId>;
    /// Lists metric names in insertion order.
    fn list_metric_names(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'c, C: Connector> {
    connector: &'c C,
}

impl<'c, C: Connector> SqliteCatalogRepository<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> CatalogRepository for SqliteCatalogRepository<'_, C> {
    fn list_industries(&self, sector: &str) -> RepoResult<Vec<String>> {
        let session = self.connector.get_session()?;
        let conn = session.connection();
        let sector_id: Option<RowId> = conn
            .query_row("SELECT id FROM sectors WHERE name = ?1;", [sector], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(sector_id) = sector_id else {
            return Err(RepoError::NotFound {
                entity: "sector",
                name: sector.to_string(),
            });
        };

        let mut stmt =
            conn.prepare("SELECT name FROM industries WHERE sector_id = ?1 ORDER BY id ASC;")?;
        let mut rows = stmt.query([sector_id])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get("name")?);
        }
        Ok(names)
    }

    fn create_industry(&self, sector: &str, name: &str) -> RepoResult<RowId> {
        validate_name(name, NAME_MAX_CHARS)?;

        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "industry", name),
            |tx| {
                let sector_id: RowId = tx
                    .query_row("SELECT id FROM sectors WHERE name = ?1;", [sector], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or_else(|| RepoError::NotFound {
                        entity: "sector",
                        name: sector.to_string(),
                    })?;
                let industry = Industry::new(name, sector_id)?;

                tx.execute(
                    "INSERT INTO industries (name, sector_id) VALUES (?1, ?2);",
                    rusqlite::params![industry.name(), industry.sector_id],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn list_metric_names(&self) -> RepoResult<Vec<String>> {
        let session = self.connector.get_session()?;
        let mut stmt = session
            .connection()
            .prepare("SELECT name FROM metric_names ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get("name")?);
        }
        Ok(names)
    }
}
