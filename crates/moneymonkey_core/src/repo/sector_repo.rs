//! Sector repository contracts, SQLite implementation and in-memory double.
//!
//! # Responsibility
//! - Provide list/exists/create/rename/delete over the `sectors` table.
//! - Surface uniqueness and reference conflicts as typed domain errors.
//!
//! # Invariants
//! - Names are validated before existence checks or SQL mutations.
//! - Listing is ordered by insertion (`id ASC`).
//! - Deleting a sector that still owns industries fails with
//!   `RepoError::StillReferenced`; nothing cascades.
//! - Callers trim user input; this layer compares names exactly.

use super::{run_write, RepoError, RepoResult, WriteKind, WriteOp};
use crate::db::{Connector, DbError};
use crate::model::{Sector, Validatable};
use log::error;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

const ENTITY: &str = "sector";

/// Repository interface for sector CRUD operations.
pub trait SectorRepository {
    /// Lists sector names in insertion order.
    fn list_sectors(&self) -> RepoResult<Vec<String>>;
    /// Returns whether a sector with exactly `name` exists.
    fn sector_exists(&self, name: &str) -> RepoResult<bool>;
    fn create_sector(&self, name: &str) -> RepoResult<()>;
    /// Renames `old_name` to `new_name`.
    fn update_sector(&self, old_name: &str, new_name: &str) -> RepoResult<()>;
    fn delete_sector(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed sector repository.
///
/// Each call opens its own session from the connector.
pub struct SqliteSectorRepository<'c, C: Connector> {
    connector: &'c C,
}

impl<'c, C: Connector> SqliteSectorRepository<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> SectorRepository for SqliteSectorRepository<'_, C> {
    fn list_sectors(&self) -> RepoResult<Vec<String>> {
        let read = || -> RepoResult<Vec<String>> {
            let session = self.connector.get_session()?;
            let mut stmt = session
                .connection()
                .prepare("SELECT name FROM sectors ORDER BY id ASC;")?;
            let mut rows = stmt.query([])?;
            let mut names = Vec::new();
            while let Some(row) = rows.next()? {
                names.push(row.get("name")?);
            }
            Ok(names)
        };

        read().inspect_err(|err| {
            error!(
                "event=sector_list module=repo status=error error_code=list_failed error={}",
                err
            );
        })
    }

    fn sector_exists(&self, name: &str) -> RepoResult<bool> {
        let session = self.connector.get_session()?;
        let exists: i64 = session.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM sectors WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_sector(&self, name: &str) -> RepoResult<()> {
        let sector = Sector::new(name)?;
        if self.sector_exists(sector.name())? {
            return Err(RepoError::AlreadyExists {
                entity: ENTITY,
                name: name.to_string(),
            });
        }

        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, ENTITY, name),
            |tx| {
                tx.execute("INSERT INTO sectors (name) VALUES (?1);", [sector.name()])?;
                Ok(())
            },
        )
    }

    fn update_sector(&self, old_name: &str, new_name: &str) -> RepoResult<()> {
        let renamed = Sector::new(new_name)?;
        if self.sector_exists(renamed.name())? {
            return Err(RepoError::AlreadyExists {
                entity: ENTITY,
                name: new_name.to_string(),
            });
        }

        run_write(
            self.connector,
            WriteOp::new(WriteKind::Update, ENTITY, old_name).with_unique_key(new_name),
            |tx| {
                let changed = tx.execute(
                    "UPDATE sectors SET name = ?2 WHERE name = ?1;",
                    [old_name, renamed.name()],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: ENTITY,
                        name: old_name.to_string(),
                    });
                }
                Ok(())
            },
        )
    }

    fn delete_sector(&self, name: &str) -> RepoResult<()> {
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Delete, ENTITY, name),
            |tx| {
                let changed = tx.execute("DELETE FROM sectors WHERE name = ?1;", [name])?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: ENTITY,
                        name: name.to_string(),
                    });
                }
                Ok(())
            },
        )
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    /// `(id, name)` in insertion order.
    sectors: Vec<(i64, String)>,
    next_id: i64,
    /// Industry count per sector id.
    references: BTreeMap<i64, usize>,
    failing_writes: Option<String>,
}

/// In-memory sector repository for tests and front-end checks.
///
/// Follows the same contract as [`SqliteSectorRepository`], including the
/// reference check on delete.
#[derive(Debug, Default)]
pub struct InMemorySectorRepository {
    state: Mutex<MemoryState>,
}

impl InMemorySectorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-populated with `names`, in order.
    pub fn with_sectors<I, S>(names: I) -> RepoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let repo = Self::new();
        for name in names {
            repo.create_sector(name.as_ref())?;
        }
        Ok(repo)
    }

    /// Records one industry referencing `sector`.
    pub fn add_industry(&self, sector: &str) -> RepoResult<()> {
        let mut state = self.lock();
        let id = find_id(&state, sector).ok_or_else(|| RepoError::NotFound {
            entity: ENTITY,
            name: sector.to_string(),
        })?;
        *state.references.entry(id).or_default() += 1;
        Ok(())
    }

    /// Makes every later write fail with a storage error carrying `message`.
    ///
    /// `None` restores normal behavior.
    pub fn fail_writes(&self, message: Option<&str>) {
        self.lock().failing_writes = message.map(str::to_string);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_id(state: &MemoryState, name: &str) -> Option<i64> {
    state
        .sectors
        .iter()
        .find(|(_, existing)| existing == name)
        .map(|(id, _)| *id)
}

fn storage_failure(message: &str) -> DbError {
    DbError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some(message.to_string()),
    ))
}

impl SectorRepository for InMemorySectorRepository {
    fn list_sectors(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .lock()
            .sectors
            .iter()
            .map(|(_, name)| name.clone())
            .collect())
    }

    fn sector_exists(&self, name: &str) -> RepoResult<bool> {
        Ok(find_id(&self.lock(), name).is_some())
    }

    fn create_sector(&self, name: &str) -> RepoResult<()> {
        let sector = Sector::new(name)?;
        let mut state = self.lock();
        if find_id(&state, sector.name()).is_some() {
            return Err(RepoError::AlreadyExists {
                entity: ENTITY,
                name: name.to_string(),
            });
        }
        if let Some(message) = state.failing_writes.as_deref() {
            return Err(RepoError::Create {
                entity: ENTITY,
                name: name.to_string(),
                source: storage_failure(message),
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.sectors.push((id, sector.name().to_string()));
        Ok(())
    }

    fn update_sector(&self, old_name: &str, new_name: &str) -> RepoResult<()> {
        let renamed = Sector::new(new_name)?;
        let mut state = self.lock();
        if find_id(&state, renamed.name()).is_some() {
            return Err(RepoError::AlreadyExists {
                entity: ENTITY,
                name: new_name.to_string(),
            });
        }
        let id = find_id(&state, old_name).ok_or_else(|| RepoError::NotFound {
            entity: ENTITY,
            name: old_name.to_string(),
        })?;
        if let Some(message) = state.failing_writes.as_deref() {
            return Err(RepoError::Update {
                entity: ENTITY,
                name: old_name.to_string(),
                source: storage_failure(message),
            });
        }

        if let Some(entry) = state.sectors.iter_mut().find(|(row_id, _)| *row_id == id) {
            entry.1 = renamed.name().to_string();
        }
        Ok(())
    }

    fn delete_sector(&self, name: &str) -> RepoResult<()> {
        let mut state = self.lock();
        let id = find_id(&state, name).ok_or_else(|| RepoError::NotFound {
            entity: ENTITY,
            name: name.to_string(),
        })?;
        if state.references.get(&id).copied().unwrap_or(0) > 0 {
            return Err(RepoError::StillReferenced {
                entity: ENTITY,
                name: name.to_string(),
            });
        }
        if let Some(message) = state.failing_writes.as_deref() {
            return Err(RepoError::Delete {
                entity: ENTITY,
                name: name.to_string(),
                source: storage_failure(message),
            });
        }

        state.sectors.retain(|(row_id, _)| *row_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemorySectorRepository, SectorRepository};
    use crate::repo::RepoError;

    #[test]
    fn in_memory_repository_follows_the_sector_contract() {
        let repo = InMemorySectorRepository::with_sectors(["Energy", "Utilities"]).unwrap();

        assert!(matches!(
            repo.create_sector("Energy"),
            Err(RepoError::AlreadyExists { .. })
        ));
        assert!(matches!(
            repo.update_sector("Energy", "Utilities"),
            Err(RepoError::AlreadyExists { .. })
        ));
        assert!(matches!(
            repo.update_sector("Missing", "Materials"),
            Err(RepoError::NotFound { .. })
        ));

        repo.add_industry("Utilities").unwrap();
        assert!(matches!(
            repo.delete_sector("Utilities"),
            Err(RepoError::StillReferenced { .. })
        ));

        repo.update_sector("Energy", "Power").unwrap();
        repo.delete_sector("Power").unwrap();
        assert_eq!(repo.list_sectors().unwrap(), vec!["Utilities".to_string()]);
    }

    #[test]
    fn in_memory_repository_can_simulate_storage_failures() {
        let repo = InMemorySectorRepository::new();
        repo.fail_writes(Some("disk full"));

        let err = repo.create_sector("Energy").unwrap_err();
        assert!(matches!(err, RepoError::Create { .. }));
        assert!(!err.is_domain());
        assert!(repo.list_sectors().unwrap().is_empty());

        repo.fail_writes(None);
        repo.create_sector("Energy").unwrap();
    }
}
