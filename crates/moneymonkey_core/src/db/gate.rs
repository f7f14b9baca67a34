//! Startup gate that keeps the schema at the expected migration version.
//!
//! # Responsibility
//! - Compare the stored version marker with the configured latest version.
//! - Invoke the migration runner towards head when they differ.
//!
//! # Invariants
//! - Runs once at process start, before any other data access.
//! - An unreadable version marker is treated as "none applied".
//! - Runner failures are fatal and returned to the caller.
//! - No lock is taken around the check; concurrent processes may both
//!   attempt an upgrade.

use super::migrations::{current_version, MigrationRunner, MigrationTarget};
use super::{Connector, DbResult};
use crate::config::AppConfig;
use log::{error, info, warn};
use std::time::Instant;

/// What the gate did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Stored version already matched the configured latest version.
    UpToDate { version: String },
    /// Runner was invoked towards head.
    Upgraded {
        from: Option<String>,
        applied: Vec<&'static str>,
    },
}

pub struct MigrationGate<'a, C: Connector, R: MigrationRunner> {
    config: &'a AppConfig,
    connector: &'a C,
    runner: R,
}

impl<'a, C: Connector, R: MigrationRunner> MigrationGate<'a, C, R> {
    pub fn new(config: &'a AppConfig, connector: &'a C, runner: R) -> Self {
        Self {
            config,
            connector,
            runner,
        }
    }

    /// Reads the stored version marker.
    ///
    /// Returns `None` when no migration was applied or the read failed; the
    /// failure is logged with configuration context.
    pub fn current_migration_version(&self) -> Option<String> {
        let read = self
            .connector
            .get_connection()
            .and_then(|conn| current_version(&conn));
        match read {
            Ok(version) => version,
            Err(err) => {
                warn!(
                    "event=migration_version_read module=db status=error {} error={}",
                    self.config.summary(),
                    err
                );
                None
            }
        }
    }

    /// Returns whether the stored version equals the configured latest one.
    pub fn has_latest_migration_run(&self) -> bool {
        self.current_migration_version().as_deref()
            == Some(self.config.latest_migration_version.as_str())
    }

    /// Upgrades the schema to head unless already at the expected version.
    ///
    /// # Errors
    /// - Returns the runner error unchanged; callers must abort startup.
    pub fn check_and_apply_migrations(&self) -> DbResult<GateOutcome> {
        let current = self.current_migration_version();
        if current.as_deref() == Some(self.config.latest_migration_version.as_str()) {
            info!(
                "event=migration_gate module=db status=ok action=none version={}",
                self.config.latest_migration_version
            );
            return Ok(GateOutcome::UpToDate {
                version: self.config.latest_migration_version.clone(),
            });
        }

        warn!(
            "event=migration_gate module=db status=start action=upgrade from={} expected={}",
            current.as_deref().unwrap_or("none"),
            self.config.latest_migration_version
        );
        let started_at = Instant::now();
        match self.runner.upgrade(&MigrationTarget::Head) {
            Ok(applied) => {
                info!(
                    "event=migration_gate module=db status=ok action=upgrade applied={} duration_ms={}",
                    applied.join(","),
                    started_at.elapsed().as_millis()
                );
                Ok(GateOutcome::Upgraded {
                    from: current,
                    applied,
                })
            }
            Err(err) => {
                error!(
                    "event=migration_gate module=db status=error action=upgrade from={} {} duration_ms={} error_code=migration_failed error={}",
                    current.as_deref().unwrap_or("none"),
                    self.config.summary(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
