//! Reference-data core for the MoneyMonkey stock-fundamentals application.
//! This crate owns the schema, the startup migration gate and the
//! repositories that enforce naming and referential rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{AppConfig, ConfigError, DbConfig, LATEST_MIGRATION_VERSION};
pub use db::{
    Connector, DbError, DbResult, GateOutcome, MigrationGate, MigrationRunner, MigrationTarget,
    Session, SqliteConnector, SqliteMigrationRunner,
};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::{Validatable, ValidationError};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::market_repo::{MarketRepository, SqliteMarketRepository};
pub use repo::sector_repo::{InMemorySectorRepository, SectorRepository, SqliteSectorRepository};
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
