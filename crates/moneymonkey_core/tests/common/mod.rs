#![allow(dead_code)]

use moneymonkey_core::{
    Connector, DbConfig, MigrationRunner, MigrationTarget, SqliteConnector, SqliteMigrationRunner,
};
use tempfile::TempDir;

/// Connector over a fresh database file; the directory lives as long as the guard.
pub fn fresh_connector() -> (TempDir, SqliteConnector) {
    let dir = tempfile::tempdir().unwrap();
    let connector = SqliteConnector::new(DbConfig::for_data_dir(dir.path(), "moneymonkey"));
    (dir, connector)
}

/// Connector over a database migrated to head, seed included.
pub fn migrated_connector() -> (TempDir, SqliteConnector) {
    let (dir, connector) = fresh_connector();
    SqliteMigrationRunner::new(&connector)
        .upgrade(&MigrationTarget::Head)
        .unwrap();
    (dir, connector)
}

/// Connector over a database with the schema but without seed rows.
pub fn empty_schema_connector() -> (TempDir, SqliteConnector) {
    let (dir, connector) = fresh_connector();
    SqliteMigrationRunner::new(&connector)
        .upgrade(&MigrationTarget::Version("0002_market_schema".to_string()))
        .unwrap();
    (dir, connector)
}

pub fn count_rows(connector: &SqliteConnector, table: &str) -> i64 {
    let conn = connector.get_connection().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
