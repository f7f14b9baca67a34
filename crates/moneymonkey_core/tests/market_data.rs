mod common;

use common::{count_rows, migrated_connector};
use moneymonkey_core::model::{
    DataSource, DividendYield, FinancialMetric, Stock, StockData, StockPriceHistory,
};
use moneymonkey_core::{
    CatalogRepository, Connector, MarketRepository, RepoError, SqliteCatalogRepository,
    SqliteConnector, SqliteMarketRepository,
};
use serde_json::json;

fn industry_id(connector: &SqliteConnector, name: &str) -> i64 {
    connector
        .get_connection()
        .unwrap()
        .query_row("SELECT id FROM industries WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .unwrap()
}

fn metric_name_id(connector: &SqliteConnector, name: &str) -> i64 {
    connector
        .get_connection()
        .unwrap()
        .query_row("SELECT id FROM metric_names WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .unwrap()
}

fn insert_acme(connector: &SqliteConnector) -> i64 {
    let mut stock = Stock::new(
        "ACME",
        "Acme Corporation",
        industry_id(connector, "Machinery"),
        12.34567,
    )
    .unwrap();
    stock.set_market_cap(Some(1_000_000.005)).unwrap();
    SqliteMarketRepository::new(connector)
        .insert_stock(&stock)
        .unwrap()
}

#[test]
fn stock_round_trips_with_database_timestamps() {
    let (_dir, connector) = migrated_connector();
    let id = insert_acme(&connector);

    let stock = SqliteMarketRepository::new(&connector)
        .get_stock("ACME")
        .unwrap()
        .unwrap();

    assert_eq!(stock.id, Some(id));
    assert_eq!(stock.company_name(), "Acme Corporation");
    assert_eq!(stock.price(), 12.3457);
    assert!(stock.created_at.is_some());
    assert_eq!(stock.created_at, stock.updated_at);
}

#[test]
fn duplicate_ticker_is_reported_as_already_exists() {
    let (_dir, connector) = migrated_connector();
    insert_acme(&connector);

    let duplicate = Stock::new(
        "ACME",
        "Another Acme",
        industry_id(&connector, "Machinery"),
        1.0,
    )
    .unwrap();
    let err = SqliteMarketRepository::new(&connector)
        .insert_stock(&duplicate)
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::AlreadyExists { entity: "stock", name } if name == "ACME"
    ));
    assert_eq!(count_rows(&connector, "stocks"), 1);
}

#[test]
fn unknown_industry_is_a_storage_failure() {
    let (_dir, connector) = migrated_connector();
    let orphan = Stock::new("ORPH", "Orphan Inc", 9_999, 1.0).unwrap();

    let err = SqliteMarketRepository::new(&connector)
        .insert_stock(&orphan)
        .unwrap_err();

    assert!(matches!(err, RepoError::Create { entity: "stock", .. }));
    assert!(!err.is_domain());
}

#[test]
fn update_refreshes_updated_at() {
    let (_dir, connector) = migrated_connector();
    let id = insert_acme(&connector);
    connector
        .get_connection()
        .unwrap()
        .execute(
            "UPDATE stocks SET created_at = 0, updated_at = 0 WHERE id = ?1;",
            [id],
        )
        .unwrap();

    let repo = SqliteMarketRepository::new(&connector);
    let mut stock = repo.get_stock("ACME").unwrap().unwrap();
    assert_eq!(stock.updated_at, Some(0));
    stock.set_price(15.0).unwrap();
    repo.update_stock(&stock).unwrap();

    let reloaded = repo.get_stock("ACME").unwrap().unwrap();
    assert_eq!(reloaded.price(), 15.0);
    assert_eq!(reloaded.created_at, Some(0));
    assert!(reloaded.updated_at.unwrap() > 0);
}

#[test]
fn update_of_unsaved_stock_is_not_found() {
    let (_dir, connector) = migrated_connector();
    let stock = Stock::new(
        "NEW",
        "Unsaved Ltd",
        industry_id(&connector, "Machinery"),
        1.0,
    )
    .unwrap();

    let err = SqliteMarketRepository::new(&connector)
        .update_stock(&stock)
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn series_records_are_stored_per_stock() {
    let (_dir, connector) = migrated_connector();
    let stock_id = insert_acme(&connector);
    let repo = SqliteMarketRepository::new(&connector);

    let metric = FinancialMetric::new(stock_id, metric_name_id(&connector, "PE Ratio"), 18.456)
        .unwrap();
    repo.record_financial_metric(&metric).unwrap();
    repo.record_dividend_yield(&DividendYield::new(stock_id, 0.0312).unwrap())
        .unwrap();
    repo.record_price(&StockPriceHistory::new(stock_id, 12.5).unwrap())
        .unwrap();
    repo.record_price(&StockPriceHistory::new(stock_id, 12.75).unwrap())
        .unwrap();

    assert_eq!(count_rows(&connector, "financial_metrics"), 1);
    assert_eq!(count_rows(&connector, "dividend_yields"), 1);
    assert_eq!(count_rows(&connector, "stock_price_history"), 2);

    let stored: f64 = connector
        .get_connection()
        .unwrap()
        .query_row("SELECT metric_value FROM financial_metrics;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, 18.46);
}

#[test]
fn series_for_missing_stock_is_rejected() {
    let (_dir, connector) = migrated_connector();

    let err = SqliteMarketRepository::new(&connector)
        .record_price(&StockPriceHistory::new(42, 1.0).unwrap())
        .unwrap_err();

    assert!(matches!(err, RepoError::Create { .. }));
    assert_eq!(count_rows(&connector, "stock_price_history"), 0);
}

#[test]
fn snapshots_keep_their_json_payload() {
    let (_dir, connector) = migrated_connector();
    let stock_id = insert_acme(&connector);
    let repo = SqliteMarketRepository::new(&connector);
    let source_id = repo
        .insert_data_source(
            &DataSource::new("Yahoo Finance", Some("https://finance.yahoo.com".to_string()))
                .unwrap(),
        )
        .unwrap();

    let later = json!({"pe": 18.2, "eps": [1.1, 1.3]});
    let earlier = json!({"pe": 17.9, "note": "restated"});
    repo.record_stock_data(&StockData::new(stock_id, source_id, 2_000, later.clone()))
        .unwrap();
    repo.record_stock_data(&StockData::new(stock_id, source_id, 1_000, earlier.clone()))
        .unwrap();

    let snapshots = repo.list_stock_data(stock_id, source_id).unwrap();
    let payloads: Vec<_> = snapshots.iter().map(|s| s.data.clone()).collect();
    assert_eq!(payloads, vec![earlier, later]);
    assert!(snapshots.iter().all(|s| s.id.is_some()));
}

#[test]
fn duplicate_data_source_name_is_rejected() {
    let (_dir, connector) = migrated_connector();
    let repo = SqliteMarketRepository::new(&connector);
    let source = DataSource::new("Alpha Vantage", None).unwrap();
    repo.insert_data_source(&source).unwrap();

    assert!(matches!(
        repo.insert_data_source(&source),
        Err(RepoError::AlreadyExists { .. })
    ));
}

#[test]
fn catalog_lists_seeded_industries_and_metrics() {
    let (_dir, connector) = migrated_connector();
    let catalog = SqliteCatalogRepository::new(&connector);

    let industries = catalog.list_industries("Energy").unwrap();
    assert_eq!(
        industries,
        vec!["Energy Equipment & Services", "Oil, Gas & Consumable Fuels"]
    );
    assert_eq!(catalog.list_metric_names().unwrap().len(), 6);
    assert!(matches!(
        catalog.list_industries("Crypto"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn catalog_creates_industries_under_existing_sectors_only() {
    let (_dir, connector) = migrated_connector();
    let catalog = SqliteCatalogRepository::new(&connector);

    catalog.create_industry("Energy", "Renewable Energy").unwrap();
    assert_eq!(catalog.list_industries("Energy").unwrap().len(), 3);

    assert!(matches!(
        catalog.create_industry("Crypto", "Mining Pools"),
        Err(RepoError::NotFound { .. })
    ));
    assert!(matches!(
        catalog.create_industry("Energy", "Banks"),
        Err(RepoError::AlreadyExists { .. })
    ));
    assert!(matches!(
        catalog.create_industry("Energy", "X"),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn schema_rejects_negative_values_written_directly() {
    let (_dir, connector) = migrated_connector();
    let stock_id = insert_acme(&connector);
    let metric_id = metric_name_id(&connector, "EPS");
    let conn = connector.get_connection().unwrap();

    let statements = [
        format!("UPDATE stocks SET price = -1 WHERE id = {stock_id};"),
        format!("UPDATE stocks SET market_cap = -1 WHERE id = {stock_id};"),
        format!(
            "INSERT INTO financial_metrics (stock_id, metric_name_id, metric_value)
             VALUES ({stock_id}, {metric_id}, -0.5);"
        ),
        format!("INSERT INTO dividend_yields (stock_id, yield_value) VALUES ({stock_id}, -0.01);"),
        format!(
            "INSERT INTO stock_data (stock_id, source_id, date_recorded, data)
             VALUES ({stock_id}, 1, 0, 'not json');"
        ),
    ];
    for sql in &statements {
        let err = conn.execute(sql, []).unwrap_err();
        assert!(
            err.to_string().contains("CHECK") || err.to_string().contains("FOREIGN KEY"),
            "unexpected error for `{sql}`: {err}"
        );
    }
    assert_eq!(count_rows(&connector, "financial_metrics"), 0);
    assert_eq!(count_rows(&connector, "dividend_yields"), 0);
}
