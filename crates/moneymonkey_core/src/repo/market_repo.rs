//! Stock, time-series and external snapshot persistence.
//!
//! # Responsibility
//! - Insert and read stocks and their recorded series.
//! - Store raw provider snapshots as JSON documents.
//!
//! # Invariants
//! - Records are validated by their constructors before reaching SQL.
//! - `updated_at` is maintained by the database, never by this layer.
//! - Read paths reject invalid persisted state instead of masking it.

use super::{run_write, RepoError, RepoResult, WriteKind, WriteOp};
use crate::db::Connector;
use crate::model::{
    DataSource, DividendYield, FinancialMetric, RowId, Stock, StockData, StockPriceHistory,
    Validatable,
};
use rusqlite::{params, Row};

/// Storage-access interface for stocks and their series.
pub trait MarketRepository {
    fn insert_stock(&self, stock: &Stock) -> RepoResult<RowId>;
    fn get_stock(&self, ticker: &str) -> RepoResult<Option<Stock>>;
    /// Writes every mutable column of a persisted stock (`stock.id` required).
    fn update_stock(&self, stock: &Stock) -> RepoResult<()>;
    fn record_financial_metric(&self, metric: &FinancialMetric) -> RepoResult<RowId>;
    fn record_dividend_yield(&self, dividend: &DividendYield) -> RepoResult<RowId>;
    fn record_price(&self, point: &StockPriceHistory) -> RepoResult<RowId>;
    fn insert_data_source(&self, source: &DataSource) -> RepoResult<RowId>;
    fn record_stock_data(&self, snapshot: &StockData) -> RepoResult<RowId>;
    /// Lists snapshots of one stock from one source, oldest first.
    fn list_stock_data(&self, stock_id: RowId, source_id: RowId) -> RepoResult<Vec<StockData>>;
}

/// SQLite-backed market repository.
pub struct SqliteMarketRepository<'c, C: Connector> {
    connector: &'c C,
}

impl<'c, C: Connector> SqliteMarketRepository<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> MarketRepository for SqliteMarketRepository<'_, C> {
    fn insert_stock(&self, stock: &Stock) -> RepoResult<RowId> {
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "stock", stock.ticker()),
            |tx| {
                tx.execute(
                    "INSERT INTO stocks (ticker, company_name, industry_id, market_cap, price)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        stock.ticker(),
                        stock.company_name(),
                        stock.industry_id,
                        stock.market_cap(),
                        stock.price(),
                    ],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn get_stock(&self, ticker: &str) -> RepoResult<Option<Stock>> {
        let session = self.connector.get_session()?;
        let mut stmt = session.connection().prepare(
            "SELECT id, ticker, company_name, industry_id, market_cap, price, created_at, updated_at
             FROM stocks
             WHERE ticker = ?1;",
        )?;
        let mut rows = stmt.query([ticker])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_stock_row(row)?));
        }
        Ok(None)
    }

    fn update_stock(&self, stock: &Stock) -> RepoResult<()> {
        let Some(id) = stock.id else {
            return Err(RepoError::NotFound {
                entity: "stock",
                name: stock.ticker().to_string(),
            });
        };

        run_write(
            self.connector,
            WriteOp::new(WriteKind::Update, "stock", stock.ticker()),
            |tx| {
                let changed = tx.execute(
                    "UPDATE stocks
                     SET ticker = ?2,
                         company_name = ?3,
                         industry_id = ?4,
                         market_cap = ?5,
                         price = ?6
                     WHERE id = ?1;",
                    params![
                        id,
                        stock.ticker(),
                        stock.company_name(),
                        stock.industry_id,
                        stock.market_cap(),
                        stock.price(),
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: "stock",
                        name: stock.ticker().to_string(),
                    });
                }
                Ok(())
            },
        )
    }

    fn record_financial_metric(&self, metric: &FinancialMetric) -> RepoResult<RowId> {
        let key = metric.stock_id.to_string();
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "financial_metric", &key),
            |tx| {
                tx.execute(
                    "INSERT INTO financial_metrics (stock_id, metric_name_id, metric_value)
                     VALUES (?1, ?2, ?3);",
                    params![metric.stock_id, metric.metric_name_id, metric.metric_value()],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn record_dividend_yield(&self, dividend: &DividendYield) -> RepoResult<RowId> {
        let key = dividend.stock_id.to_string();
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "dividend_yield", &key),
            |tx| {
                tx.execute(
                    "INSERT INTO dividend_yields (stock_id, yield_value) VALUES (?1, ?2);",
                    params![dividend.stock_id, dividend.yield_value()],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn record_price(&self, point: &StockPriceHistory) -> RepoResult<RowId> {
        let key = point.stock_id.to_string();
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "stock_price_history", &key),
            |tx| {
                tx.execute(
                    "INSERT INTO stock_price_history (stock_id, price) VALUES (?1, ?2);",
                    params![point.stock_id, point.price()],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn insert_data_source(&self, source: &DataSource) -> RepoResult<RowId> {
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "data_source", source.name()),
            |tx| {
                tx.execute(
                    "INSERT INTO data_sources (name, website) VALUES (?1, ?2);",
                    params![source.name(), source.website()],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn record_stock_data(&self, snapshot: &StockData) -> RepoResult<RowId> {
        let key = snapshot.stock_id.to_string();
        let payload = serde_json::to_string(&snapshot.data)
            .map_err(|err| RepoError::InvalidData(format!("unserializable payload: {err}")))?;
        run_write(
            self.connector,
            WriteOp::new(WriteKind::Create, "stock_data", &key),
            |tx| {
                tx.execute(
                    "INSERT INTO stock_data (stock_id, source_id, date_recorded, data)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        snapshot.stock_id,
                        snapshot.source_id,
                        snapshot.date_recorded,
                        payload,
                    ],
                )?;
                Ok(tx.last_insert_rowid())
            },
        )
    }

    fn list_stock_data(&self, stock_id: RowId, source_id: RowId) -> RepoResult<Vec<StockData>> {
        let session = self.connector.get_session()?;
        let mut stmt = session.connection().prepare(
            "SELECT id, stock_id, source_id, date_recorded, data
             FROM stock_data
             WHERE stock_id = ?1 AND source_id = ?2
             ORDER BY date_recorded ASC, id ASC;",
        )?;
        let mut rows = stmt.query([stock_id, source_id])?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next()? {
            let payload: String = row.get("data")?;
            let data = serde_json::from_str(&payload).map_err(|err| {
                RepoError::InvalidData(format!("invalid json in stock_data.data: {err}"))
            })?;
            let mut snapshot = StockData::new(
                row.get("stock_id")?,
                row.get("source_id")?,
                row.get("date_recorded")?,
                data,
            );
            snapshot.id = Some(row.get("id")?);
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }
}

fn parse_stock_row(row: &Row<'_>) -> RepoResult<Stock> {
    let ticker: String = row.get("ticker")?;
    let mut stock = Stock::new(
        ticker.as_str(),
        row.get::<_, String>("company_name")?,
        row.get("industry_id")?,
        row.get("price")?,
    )
    .map_err(|err| RepoError::InvalidData(format!("stock `{ticker}`: {err}")))?;
    stock
        .set_market_cap(row.get("market_cap")?)
        .map_err(|err| RepoError::InvalidData(format!("stock `{ticker}`: {err}")))?;
    stock.id = Some(row.get("id")?);
    stock.created_at = Some(row.get("created_at")?);
    stock.updated_at = Some(row.get("updated_at")?);
    Ok(stock)
}
