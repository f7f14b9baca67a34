//! Stock and per-stock time series records.

use super::validation::{check_len, decimal, non_negative_decimal, ValidationError};
use super::RowId;

const TICKER_MAX_CHARS: usize = 10;
const COMPANY_NAME_MAX_CHARS: usize = 255;
const PRICE_PLACES: i32 = 4;
const MARKET_CAP_PLACES: i32 = 2;
const METRIC_VALUE_PLACES: i32 = 2;
const YIELD_PLACES: i32 = 4;

/// A tradable company.
#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub id: Option<RowId>,
    ticker: String,
    company_name: String,
    pub industry_id: RowId,
    price: f64,
    market_cap: Option<f64>,
    /// Epoch ms, assigned by the database.
    pub created_at: Option<i64>,
    /// Epoch ms, refreshed by the database on every update.
    pub updated_at: Option<i64>,
}

impl Stock {
    pub fn new(
        ticker: impl Into<String>,
        company_name: impl Into<String>,
        industry_id: RowId,
        price: f64,
    ) -> Result<Self, ValidationError> {
        let ticker = ticker.into();
        let company_name = company_name.into();
        check_len("ticker", &ticker, 1, TICKER_MAX_CHARS)?;
        if ticker.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidCharacters {
                field: "ticker",
                value: ticker,
            });
        }
        check_len("company_name", &company_name, 1, COMPANY_NAME_MAX_CHARS)?;

        Ok(Self {
            id: None,
            ticker,
            company_name,
            industry_id,
            price: non_negative_decimal("price", price, PRICE_PLACES)?,
            market_cap: None,
            created_at: None,
            updated_at: None,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// Price rounded to 4 decimal places.
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), ValidationError> {
        self.price = non_negative_decimal("price", price, PRICE_PLACES)?;
        Ok(())
    }

    pub fn set_market_cap(&mut self, market_cap: Option<f64>) -> Result<(), ValidationError> {
        self.market_cap = market_cap
            .map(|value| non_negative_decimal("market_cap", value, MARKET_CAP_PLACES))
            .transpose()?;
        Ok(())
    }
}

/// One recorded value of one metric for one stock.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialMetric {
    pub id: Option<RowId>,
    pub stock_id: RowId,
    pub metric_name_id: RowId,
    metric_value: f64,
    pub date_recorded: Option<i64>,
}

impl FinancialMetric {
    pub fn new(
        stock_id: RowId,
        metric_name_id: RowId,
        metric_value: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            stock_id,
            metric_name_id,
            metric_value: non_negative_decimal("metric_value", metric_value, METRIC_VALUE_PLACES)?,
            date_recorded: None,
        })
    }

    /// Value rounded to 2 decimal places.
    pub fn metric_value(&self) -> f64 {
        self.metric_value
    }
}

/// One recorded dividend yield for a stock.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendYield {
    pub id: Option<RowId>,
    pub stock_id: RowId,
    yield_value: f64,
    pub date_recorded: Option<i64>,
}

impl DividendYield {
    pub fn new(stock_id: RowId, yield_value: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            stock_id,
            yield_value: non_negative_decimal("yield_value", yield_value, YIELD_PLACES)?,
            date_recorded: None,
        })
    }

    pub fn yield_value(&self) -> f64 {
        self.yield_value
    }
}

/// One historical price point for a stock.
#[derive(Debug, Clone, PartialEq)]
pub struct StockPriceHistory {
    pub id: Option<RowId>,
    pub stock_id: RowId,
    price: f64,
    pub date_recorded: Option<i64>,
}

impl StockPriceHistory {
    pub fn new(stock_id: RowId, price: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            stock_id,
            price: decimal("price", price, PRICE_PLACES)?,
            date_recorded: None,
        })
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}
