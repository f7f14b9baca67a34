//! External data providers and raw snapshots they deliver.

use super::validation::{check_len, Validatable, ValidationError};
use super::RowId;
use serde_json::Value;

const WEBSITE_MAX_CHARS: usize = 255;

/// An external data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub id: Option<RowId>,
    name: String,
    website: Option<String>,
}

impl DataSource {
    pub fn new(
        name: impl Into<String>,
        website: Option<String>,
    ) -> Result<Self, ValidationError> {
        if let Some(website) = website.as_deref() {
            check_len("website", website, 1, WEBSITE_MAX_CHARS)?;
        }
        let source = Self {
            id: None,
            name: name.into(),
            website,
        };
        source.validate()?;
        Ok(source)
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }
}

impl Validatable for DataSource {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One raw snapshot for a stock from a source at a point in time.
///
/// The payload is schema-less; only JSON well-formedness is enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct StockData {
    pub id: Option<RowId>,
    pub stock_id: RowId,
    pub source_id: RowId,
    /// Epoch ms supplied by the provider.
    pub date_recorded: i64,
    pub data: Value,
}

impl StockData {
    pub fn new(stock_id: RowId, source_id: RowId, date_recorded: i64, data: Value) -> Self {
        Self {
            id: None,
            stock_id,
            source_id,
            date_recorded,
            data,
        }
    }
}
