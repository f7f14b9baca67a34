//! Plain entity records for the stock-fundamentals schema.
//!
//! # Responsibility
//! - Mirror each table as a data record without lazy navigation.
//! - Validate names and values when they are assigned.
//!
//! # Invariants
//! - A constructed record always satisfies its validation rules.
//! - Identifiers and timestamps are assigned by the database (`None` before insert).

pub mod market;
pub mod reference;
pub mod source;
pub mod validation;

pub use market::{DividendYield, FinancialMetric, Stock, StockPriceHistory};
pub use reference::{Industry, MetricName, Sector};
pub use source::{DataSource, StockData};
pub use validation::{validate_name, Validatable, ValidationError, NAME_MAX_CHARS};

/// Database row identifier.
pub type RowId = i64;
