//! Reference taxonomy records: sectors, industries and metric names.

use super::validation::{Validatable, ValidationError};
use super::RowId;

/// Top-level industry grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub id: Option<RowId>,
    name: String,
}

impl Sector {
    /// Creates an unsaved sector after validating `name`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let sector = Self {
            id: None,
            name: name.into(),
        };
        sector.validate()?;
        Ok(sector)
    }
}

impl Validatable for Sector {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Sub-grouping that belongs to exactly one sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Industry {
    pub id: Option<RowId>,
    name: String,
    pub sector_id: RowId,
}

impl Industry {
    pub fn new(name: impl Into<String>, sector_id: RowId) -> Result<Self, ValidationError> {
        let industry = Self {
            id: None,
            name: name.into(),
            sector_id,
        };
        industry.validate()?;
        Ok(industry)
    }
}

impl Validatable for Industry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Canonical label of one financial metric type, e.g. "PE Ratio".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricName {
    pub id: Option<RowId>,
    name: String,
}

impl MetricName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let metric = Self {
            id: None,
            name: name.into(),
        };
        metric.validate()?;
        Ok(metric)
    }
}

impl Validatable for MetricName {
    const MAX_NAME_CHARS: usize = 50;

    fn name(&self) -> &str {
        &self.name
    }
}
