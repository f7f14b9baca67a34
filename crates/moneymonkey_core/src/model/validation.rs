//! Field validation shared by all entity records.
//!
//! # Invariants
//! - Names are 2..=100 characters unless a record narrows the maximum.
//! - Names use letters, digits, spaces and `& , . ( ) ' - / + :` only.
//! - Names never carry leading or trailing whitespace.
//! - Decimal values are finite; most are non-negative.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N} &,.()'/+:\-]+$").expect("valid name regex"));

/// Validation failure raised before any database round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    InvalidCharacters {
        field: &'static str,
        value: String,
    },
    SurroundingWhitespace {
        field: &'static str,
    },
    Negative {
        field: &'static str,
        value: f64,
    },
    NotFinite {
        field: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { field, min, actual } => {
                write!(f, "{field} must be at least {min} characters, got {actual}")
            }
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} must be at most {max} characters, got {actual}")
            }
            Self::InvalidCharacters { field, value } => {
                write!(f, "{field} `{value}` contains characters outside the allowed set")
            }
            Self::SurroundingWhitespace { field } => {
                write!(f, "{field} must not start or end with whitespace")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must be non-negative, got {value}")
            }
            Self::NotFinite { field } => write!(f, "{field} must be a finite number"),
        }
    }
}

impl Error for ValidationError {}

/// Records whose `name` follows the shared naming rules.
pub trait Validatable {
    /// Upper bound for this record's name, in characters.
    const MAX_NAME_CHARS: usize = NAME_MAX_CHARS;

    fn name(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationError> {
        validate_name(self.name(), Self::MAX_NAME_CHARS)
    }
}

/// Checks one entity name against the length and character-set rules.
pub fn validate_name(name: &str, max_chars: usize) -> Result<(), ValidationError> {
    let actual = name.chars().count();
    if actual < NAME_MIN_CHARS {
        return Err(ValidationError::TooShort {
            field: "name",
            min: NAME_MIN_CHARS,
            actual,
        });
    }
    if actual > max_chars {
        return Err(ValidationError::TooLong {
            field: "name",
            max: max_chars,
            actual,
        });
    }
    if name.trim() != name {
        return Err(ValidationError::SurroundingWhitespace { field: "name" });
    }
    if !NAME_RE.is_match(name) {
        return Err(ValidationError::InvalidCharacters {
            field: "name",
            value: name.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min {
        return Err(ValidationError::TooShort { field, min, actual });
    }
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Rounds `value` to `places` decimals, rejecting NaN/infinity.
pub(crate) fn decimal(
    field: &'static str,
    value: f64,
    places: i32,
) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    let scale = 10f64.powi(places);
    Ok((value * scale).round() / scale)
}

/// Like [`decimal`], additionally rejecting negative values.
pub(crate) fn non_negative_decimal(
    field: &'static str,
    value: f64,
    places: i32,
) -> Result<f64, ValidationError> {
    let rounded = decimal(field, value, places)?;
    if rounded < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(rounded)
}
