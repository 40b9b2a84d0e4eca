//! Null-token aware field parsers.
//!
//! Exposure files use a handful of spellings for "no value". Every parser
//! here maps those tokens to `None` so that a missing value is never
//! confused with zero.

use crate::FieldError;

/// Tokens that denote an absent value.
pub const NULL_TOKENS: &[&str] = &["", "n/a", "N/A", "null", "Null", "NULL"];

/// Returns `true` if the raw value is missing or one of [`NULL_TOKENS`].
#[must_use]
pub fn is_null(raw: Option<&str>) -> bool {
    raw.is_none_or(|s| NULL_TOKENS.contains(&s))
}

/// Parses an integer field.
///
/// # Errors
///
/// Returns [`FieldError`] if the value is present but not an integer.
pub fn parse_int(column: &'static str, raw: Option<&str>) -> Result<Option<i64>, FieldError> {
    if is_null(raw) {
        return Ok(None);
    }
    let value = raw.unwrap_or_default().trim();
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| FieldError::new(column, value, "integer"))
}

/// Parses a floating-point field.
///
/// # Errors
///
/// Returns [`FieldError`] if the value is present but not a number.
pub fn parse_float(column: &'static str, raw: Option<&str>) -> Result<Option<f64>, FieldError> {
    if is_null(raw) {
        return Ok(None);
    }
    let value = raw.unwrap_or_default().trim();
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FieldError::new(column, value, "float"))
}

/// Parses a text field. Surrounding whitespace is kept as-is.
#[must_use]
pub fn parse_text(raw: Option<&str>) -> Option<String> {
    if is_null(raw) {
        return None;
    }
    raw.map(str::to_string)
}
