//! Field validation
//!
//! Pure functions applied to caller input before any state is touched. Each
//! returns the cleaned value or the first failure as a
//! [`LedgerError::Validation`].

use chrono::NaiveDate;
use url::Url;

use crate::error::LedgerError;

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 2000;
pub const CATEGORY_MAX: usize = 50;
pub const LOCATION_MAX: usize = 200;
pub const VERIFICATION_DETAILS_MAX: usize = 2000;
pub const URL_MAX: usize = 500;

/// Trim surrounding whitespace and drop NUL bytes.
pub fn sanitize(value: &str) -> String {
    value.trim().replace('\0', "")
}

/// Validate a free-text field.
///
/// Blank input counts as absent. Length is measured in characters, after
/// sanitizing.
pub fn string_field(
    value: Option<&str>,
    name: &str,
    min: usize,
    max: usize,
    required: bool,
) -> Result<Option<String>, LedgerError> {
    let cleaned = value.map(sanitize).filter(|v| !v.is_empty());

    let Some(cleaned) = cleaned else {
        if required {
            return Err(LedgerError::validation(format!("{name} is required")));
        }
        return Ok(None);
    };

    let len = cleaned.chars().count();
    if len < min {
        return Err(LedgerError::validation(format!(
            "{name} must be at least {min} characters"
        )));
    }
    if len > max {
        return Err(LedgerError::validation(format!(
            "{name} must be at most {max} characters"
        )));
    }
    Ok(Some(cleaned))
}

/// Required variant of [`string_field`].
pub fn required_field(
    value: Option<&str>,
    name: &str,
    min: usize,
    max: usize,
) -> Result<String, LedgerError> {
    string_field(value, name, min, max, true)?
        .ok_or_else(|| LedgerError::validation(format!("{name} is required")))
}

/// Parse an optional `YYYY-MM-DD` date.
pub fn date_field(value: Option<&str>) -> Result<Option<NaiveDate>, LedgerError> {
    match value.map(sanitize).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| LedgerError::validation("Date must be in YYYY-MM-DD format")),
    }
}

/// Validate an optional externally hosted http(s) URL.
pub fn url_field(value: Option<&str>) -> Result<Option<String>, LedgerError> {
    let Some(raw) = value.map(sanitize).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if raw.chars().count() > URL_MAX {
        return Err(LedgerError::validation(format!(
            "URL must be at most {URL_MAX} characters"
        )));
    }

    let parsed = Url::parse(&raw).map_err(|_| LedgerError::validation("Invalid URL format"))?;
    let web = matches!(parsed.scheme(), "http" | "https");
    if !web || !parsed.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(LedgerError::validation("Invalid URL format"));
    }
    Ok(Some(raw))
}

/// Parse an entity id.
pub fn id_field(value: Option<&str>, name: &str) -> Result<uuid::Uuid, LedgerError> {
    let raw = value
        .map(sanitize)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LedgerError::validation(format!("{name} is required")))?;
    raw.parse()
        .map_err(|_| LedgerError::validation(format!("{name} must be a valid ID")))
}
