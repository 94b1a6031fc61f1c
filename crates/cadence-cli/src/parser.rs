use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Accepts ISO dates (`2025-01-06`) or natural language ("today", "next monday").
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(input, Utc::now(), Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

pub fn parse_optional_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    input.map(parse_date).transpose()
}
