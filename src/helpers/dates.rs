//! Built-in date difference helpers.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::HelperError;
use crate::expr::ops::json_number;

use super::{Helper, HelperRegistry};

pub const DAY_MS: f64 = 86_400_000.0;
pub const WEEK_MS: f64 = DAY_MS * 7.0;
pub const MONTH_MS: f64 = DAY_MS * 30.0;
pub const YEAR_MS: f64 = DAY_MS * 365.0;

/// `$unit(start, end)`: `(end - start)` expressed in a fixed-length unit.
#[derive(Debug, Clone, Copy)]
pub struct DateDiff {
    name: &'static str,
    unit_ms: f64,
}

impl DateDiff {
    pub const fn new(name: &'static str, unit_ms: f64) -> Self {
        Self { name, unit_ms }
    }

    pub fn helper_name(&self) -> &'static str {
        self.name
    }

    pub fn diff(&self, start: &JsonValue, end: &JsonValue) -> Result<f64, HelperError> {
        Ok((to_millis(end)? - to_millis(start)?) / self.unit_ms)
    }
}

pub fn builtin() -> [DateDiff; 4] {
    [
        DateDiff::new("$days", DAY_MS),
        DateDiff::new("$weeks", WEEK_MS),
        DateDiff::new("$months", MONTH_MS),
        DateDiff::new("$years", YEAR_MS),
    ]
}

#[async_trait]
impl Helper for DateDiff {
    fn name(&self) -> Option<&str> {
        Some(self.name)
    }

    async fn call(
        &self,
        _registry: &HelperRegistry,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, HelperError> {
        let [start, end, ..] = args.as_slice() else {
            return Err(HelperError(format!(
                "{} expects at least 2 arguments (start, end), got {}",
                self.name,
                args.len()
            )));
        };
        let diff = self.diff(start, end)?;
        json_number(diff)
            .ok_or_else(|| HelperError(format!("{} produced invalid result {diff}", self.name)))
    }
}

/// Converts a date-like value into epoch milliseconds.
///
/// Numbers are taken as epoch milliseconds. Strings may be RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp, or a `YYYY-MM-DD` date; naive forms
/// are read as UTC.
pub fn to_millis(value: &JsonValue) -> Result<f64, HelperError> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| HelperError(format!("invalid timestamp {n}"))),
        JsonValue::String(s) => parse_date(s)
            .map(|ms| ms as f64)
            .ok_or_else(|| HelperError(format!("cannot parse '{s}' as a date"))),
        other => Err(HelperError(format!("expected a date, got {other}"))),
    }
}

fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}
