//! Row models and timestamp encoding for the measurement store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use wsc_core::Measurement;
use wsc_utils::dates::start_of_day;

/// Storage format for timestamps: RFC 3339, UTC, whole seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses an RFC 3339 instant, or a bare `YYYY-MM-DD` date as midnight UTC.
pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(rfc_err) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(start_of_day(date)),
            Err(_) => Err(anyhow::anyhow!("invalid timestamp '{}': {}", s, rfc_err)),
        },
    }
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Flat CSV representation of a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub waterbody_id: String,
    pub name: String,
    pub timestamp: String,
    pub surface_area_hectares: f64,
    pub data_source: String,
    pub cloud_cover_percentage: Option<f64>,
    pub processing_error: Option<String>,
}

impl From<&Measurement> for MeasurementRow {
    fn from(m: &Measurement) -> Self {
        MeasurementRow {
            waterbody_id: m.waterbody_id.clone(),
            name: m.name.clone(),
            timestamp: format_timestamp(&m.timestamp),
            surface_area_hectares: m.surface_area_hectares,
            data_source: m.data_source.clone(),
            cloud_cover_percentage: m.cloud_cover_percentage,
            processing_error: m.processing_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_second_precision_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-31T23:59:59Z");
        assert_eq!(parse_timestamp("2024-01-31T23:59:59Z").unwrap(), ts);
    }

    #[test]
    fn parse_timestamp_accepts_offsets_and_dates() {
        let ts = parse_timestamp("2024-02-01T01:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-31T23:00:00Z");
        let midnight = parse_timestamp("2024-03-05").unwrap();
        assert_eq!(format_timestamp(&midnight), "2024-03-05T00:00:00Z");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
