//! Helpers for preparing measurement series.

use crate::error::AnalyticsError;
use wsc_core::Measurement;

/// Minimum number of points any assessment needs.
pub const MIN_POINTS: usize = 2;

/// The series ordered by timestamp. The sort is stable, so equal
/// timestamps keep their input order.
pub fn chronological(series: &[Measurement]) -> Vec<&Measurement> {
    let mut ordered: Vec<&Measurement> = series.iter().collect();
    ordered.sort_by_key(|m| m.timestamp);
    ordered
}

/// Drops measurements that degraded to zero because the raster could not be
/// processed.
pub fn measured_only(series: Vec<Measurement>) -> Vec<Measurement> {
    series.into_iter().filter(|m| !m.is_degraded()).collect()
}

pub(crate) fn require_points(series: &[Measurement]) -> Result<(), AnalyticsError> {
    if series.len() < MIN_POINTS {
        return Err(AnalyticsError::InsufficientData {
            needed: MIN_POINTS,
            found: series.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeDelta, TimeZone, Utc};
    use wsc_core::{Geometry, Measurement, WaterbodyConfig};

    /// Monthly series for one waterbody, one point per entry of `areas`.
    pub fn monthly(id: &str, areas: &[f64]) -> Vec<Measurement> {
        let lake = WaterbodyConfig::new(id, &format!("Lake {id}"), Geometry::rectangle(0.0, 0.0, 1.0, 1.0));
        let origin = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        areas
            .iter()
            .enumerate()
            .map(|(i, &area)| Measurement::new(&lake, origin + TimeDelta::days(30 * i as i64), area))
            .collect()
    }
}
