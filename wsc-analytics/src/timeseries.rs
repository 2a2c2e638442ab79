use crate::series::chronological;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wsc_core::Measurement;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub surface_area_hectares: f64,
}

/// Ordered area readings of one waterbody within a window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Timeseries {
    pub waterbody_id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub data_points: Vec<DataPoint>,
    pub count: usize,
}

/// Shapes a series for output. The name falls back to the id when the
/// series is empty.
pub fn build_timeseries(
    waterbody_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    series: &[Measurement],
) -> Timeseries {
    let data_points: Vec<DataPoint> = chronological(series)
        .into_iter()
        .map(|m| DataPoint {
            timestamp: m.timestamp,
            surface_area_hectares: m.surface_area_hectares,
        })
        .collect();
    let name = series
        .first()
        .map(|m| m.name.clone())
        .unwrap_or_else(|| waterbody_id.to_string());
    Timeseries {
        waterbody_id: waterbody_id.to_string(),
        name,
        start,
        end,
        count: data_points.len(),
        data_points,
    }
}
