use crate::measurement::Measurement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Summary of surface area over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaStatistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: u64,
}

/// Storage for the measurement time series.
///
/// Implementations keep every write (no deduplication) and return query
/// results in ascending timestamp order with inclusive bounds.
pub trait MeasurementRepository {
    /// Stores a measurement and returns its identifier.
    fn write(&self, measurement: &Measurement) -> anyhow::Result<String>;

    fn query(
        &self,
        waterbody_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Measurement>>;

    fn list_distinct_waterbody_ids(&self) -> anyhow::Result<BTreeSet<String>>;

    fn latest(&self, waterbody_id: &str) -> anyhow::Result<Option<Measurement>>;

    fn statistics(
        &self,
        waterbody_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Option<AreaStatistics>>;

    /// Earliest and latest timestamps across all waterbodies.
    fn time_bounds(&self) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>>;

    fn count(&self) -> anyhow::Result<u64>;
}
