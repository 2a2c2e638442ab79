use crate::Database;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use wsc_core::{AreaStatistics, Measurement, MeasurementRepository};

impl MeasurementRepository for Database {
    fn write(&self, measurement: &Measurement) -> anyhow::Result<String> {
        Ok(self.insert_measurement(measurement)?.to_string())
    }

    fn query(
        &self,
        waterbody_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Measurement>> {
        self.query_measurements(waterbody_id, &start, &end)
    }

    fn list_distinct_waterbody_ids(&self) -> anyhow::Result<BTreeSet<String>> {
        self.query_waterbody_ids()
    }

    fn latest(&self, waterbody_id: &str) -> anyhow::Result<Option<Measurement>> {
        self.query_latest(waterbody_id)
    }

    fn statistics(
        &self,
        waterbody_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Option<AreaStatistics>> {
        self.query_statistics(waterbody_id, &start, &end)
    }

    fn time_bounds(&self) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        self.query_time_bounds()
    }

    fn count(&self) -> anyhow::Result<u64> {
        self.query_count()
    }
}
