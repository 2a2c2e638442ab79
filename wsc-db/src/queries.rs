//! Typed query methods over the `measurements` table.
//!
//! Window bounds are inclusive on both ends. Rows sharing a timestamp keep
//! their insertion order.

use crate::models::{format_timestamp, parse_timestamp};
use crate::Database;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::collections::BTreeSet;
use wsc_core::{AreaStatistics, Measurement};

const MEASUREMENT_COLUMNS: &str = "waterbody_id, name, timestamp, surface_area_hectares, \
     data_source, cloud_cover_percentage, processing_error";

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    let raw_timestamp: String = row.get(2)?;
    let timestamp = parse_timestamp(&raw_timestamp).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
    })?;
    Ok(Measurement {
        waterbody_id: row.get(0)?,
        name: row.get(1)?,
        timestamp,
        surface_area_hectares: row.get(3)?,
        data_source: row.get(4)?,
        cloud_cover_percentage: row.get(5)?,
        processing_error: row.get(6)?,
    })
}

/// Writes one already validated measurement. Shared by single inserts and
/// bulk loads so both produce identical rows.
pub(crate) fn insert_row(conn: &Connection, m: &Measurement) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO measurements
            (waterbody_id, name, timestamp, surface_area_hectares,
             data_source, cloud_cover_percentage, processing_error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            m.waterbody_id,
            m.name,
            format_timestamp(&m.timestamp),
            m.surface_area_hectares,
            m.data_source,
            m.cloud_cover_percentage,
            m.processing_error,
        ],
    )
}

impl Database {
    /// Insert one measurement and return its row id.
    ///
    /// Rejects negative or non-finite areas and out-of-range cloud cover.
    pub fn insert_measurement(&self, m: &Measurement) -> anyhow::Result<i64> {
        m.validate()?;
        let conn = self.connection()?;
        insert_row(&conn, m)?;
        let id = conn.last_insert_rowid();
        log::debug!(
            "[WSC Debug] query: inserted measurement {} for {}",
            id,
            m.waterbody_id
        );
        Ok(id)
    }

    /// Measurements of one waterbody within `[start, end]`, oldest first.
    pub fn query_measurements(
        &self,
        waterbody_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> anyhow::Result<Vec<Measurement>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE waterbody_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp, id"
        ))?;
        let rows = stmt
            .query_map(
                params![waterbody_id, format_timestamp(start), format_timestamp(end)],
                measurement_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[WSC Debug] query: query_measurements({}) returned {} records",
            waterbody_id,
            rows.len()
        );
        Ok(rows)
    }

    /// Every waterbody id with at least one measurement.
    pub fn query_waterbody_ids(&self) -> anyhow::Result<BTreeSet<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT DISTINCT waterbody_id FROM measurements")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        log::info!(
            "[WSC Debug] query: query_waterbody_ids returned {} ids",
            ids.len()
        );
        Ok(ids)
    }

    /// Most recent measurement of a waterbody. Among equal timestamps the
    /// last written wins.
    pub fn query_latest(&self, waterbody_id: &str) -> anyhow::Result<Option<Measurement>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE waterbody_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT 1"
        ))?;
        let mut rows = stmt.query_map(params![waterbody_id], measurement_from_row)?;
        let latest = rows.next().transpose()?;
        Ok(latest)
    }

    /// Min/max/average area over `[start, end]`, ignoring degraded rows.
    pub fn query_statistics(
        &self,
        waterbody_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> anyhow::Result<Option<AreaStatistics>> {
        let conn = self.connection()?;
        let (min, max, avg, count) = conn.query_row(
            "SELECT MIN(surface_area_hectares), MAX(surface_area_hectares),
                    AVG(surface_area_hectares), COUNT(*)
             FROM measurements
             WHERE waterbody_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
               AND processing_error IS NULL",
            params![waterbody_id, format_timestamp(start), format_timestamp(end)],
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;
        let stats = match (min, max, avg) {
            (Some(min), Some(max), Some(avg)) if count > 0 => Some(AreaStatistics {
                min,
                max,
                avg,
                count: count as u64,
            }),
            _ => None,
        };
        log::info!(
            "[WSC Debug] query: query_statistics({}) over {} rows",
            waterbody_id,
            count
        );
        Ok(stats)
    }

    /// Earliest and latest timestamps across all measurements.
    pub fn query_time_bounds(&self) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let conn = self.connection()?;
        let (first, last) = conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM measurements",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            },
        )?;
        match (first, last) {
            (Some(first), Some(last)) => {
                Ok(Some((parse_timestamp(&first)?, parse_timestamp(&last)?)))
            }
            _ => Ok(None),
        }
    }

    pub fn query_count(&self) -> anyhow::Result<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
