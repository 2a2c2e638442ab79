//! CSV import and export of measurements.
//!
//! # CSV Format
//!
//! With headers: `waterbody_id,name,timestamp,surface_area_hectares,data_source,cloud_cover_percentage`
//! and an optional trailing `processing_error` column. Timestamps are RFC 3339
//! or bare `YYYY-MM-DD` dates (midnight UTC).

use crate::models::{parse_timestamp, LoadReport, MeasurementRow};
use crate::queries::insert_row;
use crate::Database;
use chrono::{DateTime, Utc};
use csv::StringRecord;
use std::io::Write;
use wsc_core::measurement::SENTINEL_2;
use wsc_core::Measurement;

fn optional_field(r: &StringRecord, idx: usize) -> Option<&str> {
    r.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn measurement_from_record(r: &StringRecord) -> anyhow::Result<Measurement> {
    let waterbody_id = r.get(0).unwrap_or("").trim();
    let name = r.get(1).unwrap_or("").trim();
    let timestamp = parse_timestamp(r.get(2).unwrap_or(""))?;
    let area: f64 = r.get(3).unwrap_or("").trim().parse()?;
    let cloud_cover = optional_field(r, 5).map(str::parse::<f64>).transpose()?;
    let m = Measurement {
        waterbody_id: waterbody_id.to_string(),
        name: name.to_string(),
        timestamp,
        surface_area_hectares: area,
        data_source: optional_field(r, 4).unwrap_or(SENTINEL_2).to_string(),
        cloud_cover_percentage: cloud_cover,
        processing_error: optional_field(r, 6).map(str::to_string),
    };
    m.validate()?;
    Ok(m)
}

impl Database {
    /// Load measurements from a CSV string in one transaction.
    ///
    /// Rows that fail to parse or validate are skipped and counted.
    ///
    /// # Example CSV
    /// ```text
    /// waterbody_id,name,timestamp,surface_area_hectares,data_source,cloud_cover_percentage
    /// lake_mead,Lake Mead,2024-01-31T23:59:59Z,41250.5,Sentinel-2,
    /// ```
    pub fn load_measurements_csv(&self, csv_data: &str) -> anyhow::Result<LoadReport> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut report = LoadReport::default();
        for (line, result) in rdr.records().enumerate() {
            let parsed = result
                .map_err(anyhow::Error::from)
                .and_then(|r| measurement_from_record(&r));
            let m = match parsed {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Skipping CSV row {}: {}", line + 2, e);
                    report.skipped += 1;
                    continue;
                }
            };
            insert_row(&tx, &m)?;
            report.loaded += 1;
        }
        tx.commit()?;
        log::info!(
            "[WSC Debug] loader: Loaded {} measurements, skipped {} malformed",
            report.loaded,
            report.skipped
        );
        Ok(report)
    }

    /// Write one waterbody's measurements in `[start, end]` as CSV with
    /// headers. Returns the number of rows written.
    pub fn export_measurements_csv<W: Write>(
        &self,
        waterbody_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        writer: W,
    ) -> anyhow::Result<usize> {
        let rows = self.query_measurements(waterbody_id, start, end)?;
        let mut wtr = csv::Writer::from_writer(writer);
        for m in &rows {
            wtr.serialize(MeasurementRow::from(m))?;
        }
        wtr.flush()?;
        Ok(rows.len())
    }
}
