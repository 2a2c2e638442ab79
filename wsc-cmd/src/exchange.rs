//! CSV import and export of stored measurements.

use crate::{open_database, print_json};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use std::{fs, io::Write, path::Path};
use wsc_core::MeasurementRepository;
use wsc_db::{Database, LoadReport};
use wsc_utils::dates::{end_of_day, start_of_day};

/// Export range: explicit dates win, otherwise the full stored extent.
/// `None` when the store is empty and no bound was given.
fn export_range(
    db: &Database,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let bounds = db.time_bounds()?;
    let start = start.map(start_of_day).or(bounds.map(|(first, _)| first));
    let end = end.map(end_of_day).or(bounds.map(|(_, last)| last));
    Ok(start.zip(end))
}

pub fn export_measurements<W: Write>(
    db: &Database,
    waterbody_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    writer: W,
) -> anyhow::Result<usize> {
    match export_range(db, start, end)? {
        Some((start, end)) => db.export_measurements_csv(waterbody_id, &start, &end, writer),
        None => Ok(0),
    }
}

pub fn run_import(db_path: &Path, csv_path: &Path) -> anyhow::Result<()> {
    let csv_data = fs::read_to_string(csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let db = open_database(db_path)?;
    let report: LoadReport = db.load_measurements_csv(&csv_data)?;
    print_json(&report)
}

pub fn run_export(
    db_path: &Path,
    waterbody_id: &str,
    csv_path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let db = open_database(db_path)?;
    let file = fs::File::create(csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    let rows = export_measurements(&db, waterbody_id, start, end, file)?;
    info!("Exported {} rows for {} to {}", rows, waterbody_id, csv_path.display());
    print_json(&serde_json::json!({ "waterbody_id": waterbody_id, "rows": rows }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
waterbody_id,name,timestamp,surface_area_hectares,data_source,cloud_cover_percentage
lake_mead,Lake Mead,2024-01-31T23:59:59Z,41250.5,Sentinel-2,
lake_mead,Lake Mead,2024-02-29T23:59:59Z,40800,Sentinel-2,12.5
lake_mead,Lake Mead,2024-03-31T23:59:59Z,40100,Sentinel-2,
lake_powell,Lake Powell,2024-02-29T23:59:59Z,55000,Sentinel-2,
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn export_defaults_to_stored_extent() {
        let db = Database::new().unwrap();
        db.load_measurements_csv(SAMPLE_CSV).unwrap();

        let mut out = Vec::new();
        let rows = export_measurements(&db, "lake_mead", None, None, &mut out).unwrap();
        assert_eq!(rows, 3);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("waterbody_id,name,timestamp"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn export_honours_explicit_bounds() {
        let db = Database::new().unwrap();
        db.load_measurements_csv(SAMPLE_CSV).unwrap();

        let mut out = Vec::new();
        let rows =
            export_measurements(&db, "lake_mead", Some(ymd(2024, 2, 1)), Some(ymd(2024, 2, 29)), &mut out)
                .unwrap();
        assert_eq!(rows, 1);

        let rows = export_measurements(&db, "lake_mead", Some(ymd(2024, 3, 1)), None, std::io::sink()).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn exported_csv_loads_back() {
        let source = Database::new().unwrap();
        source.load_measurements_csv(SAMPLE_CSV).unwrap();
        let mut out = Vec::new();
        export_measurements(&source, "lake_mead", None, None, &mut out).unwrap();

        let target = Database::new().unwrap();
        let report = target.load_measurements_csv(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(report, LoadReport { loaded: 3, skipped: 0 });
        let latest = target.latest("lake_mead").unwrap().unwrap();
        assert_eq!(latest.surface_area_hectares, 40100.0);
    }

    #[test]
    fn empty_store_exports_nothing() {
        let db = Database::new().unwrap();
        let mut out = Vec::new();
        assert_eq!(export_measurements(&db, "lake_mead", None, None, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
