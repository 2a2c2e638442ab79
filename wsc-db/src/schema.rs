//! SQL schema for the measurement store.

/// Returns the full SQL schema as a single batch string.
///
/// - `measurements` - one row per observation; duplicates per
///   (waterbody, timestamp) are allowed. `processing_error` is set on rows
///   written after a raster could not be processed.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS measurements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        waterbody_id TEXT NOT NULL,
        name TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        surface_area_hectares REAL NOT NULL CHECK (surface_area_hectares >= 0),
        data_source TEXT NOT NULL,
        cloud_cover_percentage REAL,
        processing_error TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_measurements_waterbody_time
        ON measurements(waterbody_id, timestamp);
    CREATE INDEX IF NOT EXISTS idx_measurements_time ON measurements(timestamp);
    "#
}
