//! SQLite time-series store for waterbody surface area measurements.
//!
//! Implements [`wsc_core::MeasurementRepository`] on top of a single
//! `rusqlite` connection, either file-backed or in-memory, shared behind
//! `Arc<Mutex<_>>` so ingestion workers and readers can use one handle.
//!
//! # Usage
//!
//! ```rust
//! use wsc_db::Database;
//! use wsc_core::MeasurementRepository;
//!
//! let db = Database::new().unwrap();
//! db.load_measurements_csv(
//!     "waterbody_id,name,timestamp,surface_area_hectares,data_source,cloud_cover_percentage\n\
//!      lake_mead,Lake Mead,2024-01-31T23:59:59Z,41250.5,Sentinel-2,\n",
//! )
//! .unwrap();
//! assert_eq!(db.count().unwrap(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`]. Timestamps are stored as RFC 3339 UTC text
//! with second precision, so lexical and chronological order coincide.

mod loader;
pub mod models;
mod queries;
mod repository;
pub mod schema;

use anyhow::anyhow;
use log::{info, warn};
use rusqlite::Connection;
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    thread::sleep,
    time::Duration,
};

pub use models::LoadReport;

/// SQLite database holding the measurement time series.
///
/// Cloning is cheap and every clone shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Open (or create) a file-backed database.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a file-backed database, retrying with doubling back-off.
    pub fn open_with_retry(
        path: &Path,
        max_tries: u32,
        initial_delay: Duration,
    ) -> anyhow::Result<Self> {
        let mut delay = initial_delay;
        let mut last_error = anyhow!("no attempt made to open {}", path.display());
        for attempt in 1..=max_tries.max(1) {
            match Self::open(path) {
                Ok(db) => {
                    info!("[WSC Debug] db: opened {}", path.display());
                    return Ok(db);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: failed to open {}: {}",
                        attempt,
                        max_tries,
                        path.display(),
                        e
                    );
                    last_error = e;
                    if attempt < max_tries {
                        sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_error.context(format!(
            "giving up on {} after {} attempts",
            path.display(),
            max_tries
        )))
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn connection(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }
}
