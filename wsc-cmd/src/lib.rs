//! Command implementations for the WSC CLI.
//!
//! Provides subcommands that ingest Sentinel-2 water masks into the local
//! measurement store, and that read the store back as time series, drought
//! and trend assessments or CSV.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde::Serialize;
use std::{path::Path, path::PathBuf, time::Duration};
use wsc_db::Database;
use wsc_utils::dates::parse_date;

pub mod exchange;
pub mod ingest;
pub mod orchestrator;
pub mod report;

use ingest::{HubArgs, IngestArgs};

/// Database file used when neither `--db` nor `WSC_DB` is given.
pub const DEFAULT_DB: &str = "wsc.sqlite";

const DB_OPEN_ATTEMPTS: u32 = 3;

/// Opens the measurement store, retrying briefly if the file is locked.
pub fn open_database(path: &Path) -> anyhow::Result<Database> {
    Database::open_with_retry(path, DB_OPEN_ATTEMPTS, Duration::from_secs(1))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Subcommand)]
pub enum Command {
    /// Measure every configured waterbody over the trailing window and store the results
    Ingest {
        #[command(flatten)]
        ingest: IngestArgs,

        /// Length of the acquisition window, in 30-day months
        #[arg(long, default_value_t = 1)]
        months_back: u32,

        #[command(flatten)]
        hub: HubArgs,
    },

    /// Run one ingestion per calendar month, oldest first
    Backfill {
        #[command(flatten)]
        ingest: IngestArgs,

        /// Number of calendar months to cover, ending with the current month
        #[arg(long, default_value_t = 12)]
        months: u32,

        #[command(flatten)]
        hub: HubArgs,
    },

    /// Exchange credentials for a token and report its expiry
    AuthCheck {
        #[command(flatten)]
        hub: HubArgs,
    },

    /// List waterbodies with stored measurements
    List {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,
    },

    /// Most recent measurement of a waterbody
    Latest {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        /// Waterbody id
        #[arg(short = 'w', long)]
        waterbody: String,
    },

    /// Measurements of a waterbody within a window
    Timeseries {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(short = 'w', long)]
        waterbody: String,

        /// Window length in 30-day months, ignored when --start is given
        #[arg(long, default_value_t = 12)]
        months_back: u32,

        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
    },

    /// Latest area with min/max/average over the past year
    SurfaceArea {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(short = 'w', long)]
        waterbody: String,
    },

    /// Drought risk for one waterbody, or all of them ranked by severity
    DroughtRisk {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(short = 'w', long)]
        waterbody: Option<String>,

        /// Look-back window in days
        #[arg(long, default_value_t = 365)]
        window_days: u32,

        /// Also use measurements recorded with a processing error
        #[arg(long)]
        include_degraded: bool,
    },

    /// Change in area between the first and last measurement of the period
    Trend {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(short = 'w', long)]
        waterbody: String,

        /// Period in 30-day months
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(3..=60))]
        months: u32,

        #[arg(long)]
        include_degraded: bool,
    },

    /// Latest area of every waterbody, largest first
    Compare {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,
    },

    /// Load measurements from a CSV file
    Import {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        /// Input CSV path
        #[arg(long)]
        csv: PathBuf,
    },

    /// Write one waterbody's measurements to a CSV file
    Export {
        #[arg(long, env = "WSC_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(short = 'w', long)]
        waterbody: String,

        /// Output CSV path
        #[arg(long)]
        csv: PathBuf,

        /// First day (YYYY-MM-DD), defaults to the earliest stored measurement
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD), defaults to the latest stored measurement
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            ingest,
            months_back,
            hub,
        } => ingest::run_ingest(&ingest, months_back, &hub).await,
        Command::Backfill { ingest, months, hub } => {
            ingest::run_backfill(&ingest, months, &hub).await
        }
        Command::AuthCheck { hub } => ingest::run_auth_check(&hub).await,
        Command::List { db } => print_json(&report::list_waterbodies(&open_database(&db)?)?),
        Command::Latest { db, waterbody } => {
            print_json(&report::latest_measurement(&open_database(&db)?, &waterbody)?)
        }
        Command::Timeseries {
            db,
            waterbody,
            months_back,
            start,
            end,
        } => {
            let db = open_database(&db)?;
            let today = Utc::now().date_naive();
            print_json(&report::timeseries(&db, &waterbody, start, end, months_back, today)?)
        }
        Command::SurfaceArea { db, waterbody } => {
            print_json(&report::surface_area(&open_database(&db)?, &waterbody, Utc::now())?)
        }
        Command::DroughtRisk {
            db,
            waterbody,
            window_days,
            include_degraded,
        } => {
            let db = open_database(&db)?;
            let assessments = report::drought_risk(
                &db,
                waterbody.as_deref(),
                window_days,
                include_degraded,
                Utc::now(),
            )?;
            match (waterbody, assessments.as_slice()) {
                (Some(_), [single]) => print_json(single),
                _ => print_json(&assessments),
            }
        }
        Command::Trend {
            db,
            waterbody,
            months,
            include_degraded,
        } => {
            let db = open_database(&db)?;
            print_json(&report::trend(&db, &waterbody, months, include_degraded, Utc::now())?)
        }
        Command::Compare { db } => print_json(&report::compare(&open_database(&db)?, Utc::now())?),
        Command::Import { db, csv } => exchange::run_import(&db, &csv),
        Command::Export {
            db,
            waterbody,
            csv,
            start,
            end,
        } => exchange::run_export(&db, &waterbody, &csv, start, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn trend_months_are_bounded() {
        assert!(Cli::try_parse_from(["wsc", "trend", "--db", "x.sqlite", "-w", "lake", "--months", "2"]).is_err());
        assert!(Cli::try_parse_from(["wsc", "trend", "--db", "x.sqlite", "-w", "lake", "--months", "61"]).is_err());
        let cli = Cli::try_parse_from(["wsc", "trend", "--db", "x.sqlite", "-w", "lake", "--months", "6"]).unwrap();
        assert!(matches!(cli.command, Command::Trend { months: 6, .. }));
    }

    #[test]
    fn timeseries_dates_parse() {
        let cli = Cli::try_parse_from([
            "wsc", "timeseries", "--db", "x.sqlite", "-w", "lake", "--start", "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Command::Timeseries { start, end, months_back, .. } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(end, None);
                assert_eq!(months_back, 12);
            }
            _ => panic!("expected timeseries"),
        }
        assert!(Cli::try_parse_from(["wsc", "timeseries", "-w", "lake", "--start", "01/02/2024"]).is_err());
    }
}
