//! Ingestion orchestrator: request, fetch, estimate and store one
//! measurement per configured waterbody.

use chrono::{DateTime, NaiveDate, Utc};
use futures::{stream, StreamExt};
use log::{error, info, warn};
use serde::Serialize;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use wsc_core::{Measurement, MeasurementRepository, WaterbodyConfig};
use wsc_hub::{build_request, HubError, ProcessRequest, RequestOptions, WaterMaskSource};
use wsc_raster::estimate;
use wsc_utils::dates::{DateWindow, MonthWindows};

/// Retry schedule for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionOptions {
    pub request: RequestOptions,
    pub retry: RetryPolicy,
    /// Waterbodies processed concurrently.
    pub workers: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        IngestionOptions {
            request: RequestOptions::default(),
            retry: RetryPolicy::default(),
            workers: 4,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Measurement stored from a decoded mask
    Success,
    /// Measurement stored with zero area because the mask could not be processed
    Degraded,
    /// Nothing stored
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub waterbody_id: String,
    pub name: String,
    pub status: ItemStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_area_hectares: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestOutcome {
    fn failed(waterbody: &WaterbodyConfig, attempts: u32, error: String) -> Self {
        IngestOutcome {
            waterbody_id: waterbody.id.clone(),
            name: waterbody.name.clone(),
            status: ItemStatus::Error,
            attempts,
            measurement_id: None,
            surface_area_hectares: None,
            water_fraction: None,
            error: Some(error),
        }
    }
}

/// Aggregate of one run. `successful` counts every item that stored a
/// measurement, degraded ones included.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_waterbodies: usize,
    pub successful: usize,
    pub degraded: usize,
    pub failed: usize,
    /// Set when an authentication failure stopped the run early.
    pub aborted: bool,
    pub results: Vec<IngestOutcome>,
}

pub struct Ingestor<'a, S, R> {
    source: &'a S,
    repository: &'a R,
    options: IngestionOptions,
}

impl<'a, S, R> Ingestor<'a, S, R>
where
    S: WaterMaskSource,
    R: MeasurementRepository,
{
    pub fn new(source: &'a S, repository: &'a R, options: IngestionOptions) -> Self {
        Ingestor {
            source,
            repository,
            options,
        }
    }

    /// Ingests every waterbody over `window`. Per-item failures are recorded
    /// in the summary and never stop the other items, except an
    /// authentication failure, after which no new requests are issued.
    pub async fn run(&self, waterbodies: &[WaterbodyConfig], window: DateWindow) -> RunSummary {
        let started_at = Utc::now();
        let timestamp = started_at.min(window.end_instant());
        let abort = AtomicBool::new(false);
        info!(
            "Ingesting {} waterbodies for {} to {} with {} workers",
            waterbodies.len(),
            window.start,
            window.end,
            self.options.workers
        );

        let results: Vec<IngestOutcome> = stream::iter(waterbodies)
            .map(|waterbody| self.ingest_one(waterbody, &window, timestamp, &abort))
            .buffered(self.options.workers.max(1))
            .collect()
            .await;

        let count = |status: ItemStatus| results.iter().filter(|r| r.status == status).count();
        let degraded = count(ItemStatus::Degraded);
        let successful = count(ItemStatus::Success) + degraded;
        let failed = count(ItemStatus::Error);
        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            window_start: window.start,
            window_end: window.end,
            total_waterbodies: waterbodies.len(),
            successful,
            degraded,
            failed,
            aborted: abort.load(Ordering::SeqCst),
            results,
        };
        info!(
            "Ingestion complete: {} successful ({} degraded), {} failed",
            summary.successful, summary.degraded, summary.failed
        );
        summary
    }

    /// One run per calendar-month window, oldest first. Stops after a run
    /// aborted on authentication.
    pub async fn backfill(
        &self,
        waterbodies: &[WaterbodyConfig],
        windows: MonthWindows,
    ) -> Vec<RunSummary> {
        let mut summaries = Vec::new();
        for window in windows {
            let summary = self.run(waterbodies, window).await;
            let aborted = summary.aborted;
            summaries.push(summary);
            if aborted {
                error!("Backfill stopped at {}: authentication failed", window.start);
                break;
            }
        }
        summaries
    }

    async fn ingest_one(
        &self,
        waterbody: &WaterbodyConfig,
        window: &DateWindow,
        timestamp: DateTime<Utc>,
        abort: &AtomicBool,
    ) -> IngestOutcome {
        if abort.load(Ordering::SeqCst) {
            return IngestOutcome::failed(
                waterbody,
                0,
                "skipped: authentication failed earlier in this run".to_string(),
            );
        }
        let request = match build_request(
            &waterbody.geometry,
            &window.start,
            &window.end,
            &self.options.request,
        ) {
            Ok(request) => request,
            Err(e) => return IngestOutcome::failed(waterbody, 0, e.to_string()),
        };

        let (bytes, attempts) = match self.fetch_with_retry(&request, waterbody, abort).await {
            Ok(fetched) => fetched,
            Err((e, attempts)) => {
                if e.is_authentication() {
                    error!("Authentication failed, aborting remaining waterbodies: {}", e);
                    abort.store(true, Ordering::SeqCst);
                } else {
                    error!("{}: {}", waterbody.id, e);
                }
                return IngestOutcome::failed(waterbody, attempts, e.to_string());
            }
        };

        let estimate = estimate(&bytes, &waterbody.geometry);
        let area = *estimate.area();
        let mut measurement = Measurement::new(waterbody, timestamp, area.surface_area_hectares);
        if let Some(reason) = estimate.error() {
            measurement = measurement.with_processing_error(reason);
        }
        match self.repository.write(&measurement) {
            Ok(id) => {
                info!(
                    "{}: {:.2} ha ({:.2}% water)",
                    waterbody.id,
                    area.surface_area_hectares,
                    area.water_fraction * 100.0
                );
                IngestOutcome {
                    waterbody_id: waterbody.id.clone(),
                    name: waterbody.name.clone(),
                    status: if estimate.is_degraded() {
                        ItemStatus::Degraded
                    } else {
                        ItemStatus::Success
                    },
                    attempts,
                    measurement_id: Some(id),
                    surface_area_hectares: Some(area.surface_area_hectares),
                    water_fraction: Some(area.water_fraction),
                    error: measurement.processing_error,
                }
            }
            Err(e) => IngestOutcome::failed(waterbody, attempts, format!("storage: {:#}", e)),
        }
    }

    async fn fetch_with_retry(
        &self,
        request: &ProcessRequest,
        waterbody: &WaterbodyConfig,
        abort: &AtomicBool,
    ) -> Result<(Vec<u8>, u32), (HubError, u32)> {
        let max_attempts = self.options.retry.max_attempts.max(1);
        let mut delay = self.options.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.source.fetch_mask(request).await {
                Ok(bytes) => return Ok((bytes, attempt)),
                Err(e)
                    if e.is_retryable()
                        && attempt < max_attempts
                        && !abort.load(Ordering::SeqCst) =>
                {
                    warn!(
                        "Attempt {}/{}: {} failed: {}, retrying in {:?}",
                        attempt, max_attempts, waterbody.id, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }
}
