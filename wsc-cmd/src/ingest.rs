//! `ingest`, `backfill` and `auth-check` commands.

use crate::{open_database, print_json};
use crate::orchestrator::{IngestionOptions, Ingestor, RetryPolicy, RunSummary};
use chrono::Utc;
use clap::Args;
use log::info;
use std::{path::PathBuf, sync::Arc, time::Duration};
use wsc_core::{ConfigError, WaterbodyConfig};
use wsc_hub::{
    Credentials, HubError, HubSettings, PasswordGrant, ProcessApiClient, RequestOptions, TokenManager,
};
use wsc_utils::dates::{DateWindow, MonthWindows};

/// Identity and processing service access.
#[derive(Args, Debug, Clone)]
pub struct HubArgs {
    /// Copernicus Data Space account name
    #[arg(long, env = "COPERNICUS_USERNAME", hide_env_values = true)]
    pub username: Option<String>,

    /// Copernicus Data Space account password
    #[arg(long, env = "COPERNICUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Override the token endpoint
    #[arg(long, env = "WSC_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Override the Process API endpoint
    #[arg(long, env = "WSC_PROCESS_URL")]
    pub process_url: Option<String>,
}

impl HubArgs {
    pub fn settings(&self) -> HubSettings {
        HubSettings::with_urls(self.token_url.clone(), self.process_url.clone())
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

/// Options shared by `ingest` and `backfill`.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Waterbody catalogue (JSON array)
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// SQLite database file
    #[arg(long, env = "WSC_DB", default_value = crate::DEFAULT_DB)]
    pub db: PathBuf,

    /// Only ingest these waterbody ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Waterbodies processed concurrently
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Water index threshold; 0.0 suits turbid or winter scenes
    #[arg(long, default_value_t = 0.2, allow_negative_numbers = true)]
    pub ndwi_threshold: f64,

    /// Maximum scene cloud coverage in percent
    #[arg(long, default_value_t = 20)]
    pub max_cloud_coverage: u8,

    /// Attempts per waterbody for transient failures
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
}

impl IngestArgs {
    pub fn options(&self) -> Result<IngestionOptions, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(IngestionOptions {
            request: RequestOptions {
                ndwi_threshold: self.ndwi_threshold,
                max_cloud_coverage: self.max_cloud_coverage,
                ..RequestOptions::default()
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
            workers: self.workers,
        })
    }

    pub fn waterbodies(&self) -> Result<Vec<WaterbodyConfig>, ConfigError> {
        let configs = WaterbodyConfig::load_config_file(&self.config)?;
        WaterbodyConfig::select(configs, &self.only)
    }
}

type LiveClient = ProcessApiClient<PasswordGrant>;

fn live_client(hub: &HubArgs) -> anyhow::Result<LiveClient> {
    let settings = hub.settings();
    let credentials = hub.credentials()?;
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| HubError::Configuration(e.to_string()))?;
    let tokens = Arc::new(TokenManager::new(PasswordGrant::new(
        client.clone(),
        &settings,
        credentials,
    )));
    Ok(ProcessApiClient::new(client, &settings, tokens))
}

fn ensure_not_aborted(summary: &RunSummary) -> anyhow::Result<()> {
    if summary.aborted {
        anyhow::bail!("ingestion aborted: authentication with the identity service failed");
    }
    Ok(())
}

/// Run one ingestion over the trailing `months_back` 30-day months.
pub async fn run_ingest(args: &IngestArgs, months_back: u32, hub: &HubArgs) -> anyhow::Result<()> {
    let waterbodies = args.waterbodies()?;
    let options = args.options()?;
    let source = live_client(hub)?;
    let db = open_database(&args.db)?;
    let window = DateWindow::months_back(Utc::now().date_naive(), months_back)?;

    let summary = Ingestor::new(&source, &db, options)
        .run(&waterbodies, window)
        .await;
    print_json(&summary)?;
    ensure_not_aborted(&summary)
}

/// Ingest each of the trailing `months` calendar months in turn.
pub async fn run_backfill(args: &IngestArgs, months: u32, hub: &HubArgs) -> anyhow::Result<()> {
    let waterbodies = args.waterbodies()?;
    let options = args.options()?;
    let source = live_client(hub)?;
    let db = open_database(&args.db)?;
    let windows = MonthWindows::trailing(Utc::now().date_naive(), months);
    info!("Backfilling {} months for {} waterbodies", months, waterbodies.len());

    let summaries = Ingestor::new(&source, &db, options)
        .backfill(&waterbodies, windows)
        .await;
    print_json(&summaries)?;
    match summaries.last() {
        Some(last) => ensure_not_aborted(last),
        None => Ok(()),
    }
}

/// Exchange credentials once and report the token lifetime.
pub async fn run_auth_check(hub: &HubArgs) -> anyhow::Result<()> {
    let source = live_client(hub)?;
    source.tokens().get_token().await?;
    let expires_at = source.tokens().expires_at().await;
    print_json(&serde_json::json!({
        "authenticated": true,
        "expires_at": expires_at,
    }))
}
