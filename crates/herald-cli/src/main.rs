//! Command-line entry point for the herald notification queue.
//!
//! - `enqueue`: add a job
//! - `process`: run one batch (what an external scheduler calls)
//! - `run`: process on an interval until Ctrl-C
//! - `stats` / `show`: inspect the queue

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use herald_core::domain::{JobId, NewJob};
use herald_core::impls::{FileJobStore, HttpDeliveryClient, LogDeliveryClient};
use herald_core::ports::{Clock, DeliveryClient, IdGenerator, SystemClock, UlidGenerator};
use herald_core::{App, AppBuilder, HeraldConfig, HeraldError, observability};
use serde::Serialize;
use tracing::{info, warn};

/// Durable notification email queue
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Enqueue, deliver and inspect HR notification emails", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Job store file (overrides `store_path` from the config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Log emails instead of sending them, even if a provider is configured
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a notification job to the queue
    Enqueue {
        /// Job kind, e.g. onboarding-notice, probation-warning, monthly-digest, manual
        kind: String,

        /// JSON payload, or @path to read it from a file
        #[arg(long)]
        payload: Option<String>,

        /// 1 (most urgent) .. 10
        #[arg(long)]
        priority: Option<i32>,

        /// Earliest send time (RFC 3339)
        #[arg(long)]
        send_at: Option<String>,

        #[arg(long)]
        max_retries: Option<u32>,

        /// Do not create the history record
        #[arg(long)]
        no_history: bool,
    },
    /// Process one batch of due jobs
    Process {
        /// Maximum jobs to claim (defaults to `batch_size`)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Process batches periodically until interrupted
    Run {
        /// Seconds between batches (defaults to `interval_secs`)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Show counts by status and the most recent jobs
    Stats,
    /// Show one job with its history and attempts
    Show {
        /// Job id, with or without the `job-` prefix
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli).context("loading configuration")?;
    observability::init(&config.log_level);

    let app = build_app(config, cli.dry_run)
        .await
        .context("starting the queue")?;

    match cli.command {
        Commands::Enqueue {
            kind,
            payload,
            priority,
            send_at,
            max_retries,
            no_history,
        } => {
            let mut job = NewJob::new(kind, read_payload(payload.as_deref())?);
            job.priority = priority;
            job.max_retries = max_retries;
            job.send_at = send_at.as_deref().map(parse_time).transpose()?;
            job.with_history = !no_history;

            let record = app.enqueue(job).await?;
            print_json(&record.summary())?;
        }
        Commands::Process { limit } => {
            let report = app.processor.process_batch(limit).await?;
            print_json(&report)?;
        }
        Commands::Run { .. } => {
            let schedule = app.schedule();
            info!(interval_secs = app.config.interval_secs, "running; press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
            info!("shutdown requested, finishing in-flight batch");
            schedule.shutdown_and_join().await;
        }
        Commands::Stats => {
            print_json(&app.stats.stats().await?)?;
        }
        Commands::Show { job_id } => {
            let id: JobId = job_id.parse()?;
            match app.stats.job(id).await? {
                Some(detail) => print_json(&detail)?,
                None => bail!("job {id} not found"),
            }
        }
    }

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<HeraldConfig, HeraldError> {
    let mut config = match &cli.config {
        Some(path) => HeraldConfig::load(path)?,
        None => HeraldConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    if let Commands::Run {
        interval: Some(secs),
    } = cli.command
    {
        config.interval_secs = secs;
    }
    Ok(config)
}

async fn build_app(config: HeraldConfig, dry_run: bool) -> Result<App, HeraldError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(SystemClock));

    let store = FileJobStore::open(&config.store_path, ids.clone(), clock.clone())
        .await?
        .with_defaults(config.defaults.clone());

    let delivery: Arc<dyn DeliveryClient> = match (&config.provider, dry_run) {
        (Some(provider), false) => {
            Arc::new(HttpDeliveryClient::new(provider, config.send_timeout())?)
        }
        (Some(_), true) => Arc::new(LogDeliveryClient),
        (None, _) => {
            warn!("no [provider] configured; emails are logged, not sent");
            Arc::new(LogDeliveryClient)
        }
    };

    Ok(AppBuilder::new()
        .config(config)
        .store(Arc::new(store))
        .delivery(delivery)
        .clock(clock)
        .ids(ids)
        .build()?)
}

fn read_payload(arg: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let Some(arg) = arg else {
        return Ok(serde_json::json!({}));
    };
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading payload file {path}"))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&raw).context("payload is not valid JSON")
}

fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("invalid --send-at `{raw}`; expected RFC 3339"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_enqueue() {
        let cli = Cli::try_parse_from([
            "herald",
            "--store",
            "/tmp/q.json",
            "enqueue",
            "manual",
            "--payload",
            r#"{"recipients":["a@example.com"]}"#,
            "--priority",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/q.json")));
        assert!(matches!(
            cli.command,
            Commands::Enqueue { ref kind, priority: Some(1), .. } if kind == "manual"
        ));
    }

    #[test]
    fn command_line_overrides_config() {
        let cli = Cli::try_parse_from(["herald", "--store", "/tmp/q.json", "run", "--interval", "5"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/q.json"));
        assert_eq!(config.interval_secs, 5);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let cli = Cli::try_parse_from(["herald", "--config", "/nonexistent/herald.toml", "stats"])
            .unwrap();
        assert!(matches!(load_config(&cli), Err(HeraldError::Config(_))));
    }

    #[test]
    fn payload_defaults_to_empty_object() {
        assert_eq!(read_payload(None).unwrap(), serde_json::json!({}));
        assert!(read_payload(Some("{not json")).is_err());
    }

    #[test]
    fn send_at_must_be_rfc3339() {
        assert!(parse_time("2025-03-01T09:00:00+01:00").is_ok());
        assert!(parse_time("tomorrow").is_err());
    }
}
