use crate::cli::Cli;
use crate::indexer::{IndexerConfig, TrendingRequest, fetch_trending};
use crate::progress::{ProgressState, Stage, run_with_spinner};
use crate::report::{HtmlReportContext, HtmlReportPaths, save_html_report};
use crate::summary::{SummaryContext, SummaryPaths, print_summary};
use crate::trending::{CollectionSnapshot, FormattedRow, build_rows, compute_change};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use csv::Writer;
use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::Client;
use serde::Serialize;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

mod cli;
mod formatting;
mod indexer;
mod progress;
mod report;
mod summary;
mod trending;

const HTTP_TIMEOUT_SECONDS: u64 = 20;

#[tokio::main]
async fn main() -> Result<()> {
    colored::control::set_override(true);

    let mut cli = Cli::parse();

    if let Some(command) = cli.command.take() {
        crate::cli::handle_command(command)?;
        return Ok(());
    }

    let run_started_at = Local::now();
    let config = cli.indexer_config();

    let client = Client::builder()
        .user_agent(concat!("suirank/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .context("failed to build HTTP client")?;

    let request = TrendingRequest {
        period: cli.period,
        sort_by: cli.sort_by,
        offset: cli.offset,
        limit: cli.limit,
    };

    let progress = (!cli.no_progress).then(ProgressState::new);
    let snapshots = fetch_stage(&client, &config, &request, progress.as_ref()).await?;
    let rows = derive_stage(&snapshots, progress.as_ref()).await?;

    let csv_path = match cli.save_csv.as_ref() {
        Some(path) => Some(save_trending_csv(path, &snapshots, cli.archive_csv).await?),
        None => None,
    };

    if let Some(path) = cli.save_html.as_ref() {
        let html_context = HtmlReportContext {
            period: cli.period,
            sort_by: cli.sort_by,
            run_started_at: &run_started_at,
            rows: &rows,
            full_output: cli.full_output,
            paths: HtmlReportPaths {
                csv: csv_path.as_deref(),
            },
            output_path: path.as_path(),
        };
        save_html_report(path.as_path(), &html_context).await?;
    }

    print_summary(&SummaryContext {
        collection_count: snapshots.len(),
        period: cli.period,
        sort_by: cli.sort_by,
        run_started_at: &run_started_at,
        paths: SummaryPaths {
            csv: csv_path.as_deref(),
            html: cli.save_html.as_deref(),
        },
        rows: &rows,
        full_output: cli.full_output,
    });

    Ok(())
}

async fn fetch_stage(
    client: &Client,
    config: &IndexerConfig,
    request: &TrendingRequest,
    progress: Option<&ProgressState>,
) -> Result<Vec<CollectionSnapshot>> {
    let fut = fetch_trending(client, config, request);
    match progress {
        Some(progress) => {
            run_with_spinner(progress, Stage::Fetch, "trending collections", fut).await
        }
        None => fut.await,
    }
}

async fn derive_stage(
    snapshots: &[CollectionSnapshot],
    progress: Option<&ProgressState>,
) -> Result<Vec<FormattedRow>> {
    let fut = async { Ok(build_rows(snapshots)) };
    match progress {
        Some(progress) => run_with_spinner(progress, Stage::Derive, "leaderboard rows", fut).await,
        None => fut.await,
    }
}

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    position: usize,
    id: &'a str,
    title: &'a str,
    verified: bool,
    floor: Option<f64>,
    trades_count: u64,
    trades_change_pct: Option<f64>,
    usd_volume: f64,
    usd_volume_change_pct: Option<f64>,
    volume: f64,
    volume_change_pct: Option<f64>,
}

fn finite_change(current: f64, previous: f64) -> Option<f64> {
    let change = compute_change(current, previous);
    change.is_finite().then_some(change)
}

fn serialize_trending(snapshots: &[CollectionSnapshot]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for (idx, snapshot) in snapshots.iter().enumerate() {
        let record = CsvRecord {
            position: idx + 1,
            id: snapshot.id.as_str(),
            title: snapshot.title.as_str(),
            verified: snapshot.verified,
            floor: snapshot.floor,
            trades_count: snapshot.current_trades_count.max(0.0) as u64,
            trades_change_pct: finite_change(
                snapshot.current_trades_count,
                snapshot.previous_trades_count,
            ),
            usd_volume: snapshot.current_usd_volume,
            usd_volume_change_pct: finite_change(
                snapshot.current_usd_volume,
                snapshot.previous_usd_volume,
            ),
            volume: snapshot.current_volume,
            volume_change_pct: finite_change(snapshot.current_volume, snapshot.previous_volume),
        };
        writer
            .serialize(record)
            .context("failed to serialize trending record")?;
    }
    finalize_writer(writer, "trending CSV writer")
}

async fn save_trending_csv(
    path: &Path,
    snapshots: &[CollectionSnapshot],
    archive: bool,
) -> Result<PathBuf> {
    let serialized = serialize_trending(snapshots)?;
    if archive {
        let archived = archive_bytes(&serialized)?;
        let path = gz_path(path);
        write_output_file(&path, &archived).await?;
        Ok(path)
    } else {
        write_output_file(path, &serialized).await?;
        Ok(path.to_path_buf())
    }
}

fn archive_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .context("failed to gzip CSV output")?;
    encoder.finish().context("failed to finalize gzip stream")
}

fn gz_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".gz");
    PathBuf::from(os)
}

fn finalize_writer(mut writer: Writer<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
    writer
        .flush()
        .with_context(|| format!("failed to flush {label}"))?;
    writer
        .into_inner()
        .with_context(|| format!("failed to finalize {label}"))
}

pub(crate) async fn write_output_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}
