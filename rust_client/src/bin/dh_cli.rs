//! Data Handler command-line driver
//!
//! Uploads a batch of CSV files to the merge service, then prints a summary of
//! the first available day: per-column statistics and a text histogram of the
//! first column.
//!
//! # Usage
//!
//! ```bash
//! # Upload two days of readings to a local merge service
//! cargo run --bin dh-cli -- data/day1.csv data/day2.csv
//!
//! # Only inspect what the service already holds
//! DH_BASE_URL=http://analysis.lan:8000 cargo run --bin dh-cli
//!
//! # Upload, summarize, then clear the merged data
//! cargo run --bin dh-cli -- --clear data/*.csv
//! ```
//!
//! # Environment Variables
//!
//! - `DH_BASE_URL`, `DH_API_PREFIX`, `DH_TIMEOUT_SECS`, `DH_MAX_FILES`,
//!   `DH_LOCALE`, `DH_SERVICE_TYPE`: see [`ClientConfig::from_env`]
//! - `DH_CONFIG`: path to a `data-handler.toml`, read instead of the environment
//!
//! Without `DH_CONFIG`, a `data-handler.toml` in the current directory,
//! `rust_client/` or the parent directory is used when present.
//! - `RUST_LOG`: Log level (default: info)

use std::env;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use data_handler::api::ColumnStats;
use data_handler::models::FileRef;
use data_handler::{AnalysisSession, BatchOutcome, ClientConfig, ServiceFactory, UploadManager};

const BAR_WIDTH: usize = 40;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let mut clear = false;
    let mut paths = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--clear" => clear = true,
            _ => paths.push(arg),
        }
    }

    let config = ClientConfig::load()?;
    info!(
        "Using {} service at {}",
        config.service.service_type,
        config.endpoint_url("")
    );
    let service = ServiceFactory::from_config(&config)?;

    if !paths.is_empty() {
        let manager = UploadManager::from_config(service.clone(), &config);
        let admission = manager.admit(paths.iter().map(FileRef::from_path));
        for diagnostic in &admission.diagnostics {
            warn!("{}", diagnostic);
        }

        match manager.upload().await {
            BatchOutcome::Uploaded { ids, response } => {
                info!(
                    "Uploaded {} files; merged days: {}",
                    ids.len(),
                    response.available_dates.join(", ")
                );
            }
            BatchOutcome::Failed { error, .. } => anyhow::bail!(error),
            BatchOutcome::NothingToUpload => warn!("No CSV files to upload"),
            BatchOutcome::AlreadyInFlight => warn!("An upload is already running"),
        }
    }

    let mut session = AnalysisSession::from_config(service, &config);
    session.load_dates().await?;
    let Some(first) = session.dates().first().cloned() else {
        println!("No merged data available");
        return Ok(());
    };
    session.select_date(&first).await?;

    println!("{} ({})", first.display_name, first.date);
    println!();
    print_statistics(&session);
    print_histogram(&session);

    if clear {
        session.clear_and_return().await?;
        info!("Merged data cleared");
    }
    Ok(())
}

fn print_statistics(session: &AnalysisSession) {
    println!("{}", format_statistics(session.statistics().as_deref()));
}

fn format_statistics(rows: Option<&[(&str, &ColumnStats)]>) -> String {
    let rows = match rows {
        Some(rows) if !rows.is_empty() => rows,
        _ => return "No statistics available\n".to_string(),
    };
    let mut out = format!(
        "{:<20} {:>12} {:>12} {:>12} {:>12}\n",
        "column", "avg", "min", "max", "std"
    );
    for (column, stats) in rows {
        out.push_str(&format!(
            "{:<20} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
            column, stats.avg, stats.min, stats.max, stats.std
        ));
    }
    out
}

fn print_histogram(session: &AnalysisSession) {
    let Some(view) = session.histogram_view() else {
        return;
    };
    println!("Histogram of {} ({} samples)", view.column, view.total_count);
    let peak = view.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in &view.bins {
        let bar = "#".repeat(bin.count * BAR_WIDTH / peak);
        println!(
            "{:>24} | {:<width$} {:>5.1}%",
            bin.label(),
            bar,
            bin.share_of(view.total_count),
            width = BAR_WIDTH
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_statistics_are_reported() {
        assert_eq!(format_statistics(None), "No statistics available\n");
        assert_eq!(format_statistics(Some(&[])), "No statistics available\n");
    }

    #[test]
    fn test_statistics_table() {
        let temp = ColumnStats::new(21.0, 20.0, 22.0, 1.0);
        let table = format_statistics(Some(&[("temp", &temp)]));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("column"));
        assert!(lines[1].starts_with("temp"));
        assert!(lines[1].contains("21.0000"));
    }
}
