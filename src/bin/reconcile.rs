//! One-shot reconciliation for schedulers that prefer a process over the HTTP endpoint.
//!
//! `reconcile`            reconciles the configured lookback window
//! `reconcile 2024-01-10` reconciles a single past date

use anyhow::Context;
use chrono::NaiveDate;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use presensi::config::Config;
use presensi::database;
use presensi::services::reconciliation_service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = database::connect(&config.database_url)
        .await
        .context("cannot connect to database")?;
    let today = config.today();

    if let Some(raw) = std::env::args().nth(1) {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("expected YYYY-MM-DD, got '{}'", raw))?;
        let outcome = reconciliation_service::reconcile_date(&pool, date, today).await?;
        println!(
            "reconcile {}: scheduled={}, inserted={}, failed={}",
            date, outcome.scheduled, outcome.inserted, outcome.failed
        );
        return Ok(());
    }

    let report =
        reconciliation_service::reconcile_past_dates(&pool, today, config.reconcile_lookback_days)
            .await?;
    println!(
        "reconcile: dates_checked={}, inserted={}, failed={}, skipped={}",
        report.dates_checked,
        report.inserted,
        report.failed,
        report.skipped_dates.len()
    );
    if !report.skipped_dates.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
