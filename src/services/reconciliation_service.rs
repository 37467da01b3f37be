use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{attendance_repo, schedule_repo};
use crate::error::{AppError, AppResult};
use crate::models::AttendanceStatus;

/// Reason stored on synthesized absent records.
pub const ABSENT_NOTE: &str = "Tidak hadir (otomatis oleh sistem)";

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub date: Option<NaiveDate>,
    pub scheduled: usize,
    pub inserted: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileReport {
    pub dates_checked: usize,
    pub inserted: usize,
    pub failed: usize,
    pub skipped_dates: Vec<NaiveDate>,
}

/// Scheduled participants that have no record yet, deduplicated, in schedule order.
pub fn missing_participants(scheduled: &[String], recorded: &[String]) -> Vec<String> {
    let recorded: HashSet<&str> = recorded.iter().map(|s| s.as_str()).collect();
    let mut seen = HashSet::new();
    scheduled
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| !recorded.contains(s))
        .filter(|s| seen.insert(*s))
        .map(|s| s.to_string())
        .collect()
}

/// Writes an absent record for every participant of `date` that is still missing one.
/// Only dates strictly before `today` are accepted.
pub async fn reconcile_date(
    pool: &SqlitePool,
    date: NaiveDate,
    today: NaiveDate,
) -> AppResult<ReconcileOutcome> {
    if date >= today {
        return Err(AppError::bad_request(format!(
            "Tanggal {} belum lewat, tidak bisa direkonsiliasi",
            date
        )));
    }

    let scheduled = schedule_repo::participants_on(pool, date).await?;
    let recorded = attendance_repo::handles_recorded_on(pool, date).await?;
    let missing = missing_participants(&scheduled, &recorded);

    let mut outcome = ReconcileOutcome {
        date: Some(date),
        scheduled: scheduled.len(),
        ..Default::default()
    };

    for handle in missing {
        let id = Uuid::new_v4().to_string();
        let res = attendance_repo::insert_record_if_missing(
            pool,
            attendance_repo::NewAttendanceRecord {
                id: &id,
                member_handle: &handle,
                record_date: date,
                status: AttendanceStatus::Absent.as_str(),
                recorded_at: Utc::now(),
                reason: Some(ABSENT_NOTE),
                photo: None,
            },
        )
        .await;

        match res {
            Ok(0) => {
                // Someone recorded in between; nothing to do.
            }
            Ok(_) => outcome.inserted += 1,
            Err(e) => {
                warn!("absent insert failed for {} on {}: {}", handle, date, e);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Reconciles every scheduled date in `[today - lookback_days, today)`.
/// A date that fails as a whole is logged and listed in `skipped_dates`.
/// A window reaching past the calendar range is rejected.
pub async fn reconcile_past_dates(
    pool: &SqlitePool,
    today: NaiveDate,
    lookback_days: i64,
) -> AppResult<ReconcileReport> {
    let since = Duration::try_days(lookback_days.max(0))
        .and_then(|window| today.checked_sub_signed(window))
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "Rentang rekonsiliasi {} hari terlalu jauh",
                lookback_days
            ))
        })?;
    let dates = schedule_repo::scheduled_dates_between(pool, since, today).await?;

    let mut report = ReconcileReport::default();
    for date in dates {
        report.dates_checked += 1;
        match reconcile_date(pool, date, today).await {
            Ok(outcome) => {
                report.inserted += outcome.inserted;
                report.failed += outcome.failed;
            }
            Err(e) => {
                warn!("reconciliation skipped {}: {}", date, e);
                report.skipped_dates.push(date);
            }
        }
    }

    info!(
        "🗓️ Reconciliation done: dates_checked={}, inserted={}, failed={}, skipped={}",
        report.dates_checked,
        report.inserted,
        report.failed,
        report.skipped_dates.len()
    );

    Ok(report)
}
