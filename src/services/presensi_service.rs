use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{attendance_repo, schedule_repo};
use crate::error::{AppError, AppResult};
use crate::models::{AttendanceRecordRow, AttendanceStatus};
use crate::services::photo_store::{self, PhotoStore};
use crate::services::rekap_service;

const MAX_REASON_CHARS: usize = 500;

pub struct TodayView {
    pub date_label: String,
    pub is_scheduled: bool,
    pub status_label: Option<String>,
    pub can_submit: bool,
}

pub struct HistoryEntryView {
    pub id: String,
    pub date_label: String,
    pub status: String,
    pub status_label: String,
    pub reason: Option<String>,
    pub photo_url: Option<String>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn already_recorded() -> AppError {
    AppError::conflict("Kamu sudah tercatat untuk hari ini")
}

/// Marks the member present for `today` when `code` matches one of today's sessions naming them.
pub async fn check_in(
    pool: &SqlitePool,
    member_handle: &str,
    code: &str,
    today: NaiveDate,
) -> AppResult<AttendanceRecordRow> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::bad_request("Kode presensi wajib diisi"));
    }

    if attendance_repo::load_for_member_on(pool, member_handle, today)
        .await?
        .is_some()
    {
        return Err(already_recorded());
    }

    let codes = schedule_repo::codes_for_participant(pool, today, member_handle).await?;
    if codes.is_empty() {
        return Err(AppError::bad_request("Kamu tidak terjadwal hari ini"));
    }
    if !codes.iter().any(|c| c.trim().eq_ignore_ascii_case(code)) {
        return Err(AppError::bad_request("Kode presensi salah"));
    }

    let id = Uuid::new_v4().to_string();
    let res = attendance_repo::insert_record(
        pool,
        attendance_repo::NewAttendanceRecord {
            id: &id,
            member_handle,
            record_date: today,
            status: AttendanceStatus::Present.as_str(),
            recorded_at: Utc::now(),
            reason: None,
            photo: None,
        },
    )
    .await;
    match res {
        Ok(()) => {}
        Err(e) if is_unique_violation(&e) => return Err(already_recorded()),
        Err(e) => return Err(e.into()),
    }

    info!("✅ check-in {} on {}", member_handle, today);
    attendance_repo::load_record(pool, &id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Stores the photo, then inserts an excused record. The photo is removed again when the
/// insert is refused.
pub async fn submit_izin(
    pool: &SqlitePool,
    photos: &PhotoStore,
    member_handle: &str,
    reason: &str,
    photo_data_url: &str,
    today: NaiveDate,
) -> AppResult<AttendanceRecordRow> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::bad_request("Alasan izin wajib diisi"));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(AppError::bad_request("Alasan izin terlalu panjang"));
    }
    if photo_data_url.trim().is_empty() {
        return Err(AppError::bad_request("Foto bukti izin wajib dilampirkan"));
    }

    if attendance_repo::load_for_member_on(pool, member_handle, today)
        .await?
        .is_some()
    {
        return Err(already_recorded());
    }

    let photo = photos.save_data_url("izin", photo_data_url).await?;

    let id = Uuid::new_v4().to_string();
    let res = attendance_repo::insert_record(
        pool,
        attendance_repo::NewAttendanceRecord {
            id: &id,
            member_handle,
            record_date: today,
            status: AttendanceStatus::Excused.as_str(),
            recorded_at: Utc::now(),
            reason: Some(reason),
            photo: Some(&photo),
        },
    )
    .await;

    if let Err(e) = res {
        if let Err(cleanup) = photos.remove(&photo).await {
            warn!("could not remove orphan photo {}: {}", photo, cleanup);
        }
        if is_unique_violation(&e) {
            return Err(already_recorded());
        }
        return Err(e.into());
    }

    info!("📝 izin {} on {}", member_handle, today);
    attendance_repo::load_record(pool, &id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn load_today_view(
    pool: &SqlitePool,
    member_handle: &str,
    today: NaiveDate,
) -> AppResult<TodayView> {
    let codes = schedule_repo::codes_for_participant(pool, today, member_handle).await?;
    let record = attendance_repo::load_for_member_on(pool, member_handle, today).await?;
    let status_label = record
        .as_ref()
        .and_then(|r| r.attendance_status())
        .map(|s| s.label().to_string());

    Ok(TodayView {
        date_label: format_date_id(today),
        is_scheduled: !codes.is_empty(),
        can_submit: record.is_none(),
        status_label,
    })
}

/// The member's records from the last `days` days, newest first.
pub async fn load_history(
    pool: &SqlitePool,
    member_handle: &str,
    today: NaiveDate,
    days: i64,
) -> AppResult<Vec<HistoryEntryView>> {
    let from = today - Duration::days(days.max(0));
    let rows = attendance_repo::list_for_member_in_range(pool, member_handle, from, today).await?;
    Ok(rows.into_iter().map(history_entry).collect())
}

/// All of the member's records in one calendar month, newest first.
pub async fn load_member_month(
    pool: &SqlitePool,
    member_handle: &str,
    year: i32,
    month: u32,
) -> AppResult<Vec<HistoryEntryView>> {
    let (from, to) = rekap_service::month_range(year, month)?;
    let rows = attendance_repo::list_for_member_in_range(pool, member_handle, from, to).await?;
    Ok(rows.into_iter().map(history_entry).collect())
}

pub fn history_entry(row: AttendanceRecordRow) -> HistoryEntryView {
    let status_label = row
        .attendance_status()
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| row.status.clone());
    HistoryEntryView {
        date_label: format_date_id(row.record_date),
        status_label,
        photo_url: row.photo.as_deref().map(photo_store::public_url),
        id: row.id,
        status: row.status,
        reason: row.reason,
    }
}

/// Deletes one record (admin action) and its photo.
pub async fn delete_attendance(
    pool: &SqlitePool,
    photos: &PhotoStore,
    id: &str,
) -> AppResult<()> {
    let Some(row) = attendance_repo::load_record(pool, id).await? else {
        return Err(AppError::NotFound);
    };
    attendance_repo::delete_record(pool, id).await?;
    if let Some(photo) = row.photo.as_deref() {
        if let Err(e) = photos.remove(photo).await {
            warn!("could not remove photo {} of record {}: {}", photo, id, e);
        }
    }
    info!("🗑️ attendance {} of {} on {} deleted", id, row.member_handle, row.record_date);
    Ok(())
}

/// "Rabu, 10 Januari 2024"
pub fn format_date_id(date: NaiveDate) -> String {
    use chrono::Datelike;

    let weekday = match date.weekday() {
        chrono::Weekday::Mon => "Senin",
        chrono::Weekday::Tue => "Selasa",
        chrono::Weekday::Wed => "Rabu",
        chrono::Weekday::Thu => "Kamis",
        chrono::Weekday::Fri => "Jumat",
        chrono::Weekday::Sat => "Sabtu",
        chrono::Weekday::Sun => "Minggu",
    };
    let month = rekap_service::month_label(date.year(), date.month());
    format!("{}, {} {}", weekday, date.day(), month)
}
