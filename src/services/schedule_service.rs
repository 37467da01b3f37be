use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::{member_repo, schedule_repo};
use crate::error::{AppError, AppResult};
use crate::models::ScheduleSessionRow;
use crate::services::presensi_service::format_date_id;

pub struct ScheduleEntryView {
    pub id: String,
    pub participant: String,
    pub display_name: String,
}

pub struct ScheduleGroupView {
    pub date: String, // YYYY-MM-DD, used by the delete-group form
    pub date_label: String,
    pub code: String,
    pub entries: Vec<ScheduleEntryView>,
}

/// Splits a participant list on commas, whitespace and newlines; lowercased, deduplicated.
pub fn parse_participants(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Inserts one row per participant for `date` sharing `code`. Participants already on
/// that date with the same code are skipped. Returns the number of inserted rows.
pub async fn create_schedule(
    pool: &SqlitePool,
    date: NaiveDate,
    code: &str,
    participants: &[String],
) -> AppResult<usize> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::bad_request("Kode presensi wajib diisi"));
    }
    if participants.is_empty() {
        return Err(AppError::bad_request("Pilih minimal satu peserta"));
    }

    let known: HashSet<String> = member_repo::list_members(pool)
        .await?
        .into_iter()
        .map(|m| m.handle)
        .collect();
    let unknown: Vec<&str> = participants
        .iter()
        .map(|p| p.as_str())
        .filter(|p| !known.contains(*p))
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::bad_request(format!(
            "Pengguna tidak dikenal: {}",
            unknown.join(", ")
        )));
    }

    let existing: HashSet<String> = schedule_repo::list_for_date(pool, date)
        .await?
        .into_iter()
        .filter(|r| r.code.eq_ignore_ascii_case(code))
        .map(|r| r.participant)
        .collect();

    let mut inserted = 0;
    for participant in participants {
        if existing.contains(participant) {
            continue;
        }
        let id = Uuid::new_v4().to_string();
        schedule_repo::insert_schedule_session(
            pool,
            schedule_repo::NewScheduleSession {
                id: &id,
                session_date: date,
                participant,
                code,
                created_at: Utc::now(),
            },
        )
        .await?;
        inserted += 1;
    }

    info!("🗓️ jadwal {} code={} inserted={}", date, code, inserted);
    Ok(inserted)
}

pub async fn delete_schedule_row(pool: &SqlitePool, id: &str) -> AppResult<()> {
    if schedule_repo::delete_schedule_session(pool, id).await? == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete_schedule_group(
    pool: &SqlitePool,
    code: &str,
    date: NaiveDate,
) -> AppResult<u64> {
    let removed = schedule_repo::delete_schedule_group(pool, code.trim(), date).await?;
    if removed == 0 {
        return Err(AppError::NotFound);
    }
    info!("🗓️ jadwal group {} code={} removed={}", date, code, removed);
    Ok(removed)
}

/// Schedule rows from `from` onwards, grouped by (date, code), newest date first.
pub async fn list_schedule(pool: &SqlitePool, from: NaiveDate) -> AppResult<Vec<ScheduleGroupView>> {
    let rows = schedule_repo::list_from(pool, from).await?;
    let names: std::collections::HashMap<String, String> = member_repo::list_members(pool)
        .await?
        .into_iter()
        .map(|m| (m.handle, m.display_name))
        .collect();
    Ok(group_rows(rows, &names))
}

fn group_rows(
    rows: Vec<ScheduleSessionRow>,
    names: &std::collections::HashMap<String, String>,
) -> Vec<ScheduleGroupView> {
    let mut groups: Vec<ScheduleGroupView> = Vec::new();
    let mut current_key: Option<(NaiveDate, String)> = None;

    for row in rows {
        let key = (row.session_date, row.code.clone());
        if current_key.as_ref() != Some(&key) {
            groups.push(ScheduleGroupView {
                date: row.session_date.format("%Y-%m-%d").to_string(),
                date_label: format_date_id(row.session_date),
                code: row.code.clone(),
                entries: Vec::new(),
            });
            current_key = Some(key);
        }
        let display_name = names
            .get(&row.participant)
            .cloned()
            .unwrap_or_else(|| row.participant.clone());
        if let Some(group) = groups.last_mut() {
            group.entries.push(ScheduleEntryView {
                id: row.id,
                participant: row.participant,
                display_name,
            });
        }
    }

    groups
}
