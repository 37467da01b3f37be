use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::AttendanceRecordRow;

pub struct NewAttendanceRecord<'a> {
    pub id: &'a str,
    pub member_handle: &'a str,
    pub record_date: NaiveDate,
    pub status: &'a str, // present|excused|absent
    pub recorded_at: DateTime<Utc>,
    pub reason: Option<&'a str>,
    pub photo: Option<&'a str>,
}

const SQL_INSERT_RECORD: &str = r#"
INSERT INTO attendance_records (
  id,
  member_handle,
  record_date,
  status,
  recorded_at,
  reason,
  photo
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

/// Fails with a unique violation when the member already has a record that day.
pub async fn insert_record(pool: &SqlitePool, rec: NewAttendanceRecord<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_RECORD)
        .bind(rec.id)
        .bind(rec.member_handle)
        .bind(rec.record_date)
        .bind(rec.status)
        .bind(rec.recorded_at)
        .bind(rec.reason)
        .bind(rec.photo)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_INSERT_RECORD_IF_MISSING: &str = r#"
INSERT INTO attendance_records (
  id,
  member_handle,
  record_date,
  status,
  recorded_at,
  reason,
  photo
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT (member_handle, record_date) DO NOTHING
"#;

/// Returns 0 when a record for that member and day already exists.
pub async fn insert_record_if_missing(
    pool: &SqlitePool,
    rec: NewAttendanceRecord<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_RECORD_IF_MISSING)
        .bind(rec.id)
        .bind(rec.member_handle)
        .bind(rec.record_date)
        .bind(rec.status)
        .bind(rec.recorded_at)
        .bind(rec.reason)
        .bind(rec.photo)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_RECORD: &str = r#"
SELECT id, member_handle, record_date, status, recorded_at, reason, photo
FROM attendance_records
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_record(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<AttendanceRecordRow>> {
    sqlx::query_as::<_, AttendanceRecordRow>(SQL_LOAD_RECORD)
        .bind(id)
        .fetch_optional(pool)
        .await
}

const SQL_LOAD_FOR_MEMBER_ON: &str = r#"
SELECT id, member_handle, record_date, status, recorded_at, reason, photo
FROM attendance_records
WHERE member_handle = ?1
  AND record_date = ?2
LIMIT 1
"#;

pub async fn load_for_member_on(
    pool: &SqlitePool,
    member_handle: &str,
    date: NaiveDate,
) -> sqlx::Result<Option<AttendanceRecordRow>> {
    sqlx::query_as::<_, AttendanceRecordRow>(SQL_LOAD_FOR_MEMBER_ON)
        .bind(member_handle)
        .bind(date)
        .fetch_optional(pool)
        .await
}

const SQL_HANDLES_RECORDED_ON: &str = r#"
SELECT DISTINCT member_handle
FROM attendance_records
WHERE record_date = ?1
"#;

pub async fn handles_recorded_on(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(SQL_HANDLES_RECORDED_ON)
        .bind(date)
        .fetch_all(pool)
        .await
}

const SQL_LIST_IN_RANGE: &str = r#"
SELECT id, member_handle, record_date, status, recorded_at, reason, photo
FROM attendance_records
WHERE record_date >= ?1
  AND record_date <= ?2
ORDER BY record_date ASC, member_handle ASC
"#;

pub async fn list_in_range(
    pool: &SqlitePool,
    from: NaiveDate,
    to: NaiveDate,
) -> sqlx::Result<Vec<AttendanceRecordRow>> {
    sqlx::query_as::<_, AttendanceRecordRow>(SQL_LIST_IN_RANGE)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
}

const SQL_LIST_FOR_MEMBER_IN_RANGE: &str = r#"
SELECT id, member_handle, record_date, status, recorded_at, reason, photo
FROM attendance_records
WHERE member_handle = ?1
  AND record_date >= ?2
  AND record_date <= ?3
ORDER BY record_date DESC
"#;

pub async fn list_for_member_in_range(
    pool: &SqlitePool,
    member_handle: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> sqlx::Result<Vec<AttendanceRecordRow>> {
    sqlx::query_as::<_, AttendanceRecordRow>(SQL_LIST_FOR_MEMBER_IN_RANGE)
        .bind(member_handle)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
}

const SQL_LIST_PHOTOS_FOR_MEMBER: &str = r#"
SELECT photo
FROM attendance_records
WHERE member_handle = ?1
  AND photo IS NOT NULL
"#;

pub async fn list_photos_for_member(
    pool: &SqlitePool,
    member_handle: &str,
) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(SQL_LIST_PHOTOS_FOR_MEMBER)
        .bind(member_handle)
        .fetch_all(pool)
        .await
}

const SQL_DELETE_RECORD: &str = "DELETE FROM attendance_records WHERE id = ?1";

pub async fn delete_record(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_RECORD).bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}
