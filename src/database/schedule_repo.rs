use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::ScheduleSessionRow;

pub struct NewScheduleSession<'a> {
    pub id: &'a str,
    pub session_date: NaiveDate,
    pub participant: &'a str,
    pub code: &'a str,
    pub created_at: DateTime<Utc>,
}

const SQL_INSERT_SCHEDULE_SESSION: &str = r#"
INSERT INTO schedule_sessions (
  id,
  session_date,
  participant,
  code,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub async fn insert_schedule_session(
    pool: &SqlitePool,
    row: NewScheduleSession<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SCHEDULE_SESSION)
        .bind(row.id)
        .bind(row.session_date)
        .bind(row.participant)
        .bind(row.code)
        .bind(row.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LIST_FOR_DATE: &str = r#"
SELECT id, session_date, participant, code, created_at
FROM schedule_sessions
WHERE session_date = ?1
ORDER BY code ASC, participant ASC
"#;

pub async fn list_for_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> sqlx::Result<Vec<ScheduleSessionRow>> {
    sqlx::query_as::<_, ScheduleSessionRow>(SQL_LIST_FOR_DATE)
        .bind(date)
        .fetch_all(pool)
        .await
}

const SQL_LIST_FROM: &str = r#"
SELECT id, session_date, participant, code, created_at
FROM schedule_sessions
WHERE session_date >= ?1
ORDER BY session_date DESC, code ASC, participant ASC
"#;

pub async fn list_from(pool: &SqlitePool, from: NaiveDate) -> sqlx::Result<Vec<ScheduleSessionRow>> {
    sqlx::query_as::<_, ScheduleSessionRow>(SQL_LIST_FROM)
        .bind(from)
        .fetch_all(pool)
        .await
}

const SQL_PARTICIPANTS_ON: &str = r#"
SELECT DISTINCT participant
FROM schedule_sessions
WHERE session_date = ?1
ORDER BY participant ASC
"#;

pub async fn participants_on(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(SQL_PARTICIPANTS_ON)
        .bind(date)
        .fetch_all(pool)
        .await
}

const SQL_CODES_FOR_PARTICIPANT: &str = r#"
SELECT code
FROM schedule_sessions
WHERE session_date = ?1
  AND participant = ?2
"#;

pub async fn codes_for_participant(
    pool: &SqlitePool,
    date: NaiveDate,
    participant: &str,
) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(SQL_CODES_FOR_PARTICIPANT)
        .bind(date)
        .bind(participant)
        .fetch_all(pool)
        .await
}

const SQL_PAST_DATES: &str = r#"
SELECT DISTINCT session_date
FROM schedule_sessions
WHERE session_date < ?1
  AND session_date >= ?2
ORDER BY session_date ASC
"#;

/// Distinct scheduled dates in `[since, before)`.
pub async fn scheduled_dates_between(
    pool: &SqlitePool,
    since: NaiveDate,
    before: NaiveDate,
) -> sqlx::Result<Vec<NaiveDate>> {
    sqlx::query_scalar(SQL_PAST_DATES)
        .bind(before)
        .bind(since)
        .fetch_all(pool)
        .await
}

const SQL_DELETE_SCHEDULE_SESSION: &str = "DELETE FROM schedule_sessions WHERE id = ?1";

pub async fn delete_schedule_session(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SCHEDULE_SESSION)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_SCHEDULE_GROUP: &str = r#"
DELETE FROM schedule_sessions
WHERE code = ?1
  AND session_date = ?2
"#;

pub async fn delete_schedule_group(
    pool: &SqlitePool,
    code: &str,
    date: NaiveDate,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SCHEDULE_GROUP)
        .bind(code)
        .bind(date)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
