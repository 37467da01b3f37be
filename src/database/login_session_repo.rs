use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::LoginSessionRow;

const SQL_INSERT_SESSION: &str = r#"
INSERT INTO login_sessions (token, member_handle, created_at, expires_at)
VALUES (?1, ?2, ?3, ?4)
"#;

pub async fn insert_session(
    pool: &SqlitePool,
    token: &str,
    member_handle: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(member_handle)
        .bind(created_at)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LOAD_SESSION: &str = r#"
SELECT token, member_handle, created_at, expires_at
FROM login_sessions
WHERE token = ?1
LIMIT 1
"#;

pub async fn load_session(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<LoginSessionRow>> {
    sqlx::query_as::<_, LoginSessionRow>(SQL_LOAD_SESSION)
        .bind(token)
        .fetch_optional(pool)
        .await
}

const SQL_DELETE_SESSION: &str = "DELETE FROM login_sessions WHERE token = ?1";

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_SESSIONS_FOR_MEMBER: &str = r#"
SELECT token, member_handle, created_at, expires_at
FROM login_sessions
WHERE member_handle = ?1
"#;

/// Drops a member's sessions that are past `now`. Expiry is compared in Rust so the
/// stored timestamp format does not matter.
pub async fn purge_expired_for_member(
    pool: &SqlitePool,
    member_handle: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let rows = sqlx::query_as::<_, LoginSessionRow>(SQL_LIST_SESSIONS_FOR_MEMBER)
        .bind(member_handle)
        .fetch_all(pool)
        .await?;

    let mut removed = 0;
    for row in rows.into_iter().filter(|r| r.expires_at <= now) {
        removed += delete_session(pool, &row.token).await?;
    }
    Ok(removed)
}
