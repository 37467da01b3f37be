use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::MemberRow;

const SQL_MEMBER_COLUMNS: &str = r#"
SELECT
    handle,
    display_name,
    origin,
    status_tag,
    note,
    profile_image,
    cover_image,
    is_admin,
    password_hash,
    created_at
FROM members
"#;

pub struct NewMember<'a> {
    pub handle: &'a str,
    pub display_name: &'a str,
    pub origin: &'a str,
    pub status_tag: &'a str,
    pub is_admin: bool,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

const SQL_INSERT_MEMBER: &str = r#"
INSERT INTO members (
  handle,
  display_name,
  origin,
  status_tag,
  is_admin,
  password_hash,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub async fn insert_member(pool: &SqlitePool, member: NewMember<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_MEMBER)
        .bind(member.handle)
        .bind(member.display_name)
        .bind(member.origin)
        .bind(member.status_tag)
        .bind(member.is_admin)
        .bind(member.password_hash)
        .bind(member.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_member(pool: &SqlitePool, handle: &str) -> sqlx::Result<Option<MemberRow>> {
    let sql = format!("{} WHERE handle = ?1 LIMIT 1", SQL_MEMBER_COLUMNS);
    sqlx::query_as::<_, MemberRow>(&sql)
        .bind(handle)
        .fetch_optional(pool)
        .await
}

pub async fn list_members(pool: &SqlitePool) -> sqlx::Result<Vec<MemberRow>> {
    let sql = format!(
        "{} ORDER BY display_name COLLATE NOCASE ASC, handle ASC",
        SQL_MEMBER_COLUMNS
    );
    sqlx::query_as::<_, MemberRow>(&sql).fetch_all(pool).await
}

const SQL_COUNT_MEMBERS: &str = "SELECT COUNT(*) FROM members";

pub async fn count_members(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar(SQL_COUNT_MEMBERS).fetch_one(pool).await
}

pub struct ProfileUpdate<'a> {
    pub display_name: &'a str,
    pub origin: &'a str,
    pub status_tag: &'a str,
    pub note: Option<&'a str>,
    pub profile_image: Option<&'a str>,
    pub cover_image: Option<&'a str>,
}

const SQL_UPDATE_PROFILE: &str = r#"
UPDATE members
SET display_name = ?1,
    origin = ?2,
    status_tag = ?3,
    note = ?4,
    profile_image = ?5,
    cover_image = ?6
WHERE handle = ?7
"#;

pub async fn update_profile(
    pool: &SqlitePool,
    handle: &str,
    update: ProfileUpdate<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_PROFILE)
        .bind(update.display_name)
        .bind(update.origin)
        .bind(update.status_tag)
        .bind(update.note)
        .bind(update.profile_image)
        .bind(update.cover_image)
        .bind(handle)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SET_ADMIN: &str = "UPDATE members SET is_admin = ?1 WHERE handle = ?2";

pub async fn set_admin(pool: &SqlitePool, handle: &str, is_admin: bool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_ADMIN)
        .bind(is_admin)
        .bind(handle)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Deletes the member together with every row that points at it.
pub async fn delete_member_cascade(pool: &SqlitePool, handle: &str) -> sqlx::Result<u64> {
    let mut tx = pool.begin().await?;

    for sql in [
        "DELETE FROM attendance_records WHERE member_handle = ?1",
        "DELETE FROM schedule_sessions WHERE participant = ?1",
        "DELETE FROM push_subscriptions WHERE member_handle = ?1",
        "DELETE FROM login_sessions WHERE member_handle = ?1",
    ] {
        sqlx::query(sql).bind(handle).execute(&mut *tx).await?;
    }

    let res = sqlx::query("DELETE FROM members WHERE handle = ?1")
        .bind(handle)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(res.rows_affected())
}
