//! SQLite schema, versioned through `PRAGMA user_version`.
//!
//! Migrations are forward-only. A fresh database gets the full v1 schema.

use sqlx::SqlitePool;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS members (
    handle        TEXT PRIMARY KEY NOT NULL,
    display_name  TEXT NOT NULL,
    origin        TEXT NOT NULL DEFAULT '',
    status_tag    TEXT NOT NULL DEFAULT '',
    note          TEXT,
    profile_image TEXT,
    cover_image   TEXT,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedule_sessions (
    id           TEXT PRIMARY KEY NOT NULL,
    session_date TEXT NOT NULL,
    participant  TEXT NOT NULL,
    code         TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schedule_sessions_date
    ON schedule_sessions (session_date);

CREATE TABLE IF NOT EXISTS attendance_records (
    id            TEXT PRIMARY KEY NOT NULL,
    member_handle TEXT NOT NULL,
    record_date   TEXT NOT NULL,
    status        TEXT NOT NULL CHECK (status IN ('present', 'excused', 'absent')),
    recorded_at   TEXT NOT NULL,
    reason        TEXT,
    photo         TEXT
);

-- at most one record per member per day
CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_member_date
    ON attendance_records (member_handle, record_date);

CREATE INDEX IF NOT EXISTS idx_attendance_date
    ON attendance_records (record_date);

CREATE TABLE IF NOT EXISTS push_subscriptions (
    endpoint      TEXT PRIMARY KEY NOT NULL,
    p256dh        TEXT NOT NULL,
    auth          TEXT NOT NULL,
    member_handle TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS login_sessions (
    token         TEXT PRIMARY KEY NOT NULL,
    member_handle TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    expires_at    TEXT NOT NULL
);
"#;

pub async fn migrate(pool: &SqlitePool) -> sqlx::Result<()> {
    let current: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    if current == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        sqlx::raw_sql(SCHEMA_V1).execute(pool).await?;
    }

    // PRAGMA does not accept bound parameters.
    sqlx::raw_sql(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;
    Ok(())
}
