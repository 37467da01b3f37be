#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request};
use chrono::{Duration, NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use presensi::config::Config;
use presensi::database::{attendance_repo, login_session_repo, member_repo, schedule_repo, schema};
use presensi::state::AppState;

pub const CRON_SECRET: &str = "cron-s3cret";

/// Single-connection in-memory database; the connection is never recycled.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("memory pool");
    schema::migrate(&pool).await.expect("schema");
    pool
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn seed_member(pool: &SqlitePool, handle: &str, display_name: &str, is_admin: bool) {
    member_repo::insert_member(
        pool,
        member_repo::NewMember {
            handle,
            display_name,
            origin: "Bandung",
            status_tag: "Santri",
            is_admin,
            password_hash: "not-a-real-hash",
            created_at: Utc::now(),
        },
    )
    .await
    .expect("seed member");
}

pub async fn seed_schedule(pool: &SqlitePool, on: NaiveDate, code: &str, participants: &[&str]) {
    for participant in participants {
        let id = Uuid::new_v4().to_string();
        schedule_repo::insert_schedule_session(
            pool,
            schedule_repo::NewScheduleSession {
                id: &id,
                session_date: on,
                participant,
                code,
                created_at: Utc::now(),
            },
        )
        .await
        .expect("seed schedule");
    }
}

pub async fn seed_record(pool: &SqlitePool, handle: &str, on: NaiveDate, status: &str) {
    let id = Uuid::new_v4().to_string();
    attendance_repo::insert_record(
        pool,
        attendance_repo::NewAttendanceRecord {
            id: &id,
            member_handle: handle,
            record_date: on,
            status,
            recorded_at: Utc::now(),
            reason: None,
            photo: None,
        },
    )
    .await
    .expect("seed record");
}

pub async fn records_on(pool: &SqlitePool, on: NaiveDate) -> Vec<presensi::models::AttendanceRecordRow> {
    attendance_repo::list_in_range(pool, on, on)
        .await
        .expect("list records")
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        cron_secret: Some(CRON_SECRET.to_string()),
        upload_dir: upload_dir.to_path_buf(),
        ..Config::default()
    }
}

pub fn test_state(pool: SqlitePool, upload_dir: &Path) -> AppState {
    AppState::new(pool, test_config(upload_dir))
}

/// Opens a session directly and returns the `Cookie` header value.
pub async fn session_cookie(pool: &SqlitePool, handle: &str) -> String {
    let token = format!("test-{}", Uuid::new_v4().simple());
    let now = Utc::now();
    login_session_repo::insert_session(pool, &token, handle, now, now + Duration::hours(1))
        .await
        .expect("insert session");
    format!("session_token={}", token)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
