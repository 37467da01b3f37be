use std::{env, fmt::Display, ops::RangeInclusive, path::PathBuf, str::FromStr};

use chrono::{Duration, FixedOffset, NaiveDate, Offset, Utc};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub const SESSION_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 366;
pub const RECONCILE_LOOKBACK_DAYS_RANGE: RangeInclusive<i64> = 0..=3660;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Bearer secret for `/api/cron/reconcile`. The endpoint refuses every call when unset.
    pub cron_secret: Option<String>,
    pub upload_dir: PathBuf,
    /// Offset used to decide what "today" is.
    pub tz_offset: FixedOffset,
    pub session_ttl: Duration,
    /// How far back the batch reconciliation looks, in days.
    pub reconcile_lookback_days: i64,
    pub push_relay_url: Option<String>,
    pub push_relay_key: Option<String>,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let tz_hours: i32 = try_load("TZ_OFFSET_HOURS", "7")?;
        let tz_offset = tz_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| AppError::Config(format!("TZ_OFFSET_HOURS out of range: {}", tz_hours)))?;

        let session_ttl_hours = in_range(
            "SESSION_TTL_HOURS",
            try_load("SESSION_TTL_HOURS", "168")?,
            SESSION_TTL_HOURS_RANGE,
        )?;
        let reconcile_lookback_days = in_range(
            "RECONCILE_LOOKBACK_DAYS",
            try_load("RECONCILE_LOOKBACK_DAYS", "62")?,
            RECONCILE_LOOKBACK_DAYS_RANGE,
        )?;

        Ok(Self {
            database_url,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3000")?,
            cron_secret: optional("CRON_SECRET"),
            upload_dir: PathBuf::from(try_load::<String>("UPLOAD_DIR", "uploads")?),
            tz_offset,
            session_ttl: Duration::hours(session_ttl_hours),
            reconcile_lookback_days,
            push_relay_url: optional("PUSH_RELAY_URL"),
            push_relay_key: optional("PUSH_RELAY_KEY"),
            cookie_secure: try_load("COOKIE_SECURE", "false")?,
        })
    }

    /// Calendar date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz_offset).date_naive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            cron_secret: None,
            upload_dir: PathBuf::from("uploads"),
            tz_offset: FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix()),
            session_ttl: Duration::hours(168),
            reconcile_lookback_days: 62,
            push_relay_url: None,
            push_relay_key: None,
            cookie_secure: false,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> AppResult<T>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("invalid {key}: {e}"))
    })
}

fn in_range<T>(key: &str, value: T, range: RangeInclusive<T>) -> AppResult<T>
where
    T: PartialOrd + Display,
{
    if !range.contains(&value) {
        warn!("{key} out of range: {value}");
        return Err(AppError::Config(format!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}
