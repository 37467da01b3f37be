use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{ApiError, AppError};
use crate::services::reconciliation_service;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ReconcileQuery {
    /// Reconcile a single past date instead of the whole lookback window.
    pub date: Option<NaiveDate>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_bearer(value)
}

/// The auth scheme is case-insensitive and may be followed by any run of whitespace.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn secret_matches(token: &str, secret: &str) -> bool {
    bool::from(token.as_bytes().ct_eq(secret.as_bytes()))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(secret) = state.config.cron_secret.as_deref() else {
        warn!("cron call refused: CRON_SECRET is not configured");
        return Err(AppError::Unauthorized);
    };
    match bearer_token(headers) {
        Some(token) if secret_matches(token, secret) => Ok(()),
        _ => {
            warn!("cron call refused: bad bearer token");
            Err(AppError::Unauthorized)
        }
    }
}

pub async fn reconcile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReconcileQuery>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let today = state.config.today();

    if let Some(date) = query.date {
        let outcome = reconciliation_service::reconcile_date(&state.pool, date, today).await?;
        info!(
            "cron reconcile {}: inserted={}, failed={}",
            date, outcome.inserted, outcome.failed
        );
        return Ok(Json(serde_json::json!({
            "success": true,
            "outcome": outcome,
        })));
    }

    let report = reconciliation_service::reconcile_past_dates(
        &state.pool,
        today,
        state.config.reconcile_lookback_days,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "report": report,
    })))
}
