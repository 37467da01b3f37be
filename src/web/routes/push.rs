use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::push_service::{self, BroadcastMessage, BroadcastReport, SubscriptionPayload};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedMember;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeBody {
    pub endpoint: String,
}

pub async fn subscribe_handler(
    Extension(member): Extension<AuthenticatedMember>,
    State(state): State<AppState>,
    Json(body): Json<SubscriptionPayload>,
) -> Result<Json<Value>, ApiError> {
    push_service::subscribe(&state.pool, &member.handle, &body).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    Json(body): Json<UnsubscribeBody>,
) -> Result<Json<Value>, ApiError> {
    push_service::unsubscribe(&state.pool, &body.endpoint).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn broadcast_handler(
    State(state): State<AppState>,
    Json(message): Json<BroadcastMessage>,
) -> Result<Json<BroadcastReport>, ApiError> {
    let report = push_service::broadcast(&state.pool, &state.push_relay, &message).await?;
    Ok(Json(report))
}
