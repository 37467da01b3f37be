use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::presensi_service::{self, HistoryEntryView, TodayView};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedMember;
use crate::web::{with_notice, NoticeQuery};

const HISTORY_DAYS: i64 = 31;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub display_name: String,
    pub today: TodayView,
    pub history: Vec<HistoryEntryView>,
    pub notice: String,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckInForm {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct IzinForm {
    pub reason: String,
    #[serde(default)]
    pub photo: String,
}

async fn render_dashboard(
    state: &AppState,
    member: &AuthenticatedMember,
    notice: String,
    error: String,
) -> AppResult<String> {
    let today = state.config.today();
    let today_view = presensi_service::load_today_view(&state.pool, &member.handle, today).await?;
    let history =
        presensi_service::load_history(&state.pool, &member.handle, today, HISTORY_DAYS).await?;

    let template = DashboardTemplate {
        logged_in: true,
        is_admin: member.is_admin,
        display_name: member.display_name.clone(),
        today: today_view,
        history,
        notice,
        error,
    };
    Ok(template.render()?)
}

/// Client errors are shown on the dashboard itself; everything else propagates.
async fn render_failure(
    state: &AppState,
    member: &AuthenticatedMember,
    err: AppError,
) -> AppResult<Response> {
    match err {
        AppError::BadRequest(_) | AppError::Conflict(_) => {
            let status = err.status();
            let body = render_dashboard(state, member, String::new(), err.to_string()).await?;
            Ok((status, Html(body)).into_response())
        }
        other => Err(other),
    }
}

pub async fn dashboard_handler(
    Extension(member): Extension<AuthenticatedMember>,
    Query(query): Query<NoticeQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let body = render_dashboard(&state, &member, query.message(), String::new()).await?;
    Ok(Html(body))
}

pub async fn check_in_handler(
    Extension(member): Extension<AuthenticatedMember>,
    State(state): State<AppState>,
    Form(form): Form<CheckInForm>,
) -> AppResult<Response> {
    let today = state.config.today();
    match presensi_service::check_in(&state.pool, &member.handle, &form.code, today).await {
        Ok(_) => Ok(Redirect::to(&with_notice("/", "checkin_ok")).into_response()),
        Err(e) => render_failure(&state, &member, e).await,
    }
}

pub async fn izin_handler(
    Extension(member): Extension<AuthenticatedMember>,
    State(state): State<AppState>,
    Form(form): Form<IzinForm>,
) -> AppResult<Response> {
    let today = state.config.today();
    let res = presensi_service::submit_izin(
        &state.pool,
        &state.photos,
        &member.handle,
        &form.reason,
        &form.photo,
        today,
    )
    .await;
    match res {
        Ok(_) => Ok(Redirect::to(&with_notice("/", "izin_ok")).into_response()),
        Err(e) => render_failure(&state, &member, e).await,
    }
}
