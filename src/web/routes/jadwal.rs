use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::services::member_service::{self, MemberView};
use crate::services::schedule_service::{self, ScheduleGroupView};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedMember;
use crate::web::{with_notice, NoticeQuery};

// How far back the schedule list reaches by default.
const DEFAULT_LIST_DAYS: i64 = 14;

#[derive(Template)]
#[template(path = "jadwal.html")]
pub struct JadwalTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub groups: Vec<ScheduleGroupView>,
    pub members: Vec<MemberView>,
    pub default_date: String,
    pub from: String,
    pub notice: String,
    pub error: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct JadwalQuery {
    pub from: Option<NaiveDate>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJadwalForm {
    pub date: NaiveDate,
    pub code: String,
    pub participants: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteGroupForm {
    pub code: String,
    pub date: NaiveDate,
}

async fn render_jadwal(
    state: &AppState,
    from: Option<NaiveDate>,
    notice: String,
    error: String,
) -> AppResult<String> {
    let today = state.config.today();
    let from = from.unwrap_or(today - Duration::days(DEFAULT_LIST_DAYS));
    let template = JadwalTemplate {
        logged_in: true,
        is_admin: true,
        groups: schedule_service::list_schedule(&state.pool, from).await?,
        members: member_service::list_member_views(&state.pool).await?,
        default_date: today.format("%Y-%m-%d").to_string(),
        from: from.format("%Y-%m-%d").to_string(),
        notice,
        error,
    };
    Ok(template.render()?)
}

pub async fn jadwal_page(
    Query(query): Query<JadwalQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let notice = NoticeQuery {
        notice: query.notice,
    }
    .message();
    Ok(Html(render_jadwal(&state, query.from, notice, String::new()).await?))
}

pub async fn create_jadwal_handler(
    Extension(admin): Extension<AuthenticatedMember>,
    State(state): State<AppState>,
    Form(form): Form<CreateJadwalForm>,
) -> AppResult<Response> {
    let participants = schedule_service::parse_participants(&form.participants);
    match schedule_service::create_schedule(&state.pool, form.date, &form.code, &participants).await
    {
        Ok(_) => Ok(Redirect::to(&with_notice("/admin/jadwal", "jadwal_ok")).into_response()),
        Err(e @ AppError::BadRequest(_)) => {
            warn!("jadwal by {} rejected: {}", admin.handle, e);
            let status = e.status();
            let body = render_jadwal(&state, None, String::new(), e.to_string()).await?;
            Ok((status, Html(body)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_jadwal_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Redirect> {
    schedule_service::delete_schedule_row(&state.pool, &id).await?;
    Ok(Redirect::to(&with_notice("/admin/jadwal", "jadwal_deleted")))
}

pub async fn delete_jadwal_group_handler(
    State(state): State<AppState>,
    Form(form): Form<DeleteGroupForm>,
) -> AppResult<Redirect> {
    schedule_service::delete_schedule_group(&state.pool, &form.code, form.date).await?;
    Ok(Redirect::to(&with_notice("/admin/jadwal", "jadwal_deleted")))
}
