use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Extension, Form,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::member_service::{self, MemberView};
use crate::services::presensi_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedMember;
use crate::web::{sanitize_return_to, with_notice, NoticeQuery};

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub current_handle: String,
    pub members: Vec<MemberView>,
    pub notice: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAdminForm {
    pub is_admin: String, // "1" | "0"
}

#[derive(Debug, Deserialize, Default)]
pub struct ReturnToForm {
    pub return_to: Option<String>,
}

pub async fn users_page(
    Extension(admin): Extension<AuthenticatedMember>,
    Query(query): Query<NoticeQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let template = UsersTemplate {
        logged_in: true,
        is_admin: true,
        current_handle: admin.handle,
        members: member_service::list_member_views(&state.pool).await?,
        notice: query.message(),
    };
    Ok(Html(template.render()?))
}

pub async fn set_admin_handler(
    Extension(admin): Extension<AuthenticatedMember>,
    Path(handle): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<SetAdminForm>,
) -> AppResult<Redirect> {
    let is_admin = form.is_admin.trim() == "1";
    member_service::set_admin(&state.pool, &admin.handle, &handle, is_admin).await?;
    Ok(Redirect::to(&with_notice("/admin/users", "user_updated")))
}

pub async fn delete_user_handler(
    Extension(admin): Extension<AuthenticatedMember>,
    Path(handle): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Redirect> {
    member_service::delete_member(&state.pool, &state.photos, &admin.handle, &handle).await?;
    Ok(Redirect::to(&with_notice("/admin/users", "user_deleted")))
}

pub async fn delete_attendance_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<ReturnToForm>,
) -> AppResult<Redirect> {
    presensi_service::delete_attendance(&state.pool, &state.photos, &id).await?;
    let target = form
        .return_to
        .as_deref()
        .and_then(sanitize_return_to)
        .unwrap_or("/admin/rekap");
    Ok(Redirect::to(&with_notice(target, "attendance_deleted")))
}
