use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::error::{AppError, AppResult};
use crate::services::member_service::{self, MemberView, ProfileForm};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedMember;
use crate::web::{with_notice, NoticeQuery};

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub member: MemberView,
    pub notice: String,
    pub error: String,
}

pub async fn profile_page(
    Extension(auth_member): Extension<AuthenticatedMember>,
    Query(query): Query<NoticeQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let member = member_service::load_member_view(&state.pool, &auth_member.handle).await?;
    let template = ProfileTemplate {
        logged_in: true,
        is_admin: auth_member.is_admin,
        member,
        notice: query.message(),
        error: String::new(),
    };
    Ok(Html(template.render()?))
}

pub async fn update_profile_handler(
    Extension(auth_member): Extension<AuthenticatedMember>,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let res =
        member_service::update_profile(&state.pool, &state.photos, &auth_member.handle, &form)
            .await;
    match res {
        Ok(_) => Ok(Redirect::to(&with_notice("/profile", "profile_ok")).into_response()),
        Err(e @ AppError::BadRequest(_)) => {
            let status = e.status();
            let member =
                member_service::load_member_view(&state.pool, &auth_member.handle).await?;
            let template = ProfileTemplate {
                logged_in: true,
                is_admin: auth_member.is_admin,
                member,
                notice: String::new(),
                error: e.to_string(),
            };
            Ok((status, Html(template.render()?)).into_response())
        }
        Err(e) => Err(e),
    }
}
