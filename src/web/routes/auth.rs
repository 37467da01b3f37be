use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::services::{auth_service, member_service};
use crate::state::AppState;
use crate::web::middleware::auth::{AuthenticatedMember, SESSION_COOKIE};
use crate::web::NoticeQuery;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub handle: String,
    pub notice: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub handle: String,
    pub display_name: String,
    pub origin: String,
    pub status_tag: String,
    pub error: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    handle: String,
    password: String,
}

fn session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.cookie_secure);
    cookie.set_max_age(cookie::time::Duration::seconds(
        state.config.session_ttl.num_seconds(),
    ));
    cookie
}

fn with_cookie(mut response: Response, cookie: Cookie<'_>) -> AppResult<Response> {
    let value = cookie
        .to_string()
        .parse()
        .map_err(|_| AppError::bad_request("invalid cookie"))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

pub async fn login_page(Query(query): Query<NoticeQuery>) -> AppResult<Html<String>> {
    let template = LoginTemplate {
        logged_in: false,
        is_admin: false,
        handle: String::new(),
        notice: query.message(),
        error: String::new(),
    };
    Ok(Html(template.render()?))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let ttl = state.config.session_ttl;
    match auth_service::login(&state.pool, &form.handle, &form.password, ttl).await {
        Ok(token) => with_cookie(
            Redirect::to("/").into_response(),
            session_cookie(token, &state),
        ),
        Err(AppError::Unauthorized) => {
            let template = LoginTemplate {
                logged_in: false,
                is_admin: false,
                handle: form.handle,
                notice: String::new(),
                error: "Username atau password salah".to_string(),
            };
            Ok((StatusCode::UNAUTHORIZED, Html(template.render()?)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn register_page() -> AppResult<Html<String>> {
    let template = RegisterTemplate {
        logged_in: false,
        is_admin: false,
        handle: String::new(),
        display_name: String::new(),
        origin: String::new(),
        status_tag: String::new(),
        error: String::new(),
    };
    Ok(Html(template.render()?))
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<member_service::RegisterForm>,
) -> AppResult<Response> {
    match member_service::register(&state.pool, &form).await {
        Ok(_) => Ok(Redirect::to("/login?notice=registered").into_response()),
        Err(e @ (AppError::BadRequest(_) | AppError::Conflict(_))) => {
            let status = e.status();
            let template = RegisterTemplate {
                logged_in: false,
                is_admin: false,
                error: e.to_string(),
                handle: form.handle,
                display_name: form.display_name,
                origin: form.origin,
                status_tag: form.status_tag,
            };
            Ok((status, Html(template.render()?)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(member): Extension<AuthenticatedMember>,
) -> AppResult<Response> {
    if let Err(e) = auth_service::logout(&state.pool, &member.session_token).await {
        warn!("logout for {} failed: {}", member.handle, e);
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    with_cookie(Redirect::to("/login").into_response(), removal)
}
