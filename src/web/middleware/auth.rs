use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::warn;

use crate::error::{ApiError, AppError};
use crate::services::auth_service;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Clone, Debug)]
pub struct AuthenticatedMember {
    pub handle: String,
    pub display_name: String,
    pub is_admin: bool,
    pub session_token: String,
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix(SESSION_COOKIE).and_then(|r| r.strip_prefix('=')))
                .map(|t| t.to_string())
        })
        .filter(|t| !t.is_empty())
}

fn is_api(request: &Request) -> bool {
    request.uri().path().starts_with("/api/")
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers()) {
        match auth_service::resolve_session(&state.pool, &token, Utc::now()).await {
            Ok(Some(member)) => {
                request.extensions_mut().insert(AuthenticatedMember {
                    handle: member.handle,
                    display_name: member.display_name,
                    is_admin: member.is_admin,
                    session_token: token,
                });
                return next.run(request).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("session lookup failed: {}", e);
                return e.into_response();
            }
        }
    }

    if is_api(&request) {
        return ApiError(AppError::Unauthorized).into_response();
    }
    Redirect::to("/login").into_response()
}

/// Must run inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedMember>()
        .is_some_and(|m| m.is_admin);

    if !is_admin {
        if is_api(&request) {
            return ApiError(AppError::Forbidden).into_response();
        }
        return AppError::Forbidden.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark;session_token=abc123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
