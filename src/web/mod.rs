pub mod middleware;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use middleware::auth as auth_middleware;
use routes::{auth, cron, dashboard, jadwal, profile, push, rekap, users};

// Photos arrive as base64 data URLs inside forms.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// `?notice=` carried across post/redirect/get.
#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn message(&self) -> String {
        self.notice
            .as_deref()
            .and_then(notice_message)
            .unwrap_or_default()
            .to_string()
    }
}

pub fn notice_message(key: &str) -> Option<&'static str> {
    let message = match key {
        "registered" => "Akun dibuat, silakan login",
        "checkin_ok" => "Presensi berhasil dicatat",
        "izin_ok" => "Izin berhasil dikirim",
        "profile_ok" => "Profil diperbarui",
        "jadwal_ok" => "Jadwal disimpan",
        "jadwal_deleted" => "Jadwal dihapus",
        "user_updated" => "Pengguna diperbarui",
        "user_deleted" => "Pengguna dihapus",
        "attendance_deleted" => "Data presensi dihapus",
        _ => return None,
    };
    Some(message)
}

/// Only same-site relative paths are accepted as redirect targets.
pub fn sanitize_return_to(value: &str) -> Option<&str> {
    let v = value.trim();
    if !v.starts_with('/') {
        return None;
    }
    if v.starts_with("//") || v.contains("://") {
        return None;
    }
    Some(v)
}

pub fn with_notice(target: &str, notice: &str) -> String {
    let sep = if target.contains('?') { "&" } else { "?" };
    format!("{}{}notice={}", target, sep, notice)
}

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/admin/jadwal",
            get(jadwal::jadwal_page).post(jadwal::create_jadwal_handler),
        )
        .route("/admin/jadwal/:id/delete", post(jadwal::delete_jadwal_handler))
        .route(
            "/admin/jadwal/delete-group",
            post(jadwal::delete_jadwal_group_handler),
        )
        .route("/admin/users", get(users::users_page))
        .route("/admin/users/:handle/admin", post(users::set_admin_handler))
        .route("/admin/users/:handle/delete", post(users::delete_user_handler))
        .route(
            "/admin/attendance/:id/delete",
            post(users::delete_attendance_handler),
        )
        .route("/admin/rekap", get(rekap::rekap_page))
        .route("/admin/rekap/export", get(rekap::rekap_export_handler))
        .route("/admin/rekap/member/:handle", get(rekap::member_detail_page))
        .route("/api/push/broadcast", post(push::broadcast_handler))
        .route_layer(axum_middleware::from_fn(auth_middleware::require_admin));

    let protected_routes = Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/presensi/check-in", post(dashboard::check_in_handler))
        .route("/presensi/izin", post(dashboard::izin_handler))
        .route(
            "/profile",
            get(profile::profile_page).post(profile::update_profile_handler),
        )
        .route("/logout", post(auth::logout_handler))
        .route("/api/push/subscribe", post(push::subscribe_handler))
        .route("/api/push/unsubscribe", post(push::unsubscribe_handler))
        .nest_service("/uploads", ServeDir::new(state.photos.root().to_path_buf()))
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        // Public routes
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_handler),
        )
        .route(
            "/api/cron/reconcile",
            get(cron::reconcile_handler).post(cron::reconcile_handler),
        )
        // Protected routes
        .merge(protected_routes)
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
