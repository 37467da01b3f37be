use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::member_service::{self, MemberView};
use crate::services::presensi_service::{self, HistoryEntryView};
use crate::services::rekap_service::{self, RekapView};
use crate::state::AppState;
use crate::web::notice_message;

#[derive(Template)]
#[template(path = "rekap.html")]
pub struct RekapTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub rekap: RekapView,
    pub prev_link: String,
    pub next_link: String,
    pub export_link: String,
}

#[derive(Template)]
#[template(path = "rekap_member.html")]
pub struct RekapMemberTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub member: MemberView,
    pub month_label: String,
    pub entries: Vec<HistoryEntryView>,
    pub return_to: String,
    pub back_link: String,
    pub notice: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PeriodQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub notice: Option<String>,
}

impl PeriodQuery {
    fn resolve(&self, state: &AppState) -> (i32, u32) {
        let (year, month) = rekap_service::period_of(state.config.today());
        (self.year.unwrap_or(year), self.month.unwrap_or(month))
    }
}

fn period_link(base: &str, year: i32, month: u32) -> String {
    format!("{}?year={}&month={}", base, year, month)
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}

pub async fn rekap_page(
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let (year, month) = query.resolve(&state);
    let rekap = rekap_service::load_rekap(&state.pool, year, month).await?;

    let (py, pm) = shift_month(year, month, -1);
    let (ny, nm) = shift_month(year, month, 1);
    let template = RekapTemplate {
        logged_in: true,
        is_admin: true,
        prev_link: period_link("/admin/rekap", py, pm),
        next_link: period_link("/admin/rekap", ny, nm),
        export_link: period_link("/admin/rekap/export", year, month),
        rekap,
    };
    Ok(Html(template.render()?))
}

/// Rollup as JSON, for external report generators.
pub async fn rekap_export_handler(
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<RekapView>> {
    let (year, month) = query.resolve(&state);
    Ok(Json(rekap_service::load_rekap(&state.pool, year, month).await?))
}

pub async fn member_detail_page(
    Path(handle): Path<String>,
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let (year, month) = query.resolve(&state);
    let member = member_service::load_member_view(&state.pool, &handle).await?;
    let entries = presensi_service::load_member_month(&state.pool, &handle, year, month).await?;

    let template = RekapMemberTemplate {
        logged_in: true,
        is_admin: true,
        month_label: rekap_service::month_label(year, month),
        return_to: period_link(&format!("/admin/rekap/member/{}", member.handle), year, month),
        back_link: period_link("/admin/rekap", year, month),
        member,
        entries,
        notice: query
            .notice
            .as_deref()
            .and_then(notice_message)
            .unwrap_or_default()
            .to_string(),
    };
    Ok(Html(template.render()?))
}
