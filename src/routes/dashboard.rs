// src/routes/dashboard.rs

use askama::Template;
use axum::http::StatusCode;
use axum::response::Html;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{internal_error, not_ready};
use crate::models::Snapshot;
use crate::refresh::Phase;
use crate::render::{DashboardView, PAGE_TITLE};
use crate::AppState;

/// Renders `templates/dashboard.html`; data arrives via `/api/v1/dashboard`.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: &'static str,
    pub refresh_ms: u64,
}

#[derive(Serialize)]
pub struct DashboardResp {
    pub cycle: u64,
    pub phase: Phase,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refresh_interval_ms: u64,
    pub view: DashboardView,
}

/// GET /
pub async fn page(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let template = DashboardTemplate {
        title: PAGE_TITLE,
        refresh_ms: state.refresh_interval.as_millis() as u64,
    };
    Ok(Html(template.render().map_err(internal_error)?))
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResp>, (StatusCode, String)> {
    let refresh = state.refresh.borrow();
    let view = refresh
        .view
        .as_ref()
        .ok_or_else(|| not_ready(refresh.last_error.as_deref()))?;

    Ok(Json(DashboardResp {
        cycle: refresh.cycle,
        phase: refresh.phase,
        updated_at: refresh.updated_at,
        last_error: refresh.last_error.clone(),
        refresh_interval_ms: state.refresh_interval.as_millis() as u64,
        view: (**view).clone(),
    }))
}

/// GET /api/v1/aggregates
pub async fn get_aggregates(
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    let refresh = state.refresh.borrow();
    refresh
        .snapshot
        .as_ref()
        .map(|s| Json((**s).clone()))
        .ok_or_else(|| not_ready(refresh.last_error.as_deref()))
}
