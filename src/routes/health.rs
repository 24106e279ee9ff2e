// src/routes/health.rs

use axum::{extract::State, Json};
use serde::Serialize;

use crate::refresh::Phase;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResp {
    pub status: &'static str,
    pub version: &'static str,
    pub cycle: u64,
    pub phase: Phase,
    pub last_error: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    let refresh = state.refresh.borrow();
    Json(HealthResp {
        status: if refresh.last_error.is_some() { "degraded" } else { "ok" },
        version: "v1",
        cycle: refresh.cycle,
        phase: refresh.phase,
        last_error: refresh.last_error.clone(),
    })
}
