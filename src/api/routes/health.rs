use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::domain::IndexStats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub index: IndexStats,
    pub sessions: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready once the index has been built; loading happens on the first page view.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let index = state
        .chat
        .loader()
        .get()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(ReadinessResponse {
        status: "ready".into(),
        index: index.stats(),
        sessions: state.sessions.len().await,
    }))
}
