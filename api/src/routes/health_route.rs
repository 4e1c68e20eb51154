//! GET /health — provider readiness snapshots.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::instrument;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /health
///
/// Probes each distinct LLM profile and returns the snapshots. The endpoint
/// itself never fails; unreachable providers show up as `ok: false`.
#[instrument(name = "health_route", skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let statuses = state.llm.health_all().await;
    ApiResponse::success(statuses).into_response_with_status(StatusCode::OK)
}
