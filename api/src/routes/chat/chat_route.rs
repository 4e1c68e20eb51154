//! POST /chat — one conversational exchange.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::{ApiErrorDetail, ApiResponse},
    },
    error_handler::AppError,
    routes::chat::{chat_request::ChatRequest, chat_response::ChatResponse},
};

/// Handler: POST /chat
///
/// Resolves the session, runs the response pipeline once under the
/// session's lock, and maps the outcome onto the envelope. Out-of-scope
/// refusals are a 200 with `source = "refusal"`; remote failures become a
/// 502 without touching the session history.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"What is the tuition at LIU?"}'
/// ```
#[instrument(name = "chat_route", skip(state, body))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Response {
    // Validate before any pipeline work.
    if body.message.trim().is_empty() {
        let details = vec![ApiErrorDetail {
            path: Some("message".into()),
            hint: Some("Provide a non-empty message string.".into()),
        }];
        return ApiResponse::<()>::error("EMPTY_MESSAGE", "No message received.", details)
            .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    let (session_id, conversation) = state.sessions.open(body.session_id).await;
    debug!(%session_id, "session resolved");

    // The per-session lock serializes concurrent turns on one conversation.
    let mut conversation = conversation.lock().await;

    match state.pipeline.run(&mut conversation, &body.message).await {
        Ok(reply) => {
            info!(
                %session_id,
                source = reply.source.as_str(),
                history_len = conversation.len(),
                "chat exchange completed"
            );
            ApiResponse::success(ChatResponse {
                session_id,
                reply: reply.text,
                source: reply.source.as_str(),
            })
            .into_response_with_status(StatusCode::OK)
        }
        Err(err) => AppError::from(err).into_response(),
    }
}
