use std::{env, sync::Arc};

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;

pub use crate::error_handler::{AppError, AppResult};

use crate::{
    core::app_state::AppState,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{chat::chat_route::chat, health_route::health},
};

/// Builds the application state from the environment and serves the chat
/// API until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;

    let state = Arc::new(AppState::from_env()?);

    let app = Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;

    tracing::info!(%host_url, "chat API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    // Wait for the Ctrl+C signal
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
