use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use chat_pipeline::{PipelineError, RemoteError};

use crate::core::app_state::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Convert `PipelineError` to `AppError::Http` with precise HTTP status &
/// code, per the contract the HTTP layer exposes: 400 for missing input,
/// 502 for remote trouble, 500 for configuration problems.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "EMPTY_MESSAGE",
                message: "No message received.".into(),
            },
            PipelineError::Remote(RemoteError::Unavailable(source)) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "REMOTE_UNAVAILABLE",
                message: format!("The language model endpoint could not be reached: {source}"),
            },
            PipelineError::Remote(RemoteError::MalformedResponse(detail)) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "MALFORMED_REMOTE_RESPONSE",
                message: format!("The language model returned an unusable response: {detail}"),
            },
            PipelineError::Config(e) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "CONFIG_ERROR",
                message: e.to_string(),
            },
            other => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "PIPELINE_ERROR",
                message: other.to_string(),
            },
        }
    }
}
