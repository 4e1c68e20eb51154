//! Unified error handling for `chat-llm-service`.
//!
//! This module exposes a single top-level error type [`ChatLlmError`] for the
//! whole library, and groups domain-specific errors in nested enums
//! ([`ConfigError`], [`ProviderError`], [`HealthError`]). Small helpers for
//! reading/validating environment variables are provided and return the
//! unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[Chat LLM Service]` to simplify
//! attribution in logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, ChatLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `chat-llm-service` crate.
///
/// Variants wrap domain-specific enums (config/provider/health) and a few
/// common cases (HTTP transport, timeouts). Prefer adding new sub-enums for
/// distinct domains instead of growing this type indefinitely.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChatLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider call errors (invalid client setup, bad status, bad payload).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[Chat LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[Chat LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ChatLlmError {
    /// Whether the remote call reached the provider but produced an
    /// unusable payload (decode failure or missing candidate content).
    ///
    /// Callers use this to separate "retryable transport trouble" from
    /// "retrying the identical call will not help".
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            ChatLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::Decode(_) | ProviderErrorKind::EmptyCandidates,
                ..
            })
        )
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[Chat LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like limits or timeouts).
    #[error("[Chat LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `CHAT_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `CHAT_LLM_PROVIDER`.
    #[error("[Chat LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Chat LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `GEMINI_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[Chat LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range (e.g., `expected 0.0..=2.0`).
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[Chat LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Provider identity attached to provider-call errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

/// A provider-call error with its origin attached.
#[derive(Debug, Error)]
#[error("[Chat LLM Service] {provider:?}: {kind}")]
pub struct ProviderError {
    /// Which provider produced the error.
    pub provider: Provider,
    /// What went wrong.
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// The ways a provider call can fail after the client was handed a config.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// The config has an unexpected provider for this client.
    #[error("config does not match this client's provider")]
    InvalidProvider,

    /// The provider requires an API key and none was configured.
    #[error("missing API key")]
    MissingApiKey,

    /// The endpoint is empty or does not start with http/https.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("HTTP {status} from {url}: {snippet}", status = .0.status, url = .0.url, snippet = .0.snippet)]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The response decoded fine but carried no candidate text.
    #[error("response contained no candidate content")]
    EmptyCandidates,
}

/// Status/URL/body-snippet triple for non-2xx upstream responses.
#[derive(Debug)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
///
/// Used by the health service to represent connectivity, protocol, and
/// decoding problems in a provider-agnostic way.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[Chat LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[Chat LLM Service] HTTP {status} from {url}: {snippet}", status = .0.status, url = .0.url, snippet = .0.snippet)]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("[Chat LLM Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::InvalidNumber`] if
/// the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u32>().map(Some).map_err(|_| {
            ChatLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::InvalidNumber`] if
/// the variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u64>().map(Some).map_err(|_| {
            ChatLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::InvalidNumber`] if
/// the variable is set but not a valid `f32`.
pub fn env_opt_f32(name: &'static str) -> Result<Option<f32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<f32>().map(Some).map_err(|_| {
            ChatLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected f32",
            })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// Useful for parameters like `temperature` (e.g., `0.0..=2.0`) or `top_p`
/// (`0.0..=1.0`).
///
/// # Errors
/// Returns [`ChatLlmError::Config`] with [`ConfigError::OutOfRange`] if
/// `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

/// Produces a short, single-line snippet of an upstream response body for
/// error messages and logs.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let compact: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.len() <= MAX {
        compact
    } else {
        let mut cut = MAX;
        while !compact.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &compact[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = "line one\n  line   two\nline three";
        assert_eq!(make_snippet(body), "line one line two line three");

        let long = "x".repeat(1000);
        assert!(make_snippet(&long).len() <= 244);
    }

    #[test]
    fn malformed_detection_covers_decode_and_empty() {
        let decode: ChatLlmError =
            ProviderError::new(Provider::Gemini, ProviderErrorKind::Decode("bad json".into()))
                .into();
        assert!(decode.is_malformed_response());

        let empty: ChatLlmError =
            ProviderError::new(Provider::OpenAi, ProviderErrorKind::EmptyCandidates).into();
        assert!(empty.is_malformed_response());

        let status: ChatLlmError = ProviderError::new(
            Provider::OpenAi,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::BAD_GATEWAY,
                url: "https://api.openai.com/v1/chat/completions".into(),
                snippet: String::new(),
            }),
        )
        .into();
        assert!(!status.is_malformed_response());
    }
}
