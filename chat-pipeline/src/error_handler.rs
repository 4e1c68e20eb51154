//! Unified error handling for `chat-pipeline`.
//!
//! [`PipelineError`] is the single error type a pipeline run can surface.
//! Out-of-scope rejection is deliberately NOT an error: it is a normal
//! terminal outcome and comes back as a [`crate::pipeline::ChatReply`].
//!
//! [`ConfigError`] groups everything that can go wrong while loading the
//! read-only serving artifacts (intent model, response table, scope rules).
//! These are startup-time failures; at request time a configuration gap
//! degrades to "defer to remote generation" instead of failing the run.

use thiserror::Error;

use crate::remote::RemoteError;

/// Unified result alias for the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Top-level error for one pipeline run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The user message was empty or whitespace-only. Surfaced before any
    /// pipeline stage executes.
    #[error("[Chat Pipeline] empty user message")]
    InvalidInput,

    /// Serving artifacts could not be loaded or were internally inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The remote generation call failed; the conversation was not mutated,
    /// so the caller may retry.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Error enum for loading the read-only serving artifacts.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An artifact file could not be read.
    #[error("[Chat Pipeline] failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An artifact file was not valid JSON of the expected shape.
    #[error("[Chat Pipeline] failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The intent model's vocabulary, labels, weights, and bias disagree on
    /// dimensions. Fatal: a mismatched model cannot score anything.
    #[error("[Chat Pipeline] intent model shape mismatch: {0}")]
    ModelShape(String),

    /// An intent in the response table has an empty candidate list.
    #[error("[Chat Pipeline] intent {label:?} has no responses")]
    EmptyResponses { label: String },

    /// The response table defines no intents at all.
    #[error("[Chat Pipeline] response table defines no intents")]
    EmptyTable,

    /// A scope rule did not compile as a regular expression.
    #[error("[Chat Pipeline] invalid scope pattern set")]
    BadPattern(#[source] regex::Error),
}
