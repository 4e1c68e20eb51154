//! Default LLM configs loaded strictly from environment variables.
//!
//! This module provides convenience constructors for [`LlmModelConfig`],
//! grouped by provider and role:
//!
//! - **Chat**  → the primary conversational model
//! - **Tuned** → an optional fine-tuned model id layered on the chat config
//!
//! The tuned model replaces the old process-global model-manager: it is an
//! explicit config value built here once and passed by reference from then on.
//!
//! # Environment variables
//!
//! Common:
//! - `CHAT_LLM_PROVIDER` = provider kind (`openai`, `gemini`; default `openai`)
//! - `CHAT_MAX_TOKENS`   = optional output bound (u32; provider default if unset)
//! - `CHAT_TEMPERATURE`  = optional sampling temperature override (f32, 0.0..=2.0)
//! - `CHAT_TIMEOUT_SECS` = optional request timeout (u64)
//! - `CHAT_TUNED_MODEL`  = optional fine-tuned model identifier
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` (mandatory)
//! - `OPENAI_MODEL`   (default `gpt-4o-mini`)
//! - `OPENAI_URL`     (default `https://api.openai.com`)
//!
//! Gemini-specific:
//! - `GEMINI_API_KEY` (mandatory)
//! - `GEMINI_MODEL`   (default `gemini-2.0-flash`)
//! - `GEMINI_URL`     (default `https://generativelanguage.googleapis.com`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ChatLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Optional `CHAT_TEMPERATURE` override, validated against the range both
/// providers accept.
fn env_temperature(default: f32) -> Result<f32, ChatLlmError> {
    let value = env_opt_f32("CHAT_TEMPERATURE")?.unwrap_or(default);
    validate_range_f32("temperature", value, 0.0, 2.0)?;
    Ok(value)
}

/// Constructs the **OpenAI chat** config.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_MODEL`, `OPENAI_URL`, `CHAT_MAX_TOKENS`, `CHAT_TIMEOUT_SECS` (optional)
///
/// # Defaults
/// - `max_tokens = Some(512)`
/// - `temperature = Some(0.8)`
/// - `timeout_secs = Some(60)`
pub fn config_openai_chat() -> Result<LlmModelConfig, ChatLlmError> {
    let endpoint = env_or("OPENAI_URL", "https://api.openai.com");
    validate_http_endpoint("OPENAI_URL", &endpoint)?;
    let api_key = must_env("OPENAI_API_KEY")?;
    let max_tokens = env_opt_u32("CHAT_MAX_TOKENS")?.or(Some(512));
    let timeout_secs = env_opt_u64("CHAT_TIMEOUT_SECS")?.or(Some(60));
    let temperature = env_temperature(0.8)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAi,
        model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs,
    })
}

/// Constructs the **Gemini chat** config.
///
/// # Env
/// - `GEMINI_API_KEY` (required)
/// - `GEMINI_MODEL`, `GEMINI_URL`, `CHAT_MAX_TOKENS`, `CHAT_TIMEOUT_SECS` (optional)
///
/// # Defaults
/// - `max_tokens = Some(500)`
/// - `temperature = Some(0.5)`
/// - `top_p = Some(0.95)`
/// - `timeout_secs = Some(60)`
pub fn config_gemini_chat() -> Result<LlmModelConfig, ChatLlmError> {
    let endpoint = env_or("GEMINI_URL", "https://generativelanguage.googleapis.com");
    validate_http_endpoint("GEMINI_URL", &endpoint)?;
    let api_key = must_env("GEMINI_API_KEY")?;
    let max_tokens = env_opt_u32("CHAT_MAX_TOKENS")?.or(Some(500));
    let timeout_secs = env_opt_u64("CHAT_TIMEOUT_SECS")?.or(Some(60));
    let temperature = env_temperature(0.5)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(temperature),
        top_p: Some(0.95),
        timeout_secs,
    })
}

/// Constructs the primary chat config for the provider selected by
/// `CHAT_LLM_PROVIDER` (default: OpenAI).
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for unknown provider names, plus
/// whatever the provider-specific constructor reports.
pub fn config_chat_from_env() -> Result<LlmModelConfig, ChatLlmError> {
    let kind = env_or("CHAT_LLM_PROVIDER", "openai");
    match LlmProvider::parse(&kind) {
        Some(LlmProvider::OpenAi) => config_openai_chat(),
        Some(LlmProvider::Gemini) => config_gemini_chat(),
        None => Err(ConfigError::UnsupportedProvider(kind).into()),
    }
}

/// Constructs the optional **tuned** config: the primary chat config with
/// the model replaced by `CHAT_TUNED_MODEL`.
///
/// Returns `Ok(None)` when no tuned model is configured.
pub fn config_tuned_from_env(chat: &LlmModelConfig) -> Result<Option<LlmModelConfig>, ChatLlmError> {
    match std::env::var("CHAT_TUNED_MODEL") {
        Ok(model) if !model.trim().is_empty() => Ok(Some(LlmModelConfig {
            model: model.trim().to_string(),
            ..chat.clone()
        })),
        _ => Ok(None),
    }
}
