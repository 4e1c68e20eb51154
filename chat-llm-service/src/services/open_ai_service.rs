//! OpenAI (ChatGPT) service for conversation-aware text generation.
//!
//! Minimal, non-streaming client around the OpenAI REST API:
//! - POST {endpoint}/v1/chat/completions — chat completion
//!
//! Unlike a bare prompt client, [`OpenAiService::generate`] forwards the
//! full ordered conversation followed by the new user turn, so the model
//! sees the same history the session owns.
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAi`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    chat_turn::{ChatRole, ChatTurn},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ChatLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Thin client for the OpenAI API (ChatGPT).
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// Validates the provider, API key, and endpoint scheme. Builds an HTTP
    /// client with default headers and a configurable timeout.
    ///
    /// # Errors
    /// - [`ChatLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - [`ChatLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`ChatLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`ChatLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, ChatLlmError> {
        if cfg.provider != LlmProvider::OpenAi {
            return Err(
                ProviderError::new(Provider::OpenAi, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAi, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAi,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAi,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **non-streaming** chat completion (`/v1/chat/completions`).
    ///
    /// The `messages` array is the ordered `history` followed by a new user
    /// message with `user_text`. Mapped options from config: `model`,
    /// `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`ChatLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`ChatLlmError::HttpTransport`] for client/network failures
    /// - [`ChatLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`ChatLlmError::Provider`] with `EmptyCandidates` if no choices carry content
    pub async fn generate(
        &self,
        history: &[ChatTurn],
        user_text: &str,
    ) -> Result<String, ChatLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, history, user_text);

        debug!(
            model = %self.cfg.model,
            endpoint = %self.cfg.endpoint,
            history_len = history.len(),
            user_len = user_text.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAi,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/chat/completions response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAi,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::new(Provider::OpenAi, ProviderErrorKind::EmptyCandidates)
            })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Builds a chat request from config, the ordered history, and the new
    /// user turn. History order is preserved exactly.
    fn from_cfg(cfg: &'a LlmModelConfig, history: &'a [ChatTurn], user_text: &'a str) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        for turn in history {
            messages.push(ChatMessage {
                role: turn.role.openai_str(),
                content: turn.content.as_str(),
            });
        }
        messages.push(ChatMessage {
            role: ChatRole::User.openai_str(),
            content: user_text,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Chat message for the OpenAI API.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// One of: "system" | "user" | "assistant".
    role: &'a str,
    content: &'a str,
}

/// Minimal response for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: Some("sk-test".into()),
            max_tokens: Some(512),
            temperature: Some(0.8),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn request_preserves_history_order_and_appends_user_turn() {
        let cfg = cfg();
        let history = vec![
            ChatTurn::new(ChatRole::System, "You are a campus assistant."),
            ChatTurn::new(ChatRole::User, "Hi"),
            ChatTurn::new(ChatRole::Assistant, "Hello!"),
        ];
        let req = ChatCompletionRequest::from_cfg(&cfg, &history, "What about tuition?");

        let roles: Vec<&str> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(req.messages.last().unwrap().content, "What about tuition?");
        assert_eq!(req.max_tokens, Some(512));
    }

    #[test]
    fn constructor_rejects_foreign_provider_and_missing_key() {
        let mut wrong = cfg();
        wrong.provider = LlmProvider::Gemini;
        assert!(OpenAiService::new(wrong).is_err());

        let mut keyless = cfg();
        keyless.api_key = None;
        assert!(OpenAiService::new(keyless).is_err());
    }
}
