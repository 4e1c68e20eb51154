//! Gemini service for conversation-aware text generation.
//!
//! Minimal, non-streaming client around the Generative Language REST API:
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//!
//! Gemini's wire format differs from the conversation model in two ways the
//! client has to bridge:
//! - the model side of the dialogue is role `model`, not `assistant`
//! - system turns are not allowed inside `contents`; they are lifted into
//!   the request-level `systemInstruction`
//!
//! Constructor validation mirrors [`super::open_ai_service::OpenAiService`]:
//! provider, API key, endpoint scheme.

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

/// Thin client for the Gemini API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and the `x-goog-api-key`
/// default header).
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`ChatLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not Gemini
    /// - [`ChatLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`ChatLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`ChatLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, ChatLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Gemini,
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
            "x-goog-api-key",
            header::HeaderValue::from_str(&api_key).map_err(|e| {
                ProviderError::new(
                    Provider::Gemini,
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
        let url_generate = format!("{}/v1beta/models/{}:generateContent", base, cfg.model);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Performs a **non-streaming** `generateContent` request.
    ///
    /// `contents` is the ordered `history` (assistant turns renamed to
    /// `model`, system turns lifted into `systemInstruction`) followed by a
    /// new user turn with `user_text`. Mapped options from config:
    /// `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`ChatLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`ChatLlmError::HttpTransport`] for client/network failures
    /// - [`ChatLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`ChatLlmError::Provider`] with `EmptyCandidates` if no candidate carries text
    pub async fn generate(
        &self,
        history: &[ChatTurn],
        user_text: &str,
    ) -> Result<String, ChatLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, history, user_text);

        debug!(
            model = %self.cfg.model,
            endpoint = %self.cfg.endpoint,
            history_len = history.len(),
            user_len = user_text.len(),
            "POST {}", self.url_generate
        );

        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Gemini generateContent returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: GenerateContentResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode generateContent response"
                );
                return Err(ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `candidates[0].content.parts[].text`"
                    )),
                )
                .into());
            }
        };

        let text = out.first_candidate_text().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyCandidates)
        })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "generateContent completed"
        );

        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    /// Builds a request from config, the ordered history, and the new user
    /// turn. Dialogue order is preserved exactly; system turns (in practice
    /// zero or one, at the head of the history) become `systemInstruction`.
    fn from_cfg(cfg: &'a LlmModelConfig, history: &'a [ChatTurn], user_text: &'a str) -> Self {
        let mut contents = Vec::with_capacity(history.len() + 1);
        let mut system_parts = Vec::new();

        for turn in history {
            match turn.role {
                ChatRole::System => system_parts.push(Part {
                    text: turn.content.as_str(),
                }),
                role => contents.push(Content {
                    role: Some(role.gemini_str()),
                    parts: vec![Part {
                        text: turn.content.as_str(),
                    }],
                }),
            }
        }
        contents.push(Content {
            role: Some(ChatRole::User.gemini_str()),
            parts: vec![Part { text: user_text }],
        });

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: system_parts,
            })
        };

        let generation_config = Some(GenerationConfig {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_tokens,
        });

        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Minimal response for `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated part texts of the first candidate, or `None` when the
    /// candidate list, its parts, or the joined text are empty.
    fn first_candidate_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let parts = candidate.content?.parts;
        let joined = parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: Some("test-key".into()),
            max_tokens: Some(500),
            temperature: Some(0.5),
            top_p: Some(0.95),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn assistant_turns_become_model_and_system_is_lifted() {
        let cfg = cfg();
        let history = vec![
            ChatTurn::new(ChatRole::System, "Answer campus questions only."),
            ChatTurn::new(ChatRole::User, "Hello"),
            ChatTurn::new(ChatRole::Assistant, "Hi, how can I help?"),
        ];
        let req = GenerateContentRequest::from_cfg(&cfg, &history, "Tuition fees?");

        let roles: Vec<_> = req.contents.iter().filter_map(|c| c.role).collect();
        assert_eq!(roles, ["user", "model", "user"]);
        assert!(req.system_instruction.is_some());
        assert_eq!(
            req.contents.last().unwrap().parts[0].text,
            "Tuition fees?"
        );
    }

    #[test]
    fn first_candidate_text_joins_parts_and_rejects_empty() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Tuition is"},{"text":"posted per credit."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            resp.first_candidate_text().unwrap(),
            "Tuition is\nposted per credit."
        );

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.first_candidate_text().is_none());

        let blank: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#,
        )
        .unwrap();
        assert!(blank.first_candidate_text().is_none());
    }
}
