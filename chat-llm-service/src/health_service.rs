//! Universal health service for the chat LLM backends (OpenAI, Gemini).
//!
//! This module exposes lightweight health checks for supported providers:
//! - OpenAI: `GET {endpoint}/v1/models/{model}` with Bearer auth
//! - Gemini: `GET {endpoint}/v1beta/models/{model}` with the API-key header
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a
//! `/health` endpoint. [`HealthService::check`] is resilient and never fails
//! (errors mapped to `ok=false`). Provider-specific probes (`try_*`) return
//! strict `Result`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ChatLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "OpenAi", "Gemini").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    #[inline]
    fn ok(
        provider: LlmProvider,
        endpoint: &str,
        model: Option<&str>,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{provider:?}"),
            endpoint: endpoint.to_string(),
            model: model.map(str::to_string),
            ok: true,
            latency_ms,
            message: message.into(),
        }
    }

    #[inline]
    fn fail(
        provider: LlmProvider,
        endpoint: &str,
        model: Option<&str>,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{provider:?}"),
            endpoint: endpoint.to_string(),
            model: model.map(str::to_string),
            ok: false,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker shared by all configured profiles.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a checker with its own short-timeout HTTP client.
    ///
    /// # Errors
    /// [`ChatLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, ChatLlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(5)))
            .build()?;
        Ok(Self { client })
    }

    /// Probes a single config. Never fails; all errors map to `ok=false`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let started = Instant::now();
        let result = match cfg.provider {
            LlmProvider::OpenAi => self.try_openai(cfg).await,
            LlmProvider::Gemini => self.try_gemini(cfg).await,
        };
        let latency_ms = started.elapsed().as_millis();

        match result {
            Ok(msg) => {
                debug!(provider = ?cfg.provider, model = %cfg.model, latency_ms, "health probe ok");
                HealthStatus::ok(cfg.provider, &cfg.endpoint, Some(&cfg.model), latency_ms, msg)
            }
            Err(e) => {
                warn!(provider = ?cfg.provider, model = %cfg.model, latency_ms, error = %e, "health probe failed");
                HealthStatus::fail(
                    cfg.provider,
                    &cfg.endpoint,
                    Some(&cfg.model),
                    latency_ms,
                    e.to_string(),
                )
            }
        }
    }

    /// Probes each config in order and collects the snapshots.
    pub async fn check_many(&self, cfgs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(cfgs.len());
        for cfg in cfgs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict OpenAI probe: `GET /v1/models/{model}` must answer 2xx.
    async fn try_openai(&self, cfg: &LlmModelConfig) -> Result<String, ChatLlmError> {
        let base = valid_base(&cfg.endpoint)?;
        let url = format!("{}/v1/models/{}", base, cfg.model);
        let key = cfg.api_key.as_deref().unwrap_or_default();

        let resp = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .send()
            .await?;
        ensure_success(resp, &url).await?;
        Ok(format!("model {} reachable", cfg.model))
    }

    /// Strict Gemini probe: `GET /v1beta/models/{model}` must answer 2xx.
    async fn try_gemini(&self, cfg: &LlmModelConfig) -> Result<String, ChatLlmError> {
        let base = valid_base(&cfg.endpoint)?;
        let url = format!("{}/v1beta/models/{}", base, cfg.model);
        let key = cfg.api_key.as_deref().unwrap_or_default();

        let resp = self
            .client
            .get(&url)
            .header("x-goog-api-key", key)
            .send()
            .await?;
        ensure_success(resp, &url).await?;
        Ok(format!("model {} reachable", cfg.model))
    }
}

fn valid_base(endpoint: &str) -> Result<String, ChatLlmError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty()
        || !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
    {
        return Err(HealthError::InvalidEndpoint(endpoint.to_string()).into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn ensure_success(resp: reqwest::Response, url: &str) -> Result<(), ChatLlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let text = resp.text().await.unwrap_or_default();
    Err(HealthError::HttpStatus(HttpError {
        status,
        url: url.to_string(),
        snippet: make_snippet(&text),
    })
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_validation_rejects_bad_schemes() {
        assert!(valid_base("https://api.openai.com/").is_ok());
        assert_eq!(
            valid_base("https://api.openai.com/").unwrap(),
            "https://api.openai.com"
        );
        assert!(valid_base("ftp://api.openai.com").is_err());
        assert!(valid_base("  ").is_err());
    }
}
