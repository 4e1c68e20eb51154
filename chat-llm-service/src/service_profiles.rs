//! Shared chat LLM service with two active profiles: `primary` and `tuned`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - If no `tuned` profile is provided, it falls back to `primary`.
//!
//! The `tuned` profile carries a fine-tuned model id on top of the primary
//! provider config; [`LlmChatProfiles::generate`] prefers it when present so
//! deployments with a fine-tuned campus model answer from it by default.

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;

use crate::{
    chat_turn::ChatTurn,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::ChatLlmError,
    health_service::{HealthService, HealthStatus},
    services::{gemini_service::GeminiService, open_ai_service::OpenAiService},
};

/// Shared service that manages the **primary** and **tuned** chat profiles.
///
/// Internally, it caches OpenAI/Gemini clients keyed by their configuration
/// to avoid recreating HTTP clients on each call.
pub struct LlmChatProfiles {
    primary: LlmModelConfig,
    tuned: LlmModelConfig,
    has_tuned: bool,

    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
    gemini: RwLock<HashMap<ClientKey, Arc<GeminiService>>>,

    health: HealthService,
}

impl LlmChatProfiles {
    /// Creates a new service with the two profiles.
    ///
    /// - `primary`: required conversational profile.
    /// - `tuned_opt`: optional fine-tuned profile. If `None`, falls back to `primary`.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        primary: LlmModelConfig,
        tuned_opt: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, ChatLlmError> {
        let has_tuned = tuned_opt.is_some();
        let tuned = tuned_opt.unwrap_or_else(|| primary.clone());

        Ok(Self {
            primary,
            tuned,
            has_tuned,
            openai: RwLock::new(HashMap::new()),
            gemini: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates a reply from the preferred profile: **tuned** when
    /// configured, otherwise **primary**.
    ///
    /// # Arguments
    /// - `history`: the ordered conversation so far.
    /// - `user_text`: the new user turn, appended after `history`.
    ///
    /// # Errors
    /// Returns [`ChatLlmError`] if generation fails.
    pub async fn generate(
        &self,
        history: &[ChatTurn],
        user_text: &str,
    ) -> Result<String, ChatLlmError> {
        if self.has_tuned {
            self.generate_with(&self.tuned, history, user_text).await
        } else {
            self.generate_with(&self.primary, history, user_text).await
        }
    }

    /// Generates a reply from the **primary** profile, regardless of any
    /// tuned profile.
    pub async fn generate_primary(
        &self,
        history: &[ChatTurn],
        user_text: &str,
    ) -> Result<String, ChatLlmError> {
        self.generate_with(&self.primary, history, user_text).await
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// If the tuned profile equals the primary profile, it is checked only
    /// once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(2);
        list.push(self.primary.clone());
        if self.tuned != self.primary {
            list.push(self.tuned.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(primary, tuned)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.primary, &self.tuned)
    }

    /* --------------------- Internals --------------------- */

    async fn generate_with(
        &self,
        cfg: &LlmModelConfig,
        history: &[ChatTurn],
        user_text: &str,
    ) -> Result<String, ChatLlmError> {
        match cfg.provider {
            LlmProvider::OpenAi => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.generate(history, user_text).await
            }
            LlmProvider::Gemini => {
                let cli = self.get_or_init_gemini(cfg).await?;
                cli.generate(history, user_text).await
            }
        }
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, ChatLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_gemini(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<GeminiService>, ChatLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.gemini.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.gemini.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(GeminiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        if let Some(ref k) = self.api_key {
            k.hash(state);
        } else {
            0usize.hash(state);
        }
        self.timeout.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai_cfg(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAi,
            model: model.into(),
            endpoint: "https://api.openai.com".into(),
            api_key: Some("sk-test".into()),
            max_tokens: Some(512),
            temperature: Some(0.8),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn tuned_falls_back_to_primary() {
        let svc = LlmChatProfiles::new(openai_cfg("gpt-4o-mini"), None, Some(2)).unwrap();
        let (primary, tuned) = svc.profiles();
        assert_eq!(primary, tuned);
        assert!(!svc.has_tuned);
    }

    #[test]
    fn distinct_tuned_profile_is_kept() {
        let tuned = openai_cfg("ft:gpt-4o-mini:campus-chatbot");
        let svc =
            LlmChatProfiles::new(openai_cfg("gpt-4o-mini"), Some(tuned.clone()), Some(2)).unwrap();
        assert_eq!(svc.profiles().1, &tuned);
        assert!(svc.has_tuned);
    }
}
