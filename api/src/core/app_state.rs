use std::sync::Arc;

use thiserror::Error;

use chat_llm_service::{
    ChatLlmError, LlmChatProfiles,
    config::default_config::{config_chat_from_env, config_tuned_from_env},
};
use chat_pipeline::{ChatPipeline, IntentClassifier, IntentTable, ScopeFilter, ScopeRules};
use session_store::{SessionStore, SeedError};

/// Configuration failures while assembling the application state.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] ChatLlmError),

    #[error(transparent)]
    Pipeline(#[from] chat_pipeline::ConfigError),

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Shared state for all HTTP handlers.
///
/// Everything here is constructed exactly once, in [`AppState::from_env`],
/// and read-only afterwards; per-session conversations are the only mutable
/// state and live inside the session store behind their own locks.
pub struct AppState {
    /// The response pipeline, wired with whatever local stages are configured.
    pub pipeline: ChatPipeline<Arc<LlmChatProfiles>>,
    /// Session-keyed conversation histories.
    pub sessions: SessionStore,
    /// Shared LLM profiles; also serves the health endpoint.
    pub llm: Arc<LlmChatProfiles>,
}

impl AppState {
    /// Load shared state from environment variables.
    ///
    /// # Environment
    /// - `CHAT_LLM_PROVIDER` & friends: see `chat-llm-service` defaults
    /// - `INTENT_MODEL_PATH` + `INTENTS_PATH`: enable the canned-reply path
    /// - `SCOPE_FILTER` (`on`/`off`, default `on`) and optional
    ///   `SCOPE_RULES_PATH`: the in/out-of-domain gate
    /// - `CHAT_REFUSAL_TEXT`: override the out-of-scope refusal
    /// - `SESSION_SEED_PATH`: optional JSONL transcript for new sessions
    pub fn from_env() -> Result<Self, ConfigError> {
        let chat_cfg = config_chat_from_env()?;
        let tuned_cfg = config_tuned_from_env(&chat_cfg)?;
        let llm = Arc::new(LlmChatProfiles::new(chat_cfg, tuned_cfg, Some(10))?);

        let mut pipeline = ChatPipeline::new(llm.clone());

        if scope_filter_enabled() {
            let rules = match std::env::var("SCOPE_RULES_PATH") {
                Ok(path) if !path.trim().is_empty() => ScopeRules::from_path(path.trim())?,
                _ => ScopeRules::university_defaults(),
            };
            pipeline = pipeline.with_scope_filter(ScopeFilter::new(&rules)?);
        }

        if let (Ok(model_path), Ok(intents_path)) = (
            std::env::var("INTENT_MODEL_PATH"),
            std::env::var("INTENTS_PATH"),
        ) {
            let classifier = IntentClassifier::from_path(model_path.trim())?;
            let intents = IntentTable::from_path(intents_path.trim())?;
            tracing::info!(intents = intents.len(), "local intent path enabled");
            pipeline = pipeline.with_classifier(classifier, intents);
        } else {
            tracing::info!("no intent model configured; all replies go to the remote model");
        }

        if let Ok(text) = std::env::var("CHAT_REFUSAL_TEXT") {
            if !text.trim().is_empty() {
                pipeline = pipeline.with_refusal_text(text.trim());
            }
        }

        let sessions = match std::env::var("SESSION_SEED_PATH") {
            Ok(path) if !path.trim().is_empty() => SessionStore::from_seed_file(path.trim())?,
            _ => SessionStore::new(),
        };

        Ok(Self {
            pipeline,
            sessions,
            llm,
        })
    }
}

fn scope_filter_enabled() -> bool {
    match std::env::var("SCOPE_FILTER") {
        Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0"),
        Err(_) => true,
    }
}
