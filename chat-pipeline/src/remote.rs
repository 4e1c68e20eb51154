//! Remote generation adapter.
//!
//! The orchestrator talks to the remote model through the
//! [`RemoteGenerator`] trait so tests can swap in a scripted fake. The
//! production implementation forwards to
//! [`chat_llm_service::LlmChatProfiles`], translating the conversation into
//! wire turns and collapsing the service's error taxonomy onto the two
//! outcomes the pipeline distinguishes: the endpoint was unreachable
//! (retryable, nothing was mutated) or it answered with an unusable payload
//! (retrying the identical call will not help).

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use chat_llm_service::{ChatLlmError, ChatRole, ChatTurn, LlmChatProfiles};

use crate::conversation::{Message, Role};

/// Boxed error source for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The two ways a remote generation call can fail. Neither is retried here;
/// the caller owns retry policy.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure: the endpoint could not be reached, answered
    /// with an error status, or the deadline expired.
    #[error("[Chat Pipeline] remote generation endpoint unavailable")]
    Unavailable(#[source] BoxError),

    /// The endpoint answered, but the expected candidate/content field was
    /// absent or empty.
    #[error("[Chat Pipeline] malformed remote response: {0}")]
    MalformedResponse(String),
}

/// A remote text-generation endpoint.
///
/// `generate` receives the ordered conversation so far plus the new user
/// text, and returns the first candidate's textual content.
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    async fn generate(&self, history: &[Message], user_text: &str) -> Result<String, RemoteError>;
}

#[async_trait]
impl<T: RemoteGenerator> RemoteGenerator for Arc<T> {
    async fn generate(&self, history: &[Message], user_text: &str) -> Result<String, RemoteError> {
        (**self).generate(history, user_text).await
    }
}

#[async_trait]
impl RemoteGenerator for LlmChatProfiles {
    async fn generate(&self, history: &[Message], user_text: &str) -> Result<String, RemoteError> {
        let turns = to_turns(history);
        LlmChatProfiles::generate(self, &turns, user_text)
            .await
            .map_err(map_llm_error)
    }
}

fn to_turns(history: &[Message]) -> Vec<ChatTurn> {
    history
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => ChatRole::System,
                Role::User => ChatRole::User,
                Role::Assistant => ChatRole::Assistant,
            };
            ChatTurn::new(role, m.content.clone())
        })
        .collect()
}

fn map_llm_error(err: ChatLlmError) -> RemoteError {
    if err.is_malformed_response() {
        RemoteError::MalformedResponse(err.to_string())
    } else {
        RemoteError::Unavailable(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_roles_map_onto_wire_roles() {
        let history = vec![
            Message::system("sys"),
            Message::user("q"),
            Message::assistant("a"),
        ];
        let turns = to_turns(&history);
        assert_eq!(turns[0].role, ChatRole::System);
        assert_eq!(turns[1].role, ChatRole::User);
        assert_eq!(turns[2].role, ChatRole::Assistant);
        assert_eq!(turns[2].content, "a");
    }

    #[test]
    fn timeout_maps_to_unavailable() {
        let err = map_llm_error(ChatLlmError::Timeout(std::time::Duration::from_secs(5)));
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }
}
