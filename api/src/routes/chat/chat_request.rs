use serde::Deserialize;
use uuid::Uuid;

/// Request payload for /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Session to continue; omit to start a new one.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}
