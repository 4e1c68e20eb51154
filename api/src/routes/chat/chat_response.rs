use serde::Serialize;
use uuid::Uuid;

/// Response payload for /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Session the exchange was recorded under; send it back on the next turn.
    pub session_id: Uuid,
    /// The assistant's reply (plain text).
    pub reply: String,
    /// Where the reply came from: "canned", "remote", or "refusal".
    pub source: &'static str,
}
