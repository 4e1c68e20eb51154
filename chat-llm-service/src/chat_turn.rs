//! Provider-neutral conversation turns.
//!
//! Both provider clients consume the same ordered list of [`ChatTurn`]s and
//! translate roles to whatever the wire format expects. Gemini has no
//! `assistant` role and no inline `system` role; the mapping lives next to
//! the role type so the clients cannot drift apart.

/// Role of a single turn in the conversation sent to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// Instruction turn, presented before the dialogue.
    System,
    /// End-user turn.
    User,
    /// Model turn from an earlier exchange.
    Assistant,
}

impl ChatRole {
    /// Role string for the OpenAI chat completions API.
    pub fn openai_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    /// Role string for the Gemini `generateContent` API.
    ///
    /// Gemini calls the model side `model`; system turns are not valid in
    /// `contents` and must be lifted into `systemInstruction` by the client.
    pub fn gemini_str(self) -> &'static str {
        match self {
            ChatRole::System | ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

/// One ordered turn of a conversation, as handed to a provider client.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
