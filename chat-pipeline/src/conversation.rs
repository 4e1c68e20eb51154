//! Conversation data model: role-tagged messages in an append-only log.
//!
//! Insertion order is chronological order is the exact order presented to
//! the remote model. A `Conversation` is exclusively owned by the session
//! scope that created it; serializing concurrent access is the owner's job
//! (the session store keeps each one behind its own lock).

use serde::{Deserialize, Serialize};

/// Author of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One immutable, role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only sequence of [`Message`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a conversation from an already-ordered message sequence,
    /// e.g. a persisted transcript.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Appends one message at the end. There is no way to insert, replace,
    /// or remove earlier messages.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut convo = Conversation::new();
        convo.push(Message::system("campus assistant"));
        convo.push(Message::user("hi"));
        convo.push(Message::assistant("hello"));

        let roles: Vec<Role> = convo.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
        assert_eq!(convo.len(), 3);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::assistant("ok");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
