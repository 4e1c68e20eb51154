/// Represents the provider (backend) used for remote chat generation.
///
/// This enum distinguishes between the two hosted APIs the chatbot can
/// forward conversations to.
///
/// Adding more providers in the future (e.g., Anthropic Claude, Mistral API)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// OpenAI chat completions API.
    OpenAi,
    /// Google Gemini `generateContent` API.
    Gemini,
}

impl LlmProvider {
    /// Parses a provider name as used in `CHAT_LLM_PROVIDER`.
    ///
    /// Accepts a few common spellings; returns `None` for anything else so
    /// the caller can surface a typed configuration error.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" | "chatgpt" => Some(LlmProvider::OpenAi),
            "gemini" | "google" => Some(LlmProvider::Gemini),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_spellings() {
        assert_eq!(LlmProvider::parse("openai"), Some(LlmProvider::OpenAi));
        assert_eq!(LlmProvider::parse("ChatGPT"), Some(LlmProvider::OpenAi));
        assert_eq!(LlmProvider::parse(" gemini "), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::parse("ollama"), None);
    }
}
