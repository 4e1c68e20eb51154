use crate::config::llm_provider::LlmProvider;

/// Configuration for a remote chat-model invocation.
///
/// This struct contains both general and provider-specific parameters.
/// It can be extended as needed to support new backends or features.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use (OpenAI, Gemini).
/// - `model`: The model identifier (e.g., `"gpt-4o-mini"`, `"gemini-2.0-flash"`,
///   or a fine-tuned model id such as `"tunedModels/campus-chatbot-xyz"`).
/// - `endpoint`: The API base URL.
/// - `api_key`: API key for the provider.
/// - `max_tokens`: Bound on the generated output length.
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: Optional request timeout in seconds; doubles as the
///   caller-supplied deadline for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (OpenAI, Gemini).
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// API base URL.
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
