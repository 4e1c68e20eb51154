//! Shared chat LLM service with two providers (OpenAI, Gemini), unified
//! errors, health checks, and primary/tuned profiles.
//!
//! The crate is a thin remote-generation collaborator: it knows how to turn
//! an ordered, role-tagged conversation into a provider-specific request,
//! perform a single non-streaming call, and hand back the first candidate's
//! text. Retry policy, conversation ownership, and response selection all
//! live with the caller.

pub mod chat_turn;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use chat_turn::{ChatRole, ChatTurn};
pub use error_handler::{ChatLlmError, Result};
pub use service_profiles::LlmChatProfiles;
