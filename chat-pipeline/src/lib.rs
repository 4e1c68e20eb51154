//! Request-scoped conversational response pipeline.
//!
//! One pipeline run turns a single user utterance plus the session's
//! conversation history into exactly one reply, by composing:
//!
//! 1. an optional rule-based [`scope::ScopeFilter`] that rejects off-domain
//!    questions before any remote call,
//! 2. an optional bag-of-words [`classifier::IntentClassifier`] whose ranked
//!    intents a seeded [`intents::ResponseSelector`] may turn into a canned
//!    reply, and
//! 3. a [`remote::RemoteGenerator`] for everything the local stages defer.
//!
//! The [`pipeline::ChatPipeline`] orchestrator guarantees the append
//! discipline the rest of the system relies on: a successful run appends the
//! user turn and the assistant turn (in that order) exactly once; rejected
//! and failed runs leave the conversation untouched so retries replay from
//! unmodified history.

pub mod classifier;
pub mod conversation;
pub mod error_handler;
pub mod intents;
pub mod pipeline;
pub mod remote;
pub mod scope;

pub use classifier::{ClassificationResult, IntentClassifier, ScoredIntent};
pub use conversation::{Conversation, Message, Role};
pub use error_handler::{ConfigError, PipelineError, Result};
pub use intents::{IntentTable, ResponseSelector};
pub use pipeline::{ChatPipeline, ChatReply, ReplySource};
pub use remote::{RemoteError, RemoteGenerator};
pub use scope::{ScopeFilter, ScopeRules};
