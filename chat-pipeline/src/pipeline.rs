//! Pipeline orchestrator: one request, one run, one reply.
//!
//! A run walks a small state machine: an optional scope gate, then the
//! local classifier/selector pair, then the remote call. The conversation
//! is mutated exactly once per successful terminal state — user turn then
//! assistant turn — and never on rejection or failure, which keeps a failed
//! request safe to retry against unmodified history.
//!
//! Out-of-scope rejections are returned as a normal reply (not appended to
//! the conversation); remote failures propagate as errors for the HTTP
//! layer to map.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, instrument};

use crate::classifier::IntentClassifier;
use crate::conversation::{Conversation, Message};
use crate::error_handler::PipelineError;
use crate::intents::{IntentTable, ResponseSelector};
use crate::remote::{RemoteError, RemoteGenerator};
use crate::scope::ScopeFilter;

/// Default refusal returned for out-of-scope questions; distinguishable
/// from a genuine answer and stable across requests.
pub const DEFAULT_REFUSAL: &str =
    "I can only help with questions about the university — admissions, tuition, courses, and campus life.";

/// Where a reply came from. Serialized into API responses so clients can
/// tell canned, generated, and refusal texts apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Pre-authored response selected for a recognized intent.
    Canned,
    /// Text generated by the remote model.
    Remote,
    /// Fixed out-of-scope refusal.
    Refusal,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplySource::Canned => "canned",
            ReplySource::Remote => "remote",
            ReplySource::Refusal => "refusal",
        }
    }
}

/// The reply of one successful (or rejected) pipeline run.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
}

/// Request-scoped conversational response pipeline.
///
/// Construct once at startup and share; all stages are read-only at serving
/// time except the selector's RNG, which sits behind its own lock. The
/// conversation passed to [`ChatPipeline::run`] is the only per-session
/// mutable state and is owned by the caller.
pub struct ChatPipeline<G> {
    scope: Option<ScopeFilter>,
    classifier: Option<IntentClassifier>,
    intents: IntentTable,
    selector: Mutex<ResponseSelector>,
    generator: G,
    refusal_text: String,
}

impl<G: RemoteGenerator> ChatPipeline<G> {
    /// A pipeline that always defers to remote generation. Add local stages
    /// with the `with_*` builders.
    pub fn new(generator: G) -> Self {
        Self {
            scope: None,
            classifier: None,
            intents: IntentTable::empty(),
            selector: Mutex::new(ResponseSelector::new()),
            generator,
            refusal_text: DEFAULT_REFUSAL.to_string(),
        }
    }

    /// Gates every run behind the given scope filter.
    pub fn with_scope_filter(mut self, filter: ScopeFilter) -> Self {
        self.scope = Some(filter);
        self
    }

    /// Enables the local canned-reply path.
    pub fn with_classifier(mut self, classifier: IntentClassifier, intents: IntentTable) -> Self {
        self.classifier = Some(classifier);
        self.intents = intents;
        self
    }

    /// Overrides the out-of-scope refusal text.
    pub fn with_refusal_text(mut self, text: impl Into<String>) -> Self {
        self.refusal_text = text.into();
        self
    }

    /// Seeds the response selector; used by tests to pin down selection.
    pub fn with_selector_seed(mut self, seed: u64) -> Self {
        self.selector = Mutex::new(ResponseSelector::with_seed(seed));
        self
    }

    /// Runs the pipeline once for `user_text` against `conversation`.
    ///
    /// On success the conversation grows by exactly two messages (user,
    /// assistant). On rejection or any error it is left untouched.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidInput`] for empty/whitespace input
    /// - [`PipelineError::Remote`] when the remote call fails
    #[instrument(name = "pipeline_run", skip(self, conversation, user_text), fields(history_len = conversation.len()))]
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> Result<ChatReply, PipelineError> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(PipelineError::InvalidInput);
        }

        if let Some(scope) = &self.scope {
            if !scope.in_scope(user_text) {
                debug!("utterance rejected as out of scope");
                return Ok(ChatReply {
                    text: self.refusal_text.clone(),
                    source: ReplySource::Refusal,
                });
            }
        }

        if let Some(classifier) = &self.classifier {
            let ranked = classifier.classify(user_text);
            if let Some(text) = self.pick_canned(&ranked) {
                debug!(intent = %ranked[0].intent, "answering with canned response");
                conversation.push(Message::user(user_text));
                conversation.push(Message::assistant(text.clone()));
                return Ok(ChatReply {
                    text,
                    source: ReplySource::Canned,
                });
            }
        }

        let answer = self
            .generator
            .generate(conversation.messages(), user_text)
            .await?;
        // A blank assistant turn must never reach the history or the user.
        if answer.trim().is_empty() {
            return Err(RemoteError::MalformedResponse(
                "candidate content is empty".into(),
            )
            .into());
        }

        conversation.push(Message::user(user_text));
        conversation.push(Message::assistant(answer.clone()));
        Ok(ChatReply {
            text: answer,
            source: ReplySource::Remote,
        })
    }

    fn pick_canned(&self, ranked: &[crate::classifier::ScoredIntent]) -> Option<String> {
        let mut selector = self
            .selector
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        selector.select(ranked, &self.intents)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::classifier::IntentModelArtifact;
    use crate::scope::ScopeRules;

    /// Scripted remote endpoint: counts calls and answers or fails on cue.
    struct FakeRemote {
        reply: Result<String, &'static str>,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused"),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteGenerator for &FakeRemote {
        async fn generate(
            &self,
            _history: &[Message],
            _user_text: &str,
        ) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(RemoteError::Unavailable((*msg).into())),
            }
        }
    }

    /// Five labels so an utterance with no vocabulary hits scores uniform
    /// 0.2 per label, which is below the confidence threshold.
    fn greeting_classifier() -> (IntentClassifier, IntentTable) {
        let classifier = IntentClassifier::new(IntentModelArtifact {
            vocabulary: vec![
                "hello".into(),
                "hi".into(),
                "thank".into(),
                "bye".into(),
                "hour".into(),
                "library".into(),
            ],
            labels: vec![
                "greeting".into(),
                "thanks".into(),
                "goodbye".into(),
                "hours".into(),
                "library".into(),
            ],
            weights: vec![
                vec![6.0, 6.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 6.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 6.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0, 6.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0, 0.0, 6.0],
            ],
            bias: vec![0.0; 5],
        })
        .unwrap();
        let table = IntentTable::from_map(HashMap::from([(
            "greeting".to_string(),
            vec!["Hello!".to_string(), "Hi there!".to_string()],
        )]))
        .unwrap();
        (classifier, table)
    }

    #[tokio::test]
    async fn remote_success_appends_user_then_assistant() {
        let remote = FakeRemote::answering("Tuition is posted per credit hour.");
        let pipeline = ChatPipeline::new(&remote);
        let mut convo = Conversation::new();

        let reply = pipeline
            .run(&mut convo, "What is the tuition at LIU?")
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(convo.len(), 2);
        assert_eq!(convo.messages()[0], Message::user("What is the tuition at LIU?"));
        assert_eq!(
            convo.messages()[1],
            Message::assistant("Tuition is posted per credit hour.")
        );
    }

    #[tokio::test]
    async fn remote_failure_leaves_conversation_untouched() {
        let remote = FakeRemote::failing();
        let pipeline = ChatPipeline::new(&remote);
        let mut convo = Conversation::from_messages(vec![Message::user("earlier question")]);

        let err = pipeline.run(&mut convo, "and a follow-up").await.unwrap_err();

        assert!(matches!(err, PipelineError::Remote(RemoteError::Unavailable(_))));
        assert_eq!(convo.len(), 1);
    }

    #[tokio::test]
    async fn out_of_scope_refuses_without_mutation_or_remote_call() {
        let remote = FakeRemote::answering("should never be used");
        let pipeline = ChatPipeline::new(&remote)
            .with_scope_filter(ScopeFilter::new(&ScopeRules::university_defaults()).unwrap());
        let mut convo = Conversation::new();

        let reply = pipeline
            .run(&mut convo, "What's the weather today?")
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Refusal);
        assert_eq!(reply.text, DEFAULT_REFUSAL);
        assert_eq!(convo.len(), 0);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn in_scope_question_reaches_the_remote_model() {
        let remote = FakeRemote::answering("LIU tuition depends on the program.");
        let pipeline = ChatPipeline::new(&remote)
            .with_scope_filter(ScopeFilter::new(&ScopeRules::university_defaults()).unwrap());
        let mut convo = Conversation::new();

        let reply = pipeline
            .run(&mut convo, "What is the tuition at LIU?")
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(remote.calls(), 1);
        assert_eq!(convo.len(), 2);
    }

    #[tokio::test]
    async fn recognized_intent_short_circuits_the_remote_call() {
        let remote = FakeRemote::answering("should never be used");
        let (classifier, table) = greeting_classifier();
        let pipeline = ChatPipeline::new(&remote)
            .with_classifier(classifier, table)
            .with_selector_seed(7);
        let mut convo = Conversation::new();

        let reply = pipeline.run(&mut convo, "hello").await.unwrap();

        assert_eq!(reply.source, ReplySource::Canned);
        assert!(reply.text == "Hello!" || reply.text == "Hi there!");
        assert_eq!(remote.calls(), 0);
        assert_eq!(convo.len(), 2);
        assert_eq!(convo.messages()[1], Message::assistant(reply.text.clone()));
    }

    #[tokio::test]
    async fn unrecognized_utterance_defers_to_remote() {
        let remote = FakeRemote::answering("Generated answer.");
        let (classifier, table) = greeting_classifier();
        let pipeline = ChatPipeline::new(&remote).with_classifier(classifier, table);
        let mut convo = Conversation::new();

        let reply = pipeline
            .run(&mut convo, "when does registration open")
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn missing_table_entry_degrades_to_remote() {
        let remote = FakeRemote::answering("Generated answer.");
        let (classifier, _) = greeting_classifier();
        // Classifier knows "greeting" but the table does not: configuration
        // drift, not a crash.
        let table =
            IntentTable::from_map(HashMap::from([("thanks".to_string(), vec!["np".to_string()])]))
                .unwrap();
        let pipeline = ChatPipeline::new(&remote).with_classifier(classifier, table);
        let mut convo = Conversation::new();

        let reply = pipeline.run(&mut convo, "hello").await.unwrap();

        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(remote.calls(), 1);
        assert_eq!(convo.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_stage() {
        let remote = FakeRemote::answering("unused");
        let pipeline = ChatPipeline::new(&remote);
        let mut convo = Conversation::new();

        let err = pipeline.run(&mut convo, "   ").await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput));
        assert_eq!(convo.len(), 0);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn blank_remote_answer_is_malformed_not_appended() {
        let remote = FakeRemote::answering("   ");
        let pipeline = ChatPipeline::new(&remote);
        let mut convo = Conversation::new();

        let err = pipeline.run(&mut convo, "anything").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Remote(RemoteError::MalformedResponse(_))
        ));
        assert_eq!(convo.len(), 0);
    }

    #[tokio::test]
    async fn failed_run_can_be_retried_from_identical_history() {
        let failing = FakeRemote::failing();
        let pipeline = ChatPipeline::new(&failing);
        let mut convo = Conversation::from_messages(vec![
            Message::user("What programs does LIU offer?"),
            Message::assistant("Engineering, business, and pharmacy."),
        ]);
        let before = convo.clone();

        let _ = pipeline.run(&mut convo, "How much is tuition?").await;
        assert_eq!(convo, before);

        let healthy = FakeRemote::answering("About $9,000 per year.");
        let retry_pipeline = ChatPipeline::new(&healthy);
        let reply = retry_pipeline
            .run(&mut convo, "How much is tuition?")
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(convo.len(), 4);
    }
}
