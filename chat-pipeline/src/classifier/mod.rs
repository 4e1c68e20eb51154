//! Bag-of-words intent classifier.
//!
//! Classification is deterministic and side-effect free: normalize the
//! utterance, encode it as a binary presence/absence vector over the fixed
//! vocabulary, score every label with the pre-trained softmax layer, drop
//! everything at or below the confidence threshold, and return the
//! survivors ranked by probability. An empty result is not an error — it
//! tells the orchestrator to defer to remote generation.

pub mod artifact;
pub mod text;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use tracing::trace;

pub use artifact::IntentModelArtifact;

use crate::error_handler::ConfigError;

/// Entries with probability at or below this never surface; a low-confidence
/// top intent would otherwise shadow the remote model with a wrong canned
/// reply.
pub const CONFIDENCE_THRESHOLD: f32 = 0.25;

/// One ranked intent with its posterior probability.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredIntent {
    pub intent: String,
    pub probability: f32,
}

/// Ranked classifier output, sorted descending by probability. Ties keep the
/// original label order so selection stays deterministic. May be empty.
pub type ClassificationResult = Vec<ScoredIntent>;

/// Serving-time intent classifier over a validated model artifact.
pub struct IntentClassifier {
    artifact: IntentModelArtifact,
    vocab_index: HashMap<String, usize>,
}

impl IntentClassifier {
    /// Wraps a model artifact, validating its shape first.
    ///
    /// # Errors
    /// [`ConfigError::ModelShape`] when the artifact dimensions disagree.
    pub fn new(artifact: IntentModelArtifact) -> Result<Self, ConfigError> {
        artifact.validate()?;
        let vocab_index = artifact
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();
        Ok(Self {
            artifact,
            vocab_index,
        })
    }

    /// Loads the artifact from a JSON file and wraps it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(IntentModelArtifact::from_path(path)?)
    }

    /// Classifies one utterance into ranked `(intent, probability)` pairs.
    ///
    /// Returns an empty result when nothing clears the threshold.
    pub fn classify(&self, utterance: &str) -> ClassificationResult {
        let features = self.encode(utterance);

        let logits: Vec<f32> = self
            .artifact
            .weights
            .iter()
            .zip(&self.artifact.bias)
            .map(|(row, bias)| {
                row.iter()
                    .zip(&features)
                    .map(|(w, x)| w * x)
                    .sum::<f32>()
                    + bias
            })
            .collect();

        let probabilities = softmax(&logits);

        let mut ranked: ClassificationResult = self
            .artifact
            .labels
            .iter()
            .zip(probabilities)
            .filter(|(_, p)| *p > CONFIDENCE_THRESHOLD)
            .map(|(label, probability)| ScoredIntent {
                intent: label.clone(),
                probability,
            })
            .collect();

        // Stable sort: equal probabilities keep label order.
        ranked.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
        });

        trace!(utterance_len = utterance.len(), ranked = ranked.len(), "classified utterance");
        ranked
    }

    /// Binary presence/absence encoding over the vocabulary. Repeated tokens
    /// have no additional effect.
    fn encode(&self, utterance: &str) -> Vec<f32> {
        let mut bag = vec![0.0f32; self.artifact.vocabulary.len()];
        for token in text::normalize(utterance) {
            if let Some(&i) = self.vocab_index.get(&token) {
                bag[i] = 1.0;
            }
        }
        bag
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three-intent model over a small vocabulary; each label strongly
    /// weights its own tokens.
    fn classifier() -> IntentClassifier {
        IntentClassifier::new(IntentModelArtifact {
            vocabulary: vec![
                "bye".into(),
                "goodbye".into(),
                "hello".into(),
                "hi".into(),
                "thank".into(),
                "you".into(),
            ],
            labels: vec!["greeting".into(), "thanks".into(), "goodbye".into()],
            weights: vec![
                vec![-1.0, -1.0, 4.0, 4.0, -1.0, 0.0],
                vec![-1.0, -1.0, -1.0, -1.0, 4.0, 1.0],
                vec![4.0, 4.0, -1.0, -1.0, -1.0, 0.0],
            ],
            bias: vec![0.0, 0.0, 0.0],
        })
        .unwrap()
    }

    #[test]
    fn ranking_is_sorted_and_thresholded() {
        let clf = classifier();
        let ranked = clf.classify("Hello, thank you!");

        assert!(!ranked.is_empty());
        for pair in ranked.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
        for entry in &ranked {
            assert!(entry.probability > CONFIDENCE_THRESHOLD);
        }
    }

    #[test]
    fn confident_intent_wins() {
        let clf = classifier();
        let ranked = clf.classify("hi hello");
        assert_eq!(ranked[0].intent, "greeting");
        assert!(ranked[0].probability > 0.8);
    }

    #[test]
    fn uniform_tie_preserves_label_order() {
        let clf = classifier();
        // Nothing from the vocabulary: logits are all-bias, probabilities
        // uniform at 1/3. A three-way tie clears the threshold, and the
        // stable sort keeps the original label order.
        let ranked = clf.classify("quantum entanglement parking");
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].intent, "greeting");
        assert_eq!(ranked[1].intent, "thanks");
        assert_eq!(ranked[2].intent, "goodbye");
    }

    #[test]
    fn below_threshold_labels_are_dropped() {
        // Five labels, no evidence: uniform probability 0.2 ≤ 0.25 for all
        // of them, so the result is empty and the pipeline defers to the
        // remote model.
        let clf = IntentClassifier::new(IntentModelArtifact {
            vocabulary: vec!["hello".into()],
            labels: (0..5).map(|i| format!("intent-{i}")).collect(),
            weights: vec![vec![0.0]; 5],
            bias: vec![0.0; 5],
        })
        .unwrap();
        assert!(clf.classify("anything else").is_empty());
    }

    #[test]
    fn repeated_tokens_do_not_change_the_encoding() {
        let clf = classifier();
        let once = clf.classify("hello");
        let many = clf.classify("hello hello hello hello");
        assert_eq!(once, many);
    }

    #[test]
    fn classification_is_pure() {
        let clf = classifier();
        assert_eq!(clf.classify("thank you"), clf.classify("thank you"));
    }
}
