//! On-disk intent model artifact.
//!
//! Training happens elsewhere; serving loads a single JSON file holding the
//! sorted vocabulary, the intent labels, and a dense softmax layer. The
//! shapes are validated once at load — a vocabulary/weight mismatch means
//! the artifact pair is broken and the process should not serve with it.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error_handler::ConfigError;

/// Pre-trained multi-class intent model, as serialized by the trainer.
///
/// Scoring is `softmax(W · x + b)` where `x` is the binary bag-of-words
/// vector over `vocabulary`, `W` is `weights` (one row per label), and `b`
/// is `bias`.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentModelArtifact {
    /// Fixed, sorted set of normalized tokens. Immutable at inference time.
    pub vocabulary: Vec<String>,
    /// Intent labels, in training order. Row `i` of `weights` scores
    /// `labels[i]`; the order also breaks probability ties deterministically.
    pub labels: Vec<String>,
    /// Dense layer, `labels.len()` rows of `vocabulary.len()` columns.
    pub weights: Vec<Vec<f32>>,
    /// Per-label bias, `labels.len()` entries.
    pub bias: Vec<f32>,
}

impl IntentModelArtifact {
    /// Loads and validates an artifact from a JSON file.
    ///
    /// # Errors
    /// [`ConfigError::Io`]/[`ConfigError::Parse`] for unreadable or invalid
    /// files, [`ConfigError::ModelShape`] when the dimensions disagree.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let artifact: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Checks that vocabulary, labels, weights, and bias agree on shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vocabulary.is_empty() {
            return Err(ConfigError::ModelShape("vocabulary is empty".into()));
        }
        if self.labels.is_empty() {
            return Err(ConfigError::ModelShape("label set is empty".into()));
        }
        if self.weights.len() != self.labels.len() {
            return Err(ConfigError::ModelShape(format!(
                "{} weight rows for {} labels",
                self.weights.len(),
                self.labels.len()
            )));
        }
        if self.bias.len() != self.labels.len() {
            return Err(ConfigError::ModelShape(format!(
                "{} bias entries for {} labels",
                self.bias.len(),
                self.labels.len()
            )));
        }
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != self.vocabulary.len() {
                return Err(ConfigError::ModelShape(format!(
                    "weight row {} has {} columns, vocabulary has {} tokens",
                    i,
                    row.len(),
                    self.vocabulary.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> IntentModelArtifact {
        IntentModelArtifact {
            vocabulary: vec!["hello".into(), "hi".into()],
            labels: vec!["greeting".into()],
            weights: vec![vec![2.0, 2.0]],
            bias: vec![0.0],
        }
    }

    #[test]
    fn valid_artifact_passes() {
        assert!(artifact().validate().is_ok());
    }

    #[test]
    fn shape_mismatches_are_fatal() {
        let mut short_row = artifact();
        short_row.weights = vec![vec![2.0]];
        assert!(matches!(
            short_row.validate(),
            Err(ConfigError::ModelShape(_))
        ));

        let mut missing_bias = artifact();
        missing_bias.bias = vec![];
        assert!(matches!(
            missing_bias.validate(),
            Err(ConfigError::ModelShape(_))
        ));

        let mut extra_label = artifact();
        extra_label.labels.push("thanks".into());
        assert!(matches!(
            extra_label.validate(),
            Err(ConfigError::ModelShape(_))
        ));
    }
}
