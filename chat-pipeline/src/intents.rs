//! Intent-to-response table and the canned-response selector.
//!
//! The table is loaded once from the same `intents.json` the trainer
//! consumes (`intents[].tag` + `responses`; the training `patterns` are
//! tolerated and ignored at serving time) and is immutable afterwards.
//!
//! Selection is a pure policy over the ranked classifier output: top intent
//! or nothing. The random choice among a label's candidates goes through an
//! injected seedable generator so tests can pin it down.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::warn;

use crate::classifier::ScoredIntent;
use crate::error_handler::ConfigError;

#[derive(Debug, Deserialize)]
struct IntentsFile {
    intents: Vec<IntentEntry>,
}

#[derive(Debug, Deserialize)]
struct IntentEntry {
    tag: String,
    /// Training phrases; present in the file, unused at serving time.
    #[serde(default)]
    #[allow(dead_code)]
    patterns: Vec<String>,
    responses: Vec<String>,
}

/// Immutable mapping from intent label to its canned response candidates.
#[derive(Debug, Clone, Default)]
pub struct IntentTable {
    responses: HashMap<String, Vec<String>>,
}

impl IntentTable {
    /// An empty table: every lookup misses and the pipeline always defers
    /// to remote generation. Used when no intents file is configured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table directly from label → responses pairs.
    ///
    /// # Errors
    /// [`ConfigError::EmptyResponses`] if any label has no candidates.
    pub fn from_map(responses: HashMap<String, Vec<String>>) -> Result<Self, ConfigError> {
        for (label, candidates) in &responses {
            if candidates.is_empty() {
                return Err(ConfigError::EmptyResponses {
                    label: label.clone(),
                });
            }
        }
        Ok(Self { responses })
    }

    /// Loads a table from an `intents.json` file.
    ///
    /// # Errors
    /// [`ConfigError::Io`]/[`ConfigError::Parse`] for unreadable or invalid
    /// files, [`ConfigError::EmptyTable`] when no intents are defined,
    /// [`ConfigError::EmptyResponses`] when an intent has no candidates.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: IntentsFile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        if file.intents.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        let mut responses = HashMap::with_capacity(file.intents.len());
        for entry in file.intents {
            if entry.responses.is_empty() {
                return Err(ConfigError::EmptyResponses { label: entry.tag });
            }
            responses.insert(entry.tag, entry.responses);
        }
        Ok(Self { responses })
    }

    pub fn responses_for(&self, label: &str) -> Option<&[String]> {
        self.responses.get(label).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// Picks a canned response for the top-ranked intent, or nothing.
pub struct ResponseSelector {
    rng: StdRng,
}

impl ResponseSelector {
    /// Selector with an OS-seeded generator for serving.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Selector with a fixed seed; identical inputs then yield identical
    /// choices.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Applies the selection policy:
    ///
    /// - empty `ranked` → `None`
    /// - top intent absent from `table` → `None` (configuration drift, warn
    ///   and defer rather than fail the request)
    /// - otherwise a uniformly random candidate of the top intent
    pub fn select(&mut self, ranked: &[ScoredIntent], table: &IntentTable) -> Option<String> {
        let top = ranked.first()?;
        let Some(candidates) = table.responses_for(&top.intent) else {
            warn!(
                intent = %top.intent,
                "classifier intent missing from response table; deferring to remote generation"
            );
            return None;
        };
        candidates.choose(&mut self.rng).cloned()
    }
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(intent: &str) -> Vec<ScoredIntent> {
        vec![ScoredIntent {
            intent: intent.into(),
            probability: 0.9,
        }]
    }

    fn table() -> IntentTable {
        IntentTable::from_map(HashMap::from([(
            "greeting".to_string(),
            vec!["Hello!".to_string(), "Hi there!".to_string()],
        )]))
        .unwrap()
    }

    #[test]
    fn selection_is_deterministic_under_a_fixed_seed() {
        let table = table();
        let mut a = ResponseSelector::with_seed(7);
        let mut b = ResponseSelector::with_seed(7);
        for _ in 0..20 {
            assert_eq!(
                a.select(&ranked("greeting"), &table),
                b.select(&ranked("greeting"), &table)
            );
        }
    }

    #[test]
    fn known_intent_always_yields_a_candidate() {
        let table = table();
        let mut selector = ResponseSelector::with_seed(1);
        for _ in 0..20 {
            let choice = selector.select(&ranked("greeting"), &table).unwrap();
            assert!(choice == "Hello!" || choice == "Hi there!");
        }
    }

    #[test]
    fn empty_result_and_missing_label_mean_no_match() {
        let table = table();
        let mut selector = ResponseSelector::with_seed(1);
        assert_eq!(selector.select(&[], &table), None);
        assert_eq!(selector.select(&ranked("refund"), &table), None);
    }

    #[test]
    fn empty_response_lists_are_rejected_at_load() {
        let err = IntentTable::from_map(HashMap::from([("greeting".to_string(), vec![])]));
        assert!(matches!(
            err,
            Err(ConfigError::EmptyResponses { label }) if label == "greeting"
        ));
    }
}
