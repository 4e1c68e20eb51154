//! Rule-based in/out-of-domain gate, applied before any remote call.
//!
//! One data-driven rule set replaces the per-deployment keyword lists the
//! earlier prototypes hard-coded. Evaluation order is a precedence policy,
//! not an optimization: a domain match wins even when an off-topic pattern
//! also fires, and the default for unmatched input is out-of-scope.

use std::fs;
use std::path::Path;

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error_handler::ConfigError;

/// Three ordered pattern lists, loadable from a JSON file.
///
/// Patterns are regular expressions matched case-insensitively anywhere in
/// the utterance. No stemming is applied; rules that need to cover
/// inflections spell them out (e.g. `stud(y|ies|ying)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRules {
    /// Tier 1: domain-specific terms. A match is immediately in-scope.
    pub domain: Vec<String>,
    /// Tier 2: known off-topic subjects. A match is immediately out-of-scope.
    pub off_topic: Vec<String>,
    /// Tier 3: broader educational vocabulary. A match is in-scope.
    pub educational: Vec<String>,
}

impl ScopeRules {
    /// Built-in rule set for the university deployment; used when no rules
    /// file is configured.
    pub fn university_defaults() -> Self {
        Self {
            domain: [
                r"\bliu\b",
                "tuition",
                "admission",
                "enroll?ment|enrol\\b",
                "registrar|registration",
                "scholarship",
                "financial aid",
                "dorm|housing",
                "semester|midterm|final exam",
                r"\bcourse",
                "curriculum|syllabus",
                "faculty|dean\\b",
                r"\bmajor\b|\bminor\b",
                "credit hour",
                "transcript",
                r"\bgpa\b",
                r"\bcampus",
            ]
            .map(str::to_string)
            .to_vec(),
            off_topic: [
                "weather",
                "football|basketball|match score",
                "politic|election",
                "stock market|crypto|bitcoin",
                "movie|netflix|celebrit",
                "recipe|cooking",
                "joke",
                "horoscope",
            ]
            .map(str::to_string)
            .to_vec(),
            educational: [
                "universit|college",
                "degree|diploma|bachelor|master|phd",
                "stud(y|ies|ying|ent)",
                "education|academic",
                "professor|lecture",
                "research|thesis",
                "exam|grade|assignment",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }

    /// Loads a rule set from a JSON file.
    ///
    /// # Errors
    /// [`ConfigError::Io`]/[`ConfigError::Parse`] for unreadable or invalid
    /// files.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Compiled scope filter. Matching is pure: same input, same answer.
pub struct ScopeFilter {
    domain: RegexSet,
    off_topic: RegexSet,
    educational: RegexSet,
}

impl ScopeFilter {
    /// Compiles a rule set into matchers.
    ///
    /// # Errors
    /// [`ConfigError::BadPattern`] when any pattern fails to compile.
    pub fn new(rules: &ScopeRules) -> Result<Self, ConfigError> {
        Ok(Self {
            domain: compile(&rules.domain)?,
            off_topic: compile(&rules.off_topic)?,
            educational: compile(&rules.educational)?,
        })
    }

    /// Two-tier rule evaluation in fixed order, first match wins:
    ///
    /// 1. domain pattern matches → `true`
    /// 2. off-topic pattern matches → `false`
    /// 3. educational pattern matches → `true`
    /// 4. nothing matches → `false`
    pub fn in_scope(&self, utterance: &str) -> bool {
        if self.domain.is_match(utterance) {
            return true;
        }
        if self.off_topic.is_match(utterance) {
            return false;
        }
        self.educational.is_match(utterance)
    }
}

fn compile(patterns: &[String]) -> Result<RegexSet, ConfigError> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .map_err(ConfigError::BadPattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ScopeFilter {
        ScopeFilter::new(&ScopeRules::university_defaults()).unwrap()
    }

    #[test]
    fn domain_terms_are_in_scope() {
        let f = filter();
        assert!(f.in_scope("What is the tuition at LIU?"));
        assert!(f.in_scope("how do I reach the registrar"));
        assert!(f.in_scope("Scholarship deadlines?"));
    }

    #[test]
    fn off_topic_terms_are_rejected() {
        let f = filter();
        assert!(!f.in_scope("What's the weather today?"));
        assert!(!f.in_scope("tell me a joke"));
        assert!(!f.in_scope("who won the basketball game"));
    }

    #[test]
    fn domain_wins_over_off_topic() {
        // Both tiers fire; precedence keeps it in scope.
        let f = filter();
        assert!(f.in_scope("Is tuition refunded if classes are cancelled for weather?"));
    }

    #[test]
    fn educational_fallback_applies_after_negatives() {
        let f = filter();
        assert!(f.in_scope("How hard is a master degree?"));
        assert!(f.in_scope("tips for studying"));
    }

    #[test]
    fn unknown_input_defaults_to_out_of_scope() {
        let f = filter();
        assert!(!f.in_scope("where can I buy a couch"));
        assert!(!f.in_scope(""));
    }

    #[test]
    fn matching_is_idempotent() {
        let f = filter();
        for utterance in ["tuition?", "weather?", "couch?"] {
            assert_eq!(f.in_scope(utterance), f.in_scope(utterance));
        }
    }

    #[test]
    fn bad_patterns_fail_compilation() {
        let rules = ScopeRules {
            domain: vec!["(".into()],
            off_topic: vec![],
            educational: vec![],
        };
        assert!(matches!(
            ScopeFilter::new(&rules),
            Err(ConfigError::BadPattern(_))
        ));
    }
}
