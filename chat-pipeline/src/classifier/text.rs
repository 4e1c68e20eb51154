//! Utterance normalization: tokenize, lower-case, lemmatize.
//!
//! The vocabulary artifact is produced by this same normalizer, so the
//! encoder and the vocabulary can never disagree on token forms.
//!
//! The lemmatizer is a small rule-based noun normalizer (plural endings with
//! an exception list). It intentionally covers only the inflections that
//! show up in short campus questions; frequency information is discarded
//! upstream anyway because the encoding is binary.

/// Tokens that end in `s` but are not plurals; stripping them would split
/// the token away from the vocabulary entry.
const KEEP_AS_IS: &[&str] = &[
    "as", "bus", "campus", "class", "does", "gpa", "has", "is", "its", "plus", "status",
    "syllabus", "this", "thus", "us", "was", "yes",
];

/// Splits an utterance on non-alphanumeric boundaries and lower-cases each
/// token. Punctuation never reaches the vocabulary.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Reduces one lower-cased token to its lemma.
pub fn lemmatize(token: &str) -> String {
    if KEEP_AS_IS.contains(&token) {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() > 1 {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "ches", "shes", "zes"] {
        if let Some(stem) = token.strip_suffix("es") {
            if token.ends_with(suffix) {
                return stem.to_string();
            }
        }
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix('s') {
        if stem.len() > 2 {
            return stem.to_string();
        }
    }
    token.to_string()
}

/// Full normalization: tokenize, then lemmatize each token.
pub fn normalize(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|t| lemmatize(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("What is the tuition, at LIU?"),
            ["what", "is", "the", "tuition", "at", "liu"]
        );
        assert_eq!(tokenize("!!!"), Vec::<String>::new());
    }

    #[test]
    fn lemmatize_handles_common_plurals() {
        assert_eq!(lemmatize("universities"), "university");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("courses"), "course");
        assert_eq!(lemmatize("fees"), "fee");
        assert_eq!(lemmatize("boxes"), "box");
    }

    #[test]
    fn lemmatize_keeps_exceptions_intact() {
        assert_eq!(lemmatize("campus"), "campus");
        assert_eq!(lemmatize("this"), "this");
        assert_eq!(lemmatize("is"), "is");
        assert_eq!(lemmatize("thesis"), "thesis");
        assert_eq!(lemmatize("gas"), "gas");
    }

    #[test]
    fn normalize_composes_both_steps() {
        assert_eq!(
            normalize("Scholarships for universities?"),
            ["scholarship", "for", "university"]
        );
    }
}
