// TF-IDF vectorization with n-gram support

use crate::stopwords::is_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Word token pattern: runs of word characters, minimum length two.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Configuration for the TF-IDF vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Maximum vocabulary size; the most frequent terms are kept.
    pub max_features: usize,

    /// Smallest n-gram span to extract (1 = unigrams).
    pub ngram_min: usize,

    /// Largest contiguous n-gram span to extract.
    pub ngram_max: usize,

    /// Lowercase text before tokenization.
    pub lowercase: bool,

    /// Drop English stop words before n-gram construction.
    pub filter_stop_words: bool,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            ngram_min: 1,
            ngram_max: 3,
            lowercase: true,
            filter_stop_words: true,
        }
    }
}

impl VectorConfig {
    /// Config used for classifier feature extraction (1000 features, 1-3 grams).
    pub fn classifier() -> Self {
        Self::default()
    }

    /// Config used for solution description matching (500 features, 1-2 grams).
    pub fn recommender() -> Self {
        Self {
            max_features: 500,
            ngram_max: 2,
            ..Self::default()
        }
    }
}

/// TF-IDF vectorizer over a fitted, fixed vocabulary.
///
/// `fit` learns the vocabulary and inverse-document-frequency weights from a
/// corpus; `transform` maps any text into that space. Terms unseen at fit
/// time contribute zero weight. Vectors are L2-normalized so that the dot
/// product of two transformed texts is their cosine similarity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorConfig,
    vocabulary: HashMap<String, usize>,
    feature_names: Vec<String>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer with the given config.
    pub fn new(config: VectorConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            feature_names: Vec::new(),
            idf: Vec::new(),
        }
    }

    /// Whether `fit` has produced a non-empty vocabulary.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Number of dimensions in the fitted vector space.
    pub fn dimension(&self) -> usize {
        self.feature_names.len()
    }

    /// Fitted vocabulary terms, in dimension order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Extract n-gram terms from a single text.
    pub fn extract_terms(&self, text: &str) -> Vec<String> {
        let lowered;
        let source = if self.config.lowercase {
            lowered = text.to_lowercase();
            &lowered
        } else {
            text
        };

        let tokens: Vec<&str> = TOKEN_RE
            .find_iter(source)
            .map(|m| m.as_str())
            .filter(|t| !self.config.filter_stop_words || !is_stop_word(t))
            .collect();

        let mut terms = Vec::new();
        for n in self.config.ngram_min..=self.config.ngram_max {
            if n == 0 || n > tokens.len() {
                continue;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn the vocabulary and IDF weights from a corpus.
    ///
    /// Replaces any previously fitted state. The vocabulary keeps the
    /// `max_features` most frequent terms (ties broken alphabetically) and is
    /// ordered alphabetically so fitting the same corpus twice produces the
    /// same vector space.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<(), VectorError> {
        if corpus.is_empty() {
            return Err(VectorError::EmptyCorpus);
        }

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_frequency: HashMap<String, usize> = HashMap::new();

        for text in corpus {
            let terms = self.extract_terms(text.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_frequency.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(VectorError::NoTerms);
        }

        // Keep the most frequent terms, ties alphabetical.
        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);

        let mut selected: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort_unstable();

        let n_docs = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (index, term) in selected.iter().enumerate() {
            let df = doc_frequency.get(term).copied().unwrap_or(0) as f32;
            // Smoothed IDF keeps weights finite for terms in every document.
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.clone(), index);
        }

        self.vocabulary = vocabulary;
        self.feature_names = selected;
        self.idf = idf;

        tracing::debug!(
            documents = corpus.len(),
            features = self.feature_names.len(),
            "fitted tf-idf vocabulary"
        );
        Ok(())
    }

    /// Transform a text into the fitted vector space.
    ///
    /// Before any `fit`, or when no term of the text is in the vocabulary,
    /// this returns the zero vector; callers treat that as "no similarity
    /// signal" rather than an error so cold starts stay usable.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.feature_names.len()];
        if !self.is_fitted() {
            return vector;
        }

        for term in self.extract_terms(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                vector[index] += 1.0;
            }
        }

        for (index, value) in vector.iter_mut().enumerate() {
            *value *= self.idf[index];
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    /// Fit on a corpus and transform each document in one pass.
    pub fn fit_transform<S: AsRef<str>>(
        &mut self,
        corpus: &[S],
    ) -> Result<Vec<Vec<f32>>, VectorError> {
        self.fit(corpus)?;
        Ok(corpus.iter().map(|text| self.transform(text.as_ref())).collect())
    }
}

/// Vectorization errors
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// `fit` was called with an empty corpus.
    #[error("cannot fit vectorizer on an empty corpus")]
    EmptyCorpus,

    /// The corpus produced no usable terms (e.g. all stop words).
    #[error("corpus produced no terms after tokenization")]
    NoTerms,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fitted(corpus: &[&str]) -> TfidfVectorizer {
        let mut vectorizer = TfidfVectorizer::new(VectorConfig::default());
        vectorizer.fit(corpus).unwrap();
        vectorizer
    }

    #[test]
    fn test_unfitted_transform_is_zero_vector() {
        let vectorizer = TfidfVectorizer::new(VectorConfig::default());
        assert!(!vectorizer.is_fitted());
        assert!(vectorizer.transform("contact failure on pin 5").is_empty());
    }

    #[test]
    fn test_fit_empty_corpus_is_error() {
        let mut vectorizer = TfidfVectorizer::new(VectorConfig::default());
        let corpus: Vec<&str> = Vec::new();
        assert!(matches!(vectorizer.fit(&corpus), Err(VectorError::EmptyCorpus)));
    }

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let vectorizer = fitted(&["timeout error", "contact failure", "timeout again"]);
        assert!(vectorizer.is_fitted());
        let names = vectorizer.feature_names();
        let mut sorted = names.to_vec();
        sorted.sort_unstable();
        assert_eq!(names, sorted.as_slice());
        assert!(names.iter().any(|n| n == "timeout"));
        assert!(names.iter().any(|n| n == "contact failure"));
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vectorizer = fitted(&["contact failure detected", "measurement error observed"]);
        let vector = vectorizer.transform("contact failure detected");
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unseen_terms_contribute_zero() {
        let vectorizer = fitted(&["contact failure", "timeout error"]);
        let vector = vectorizer.transform("completely unrelated words");
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_max_features_caps_vocabulary() {
        let config = VectorConfig {
            max_features: 3,
            ..VectorConfig::default()
        };
        let mut vectorizer = TfidfVectorizer::new(config);
        vectorizer
            .fit(&["alpha beta gamma delta epsilon", "alpha beta gamma"])
            .unwrap();
        assert_eq!(vectorizer.dimension(), 3);
    }

    #[test]
    fn test_stop_words_are_filtered() {
        let vectorizer = fitted(&["the test failed with the timeout"]);
        assert!(!vectorizer.feature_names().iter().any(|n| n == "the"));
        assert!(vectorizer.feature_names().iter().any(|n| n == "timeout"));
    }

    #[rstest]
    #[case("Contact FAILURE detected", "contact failure")]
    #[case("Device error: timeout", "device error")]
    fn test_ngram_extraction(#[case] text: &str, #[case] expected: &str) {
        let vectorizer = TfidfVectorizer::new(VectorConfig::default());
        let terms = vectorizer.extract_terms(text);
        assert!(terms.iter().any(|t| t == expected), "terms: {terms:?}");
    }

    #[test]
    fn test_refit_replaces_vocabulary() {
        let mut vectorizer = fitted(&["contact failure"]);
        let before = vectorizer.dimension();
        vectorizer
            .fit(&["contact failure", "measurement drift detected", "timeout"])
            .unwrap();
        assert!(vectorizer.dimension() > before);
    }
}
