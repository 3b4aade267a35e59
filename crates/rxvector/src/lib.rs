//! rxvector - Vector Representation Engine
//!
//! Maps free-text failure descriptions into a shared term-frequency weighted
//! vector space so that texts can be compared by cosine similarity. Shared by
//! the issue classifier and the solution recommender.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Cosine similarity over non-negative term vectors.
pub mod similarity;
/// Built-in English stop word list.
pub mod stopwords;
/// TF-IDF vectorizer with n-gram support.
pub mod tfidf;

pub use similarity::cosine_similarity;
pub use tfidf::{TfidfVectorizer, VectorConfig, VectorError};

/// Vector library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
