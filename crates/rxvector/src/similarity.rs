// Cosine similarity metric

/// Cosine similarity between two term vectors, clamped to [0, 1].
///
/// TF-IDF vectors are non-negative so the raw metric already lands in
/// [0, 1]; the clamp guards against floating point drift and zero vectors.
/// Mismatched lengths or zero-norm inputs score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfidf::{TfidfVectorizer, VectorConfig};

    #[test]
    fn test_identical_vectors_score_one() {
        let a = vec![1.0, 0.0, 2.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_length_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_similar_texts_score_higher_than_unrelated() {
        let mut vectorizer = TfidfVectorizer::new(VectorConfig::recommender());
        vectorizer
            .fit(&[
                "contact failure detected on pin",
                "increase contact force to resolve contact failure",
                "timeout waiting for device response",
            ])
            .unwrap();

        let query = vectorizer.transform("contact failure on probe pin");
        let close = vectorizer.transform("contact failure detected on pin");
        let far = vectorizer.transform("timeout waiting for device response");

        let close_score = cosine_similarity(&query, &close);
        let far_score = cosine_similarity(&query, &far);
        assert!(close_score > far_score);
        assert!((0.0..=1.0).contains(&close_score));
        assert!((0.0..=1.0).contains(&far_score));
    }
}
