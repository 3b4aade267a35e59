// Engine configuration

use rxclassify::EnsembleWeights;
use rxrecommend::ScoringConfig;
use rxvector::VectorConfig;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the whole engine.
///
/// The default mirrors the production tuning; deployments override single
/// fields rather than rebuilding the struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ensemble fusion weights for the classifier.
    pub ensemble: EnsembleWeights,

    /// Ranking constants for the recommender.
    pub scoring: ScoringConfig,

    /// Vector space for classification features.
    pub classifier_vector: VectorConfig,

    /// Vector space for solution similarity.
    pub recommender_vector: VectorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ensemble: EnsembleWeights::default(),
            scoring: ScoringConfig::default(),
            classifier_vector: VectorConfig::classifier(),
            recommender_vector: VectorConfig::recommender(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vector_spaces_differ() {
        let config = EngineConfig::default();
        assert_ne!(
            config.classifier_vector.max_features,
            config.recommender_vector.max_features
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scoring.recency_window_days, config.scoring.recency_window_days);
        assert_eq!(back.classifier_vector.max_features, config.classifier_vector.max_features);
    }
}
