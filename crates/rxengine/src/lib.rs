//! rxengine - Remediation Engine
//!
//! Service facade over issue classification and solution recommendation.
//! The engine validates input at the boundary, enforces the single-writer
//! discipline on the shared classifier and recommender, and keeps the
//! recommendation vocabulary fresh across feedback.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Engine configuration.
pub mod config;
/// Engine error taxonomy.
pub mod error;
/// Log-parser boundary types.
pub mod issue;

pub use config::EngineConfig;
pub use error::EngineError;
pub use issue::{ExtractedIssue, Severity};

pub use rxclassify::{
    synthetic_training_data, ClassificationResult, EnsembleWeights, IssueCategory,
    IssueClassifier, IssueContext, TrainingReport,
};
pub use rxrecommend::{
    RecommendationResult, ScoredSolution, ScoringConfig, Solution, SolutionRecommender,
    Statistics,
};
pub use rxvector::VectorConfig;

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The classification-and-recommendation pipeline behind one service object.
///
/// Reads (`classify`, `recommend` on a fresh vocabulary, `statistics`) run
/// concurrently under read locks; every mutation serializes through a write
/// lock. `recommend` upgrades to the write lock only when the vocabulary is
/// stale.
#[derive(Debug)]
pub struct RemediationEngine {
    classifier: RwLock<IssueClassifier>,
    recommender: RwLock<SolutionRecommender>,
}

impl Default for RemediationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RemediationEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            classifier: RwLock::new(IssueClassifier::with_config(
                config.classifier_vector,
                config.ensemble,
            )),
            recommender: RwLock::new(SolutionRecommender::with_config(
                config.recommender_vector,
                config.scoring,
            )),
        }
    }

    fn read_classifier(&self) -> Result<RwLockReadGuard<'_, IssueClassifier>, EngineError> {
        self.classifier
            .read()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))
    }

    fn write_classifier(&self) -> Result<RwLockWriteGuard<'_, IssueClassifier>, EngineError> {
        self.classifier
            .write()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))
    }

    fn read_recommender(&self) -> Result<RwLockReadGuard<'_, SolutionRecommender>, EngineError> {
        self.recommender
            .read()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))
    }

    fn write_recommender(&self) -> Result<RwLockWriteGuard<'_, SolutionRecommender>, EngineError> {
        self.recommender
            .write()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))
    }

    /// Classify one failure description.
    ///
    /// Blank text is rejected before it reaches the classifier. An untrained
    /// classifier degrades to keyword rules, never an error.
    pub fn classify(
        &self,
        text: &str,
        context: Option<&IssueContext>,
    ) -> Result<ClassificationResult, EngineError> {
        validate_text(text)?;
        Ok(self.read_classifier()?.classify(text, context))
    }

    /// Classify a parser-extracted issue using its attached context.
    pub fn classify_issue(&self, issue: &ExtractedIssue) -> Result<ClassificationResult, EngineError> {
        self.classify(&issue.text, Some(&issue.context))
    }

    /// Recommend up to `top_k` solutions for a classified issue.
    ///
    /// Refits the recommendation vocabulary first if feedback or new
    /// solutions made it stale.
    pub fn recommend(
        &self,
        text: &str,
        category: IssueCategory,
        context: Option<&IssueContext>,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<RecommendationResult, EngineError> {
        validate_text(text)?;
        if top_k == 0 {
            return Err(EngineError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(EngineError::InvalidInput(format!(
                "min_similarity must be within [0, 1], got {min_similarity}"
            )));
        }

        if self.read_recommender()?.needs_refit() {
            // Re-check under the write lock; another writer may have
            // refitted while we waited.
            self.write_recommender()?.refit_if_stale();
        }

        Ok(self
            .read_recommender()?
            .recommend(text, category, context, top_k, min_similarity))
    }

    /// Classify an issue and recommend solutions for it in one call.
    pub fn triage(
        &self,
        issue: &ExtractedIssue,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<(ClassificationResult, RecommendationResult), EngineError> {
        let classification = self.classify_issue(issue)?;
        let recommendation = self.recommend(
            &issue.text,
            classification.category,
            Some(&issue.context),
            top_k,
            min_similarity,
        )?;
        Ok((classification, recommendation))
    }

    /// Add or replace a solution in the knowledge base.
    pub fn add_solution(&self, solution: Solution) -> Result<(), EngineError> {
        self.write_recommender()?.add_solution(solution);
        Ok(())
    }

    /// Record an applied solution's outcome.
    ///
    /// Returns whether the id was known; unknown ids are logged and ignored.
    pub fn record_outcome(
        &self,
        solution_id: &str,
        issue_text: &str,
        success: bool,
        context: Option<&IssueContext>,
    ) -> Result<bool, EngineError> {
        validate_text(issue_text)?;
        Ok(self
            .write_recommender()?
            .record_outcome(solution_id, issue_text, success, context))
    }

    /// Train the ensemble classifier on labeled examples.
    ///
    /// A failed training run leaves the previously trained model in place.
    pub fn train(
        &self,
        examples: &[(String, IssueCategory)],
        validation_fraction: f32,
    ) -> Result<TrainingReport, EngineError> {
        if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
            return Err(EngineError::InvalidInput(format!(
                "validation_fraction must be within (0, 1), got {validation_fraction}"
            )));
        }
        Ok(self.write_classifier()?.train(examples, validation_fraction)?)
    }

    /// Knowledge base statistics.
    pub fn statistics(&self) -> Result<Statistics, EngineError> {
        Ok(self.read_recommender()?.statistics())
    }

    /// Persist the knowledge base.
    pub fn save_knowledge_base<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        Ok(self.read_recommender()?.save_knowledge_base(path)?)
    }

    /// Replace the knowledge base with one loaded from disk.
    pub fn load_knowledge_base<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        Ok(self.write_recommender()?.load_knowledge_base(path)?)
    }

    /// Persist the trained classifier model.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        Ok(self.read_classifier()?.save(path)?)
    }

    /// Replace the classifier model with one loaded from disk.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        Ok(self.write_classifier()?.load(path)?)
    }
}

fn validate_text(text: &str) -> Result<(), EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::InvalidInput(
            "issue text must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Engine library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_rejected() {
        let engine = RemediationEngine::new();
        assert!(matches!(
            engine.classify("   ", None),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let engine = RemediationEngine::new();
        let result = engine.recommend("timeout", IssueCategory::Timeout, None, 0, 0.0);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_out_of_range_min_similarity_is_rejected() {
        let engine = RemediationEngine::new();
        for bad in [-0.1, 1.5, f32::NAN] {
            let result = engine.recommend("timeout", IssueCategory::Timeout, None, 5, bad);
            assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_invalid_validation_fraction_is_rejected() {
        let engine = RemediationEngine::new();
        for bad in [0.0, 1.0, -0.5, f32::NAN] {
            let result = engine.train(&[], bad);
            assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_untrained_engine_classifies_by_rules() {
        let engine = RemediationEngine::new();
        let result = engine
            .classify("Contact failure detected on pin 5", None)
            .unwrap();
        assert_eq!(result.category, IssueCategory::ContactFailure);
        assert!(result.confidence <= 0.8);
    }
}
