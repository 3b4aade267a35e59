//! rxclassify - Issue Classification
//!
//! Ensemble text classification of tester failure descriptions into a fixed
//! taxonomy, with a deterministic keyword fallback for the untrained state.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// The closed issue taxonomy.
pub mod category;
/// Ensemble classifier, training, and model persistence.
pub mod classifier;
/// Parser-supplied issue context.
pub mod context;
/// The two ensemble member models and their fusion.
pub mod model;
/// Keyword-based classification fallback.
pub mod rules;
/// Synthetic bootstrap training corpus.
pub mod training;

pub use category::IssueCategory;
pub use classifier::{
    ClassificationResult, ClassifierError, IssueClassifier, LabelMetrics, TrainingReport,
    MIN_TRAINING_EXAMPLES,
};
pub use context::IssueContext;
pub use model::{CategoryModel, EnsembleWeights, NaiveBayesModel, SoftmaxModel};
pub use rules::{RuleClassifier, RULE_CONFIDENCE_CAP};
pub use training::synthetic_training_data;

/// Classification library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
