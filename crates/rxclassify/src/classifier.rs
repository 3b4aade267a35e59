// Ensemble issue classifier

use crate::category::IssueCategory;
use crate::context::IssueContext;
use crate::model::{fuse, CategoryModel, EnsembleWeights, NaiveBayesModel, SoftmaxModel};
use crate::rules::RuleClassifier;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use rxvector::{TfidfVectorizer, VectorConfig, VectorError};

/// Minimum number of labeled examples accepted by `train`.
pub const MIN_TRAINING_EXAMPLES: usize = 10;

/// Seed for the train/validation split; fixed so training is reproducible.
const SPLIT_SEED: u64 = 42;

/// Result of classifying one issue text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning category.
    pub category: IssueCategory,

    /// Confidence in [0, 1]; capped at 0.8 on the rule path.
    pub confidence: f32,

    /// Human-readable summary of how the category was chosen.
    pub explanation: String,

    /// Highest-contributing features (vocabulary terms or matched keywords).
    pub top_features: Vec<String>,

    /// Runner-up categories with their confidence.
    pub alternatives: Vec<(IssueCategory, f32)>,
}

/// Per-label validation metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelMetrics {
    /// The label these metrics describe.
    pub label: IssueCategory,

    /// Number of validation examples with this label.
    pub support: usize,

    /// Precision of the fused ensemble on this label.
    pub precision: f32,

    /// Recall of the fused ensemble on this label.
    pub recall: f32,
}

/// Metrics returned by a successful `train` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Examples used for fitting.
    pub training_examples: usize,

    /// Examples held out for validation.
    pub validation_examples: usize,

    /// Validation accuracy of the softmax member alone.
    pub primary_accuracy: f32,

    /// Validation accuracy of the naive-Bayes member alone.
    pub secondary_accuracy: f32,

    /// Validation accuracy of the fused ensemble.
    pub ensemble_accuracy: f32,

    /// Fitted vocabulary size.
    pub feature_count: usize,

    /// Number of distinct labels seen.
    pub class_count: usize,

    /// False when small label groups forced a plain random split.
    pub stratified: bool,

    /// When training completed.
    pub trained_at: DateTime<Utc>,

    /// Per-label precision/recall of the fused ensemble.
    pub per_label: Vec<LabelMetrics>,
}

/// Everything needed to classify with the ML path; serialized as one blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrainedState {
    vectorizer: TfidfVectorizer,
    primary: SoftmaxModel,
    secondary: NaiveBayesModel,
    labels: Vec<IssueCategory>,
    trained_at: DateTime<Utc>,
}

/// Ensemble classifier for regression issue text.
///
/// Untrained, it falls back to the deterministic keyword rules; trained, it
/// fuses a softmax model and a naive-Bayes model over shared TF-IDF features.
/// Training failures never disturb an existing trained state.
#[derive(Debug, Clone)]
pub struct IssueClassifier {
    rules: RuleClassifier,
    vector_config: VectorConfig,
    weights: EnsembleWeights,
    state: Option<TrainedState>,
}

impl Default for IssueClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueClassifier {
    /// Create an untrained classifier with default configuration.
    pub fn new() -> Self {
        Self::with_config(VectorConfig::classifier(), EnsembleWeights::default())
    }

    /// Create an untrained classifier with explicit vector and fusion config.
    pub fn with_config(vector_config: VectorConfig, weights: EnsembleWeights) -> Self {
        Self {
            rules: RuleClassifier::new(),
            vector_config,
            weights,
            state: None,
        }
    }

    /// Whether a trained model is active.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Timestamp of the last successful training, if any.
    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|state| state.trained_at)
    }

    /// Labels the active model was trained on.
    pub fn trained_labels(&self) -> &[IssueCategory] {
        self.state.as_ref().map_or(&[], |state| &state.labels)
    }

    /// Classify an issue text, with optional parser context.
    ///
    /// Total over all inputs: blank text yields `Unknown` with confidence 0,
    /// and the rule fallback covers the untrained state.
    pub fn classify(&self, text: &str, context: Option<&IssueContext>) -> ClassificationResult {
        if text.trim().is_empty() {
            return ClassificationResult {
                category: IssueCategory::Unknown,
                confidence: 0.0,
                explanation: "Empty error message".to_string(),
                top_features: Vec::new(),
                alternatives: Vec::new(),
            };
        }

        match &self.state {
            Some(state) => self.ml_classify(state, text, context),
            None => self.rules.classify(text),
        }
    }

    fn ml_classify(
        &self,
        state: &TrainedState,
        text: &str,
        context: Option<&IssueContext>,
    ) -> ClassificationResult {
        let features_text = Self::feature_text(text, context);
        let vector = state.vectorizer.transform(&features_text);

        let primary = state.primary.predict_proba(&vector);
        let secondary = state.secondary.predict_proba(&vector);
        let fused = fuse(&primary, &secondary, self.weights);

        let mut order: Vec<usize> = (0..fused.len()).collect();
        order.sort_by(|a, b| fused[*b].partial_cmp(&fused[*a]).unwrap_or(std::cmp::Ordering::Equal));

        let top_index = order[0];
        let confidence = fused[top_index];
        let alternatives: Vec<(IssueCategory, f32)> = order[1..]
            .iter()
            .take(3)
            .map(|&index| (state.labels[index], fused[index]))
            .collect();

        let top_features = Self::top_features(state, &vector);
        let explanation = format!(
            "Ensemble model classified with {:.1}% confidence based on features: {}",
            confidence * 100.0,
            top_features
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );

        ClassificationResult {
            category: state.labels[top_index],
            confidence,
            explanation,
            top_features,
            alternatives,
        }
    }

    /// Rank vocabulary terms by `dimension value x primary model importance`.
    fn top_features(state: &TrainedState, vector: &[f32]) -> Vec<String> {
        let importance = state.primary.feature_importance();
        let mut contributions: Vec<(usize, f32)> = vector
            .iter()
            .zip(importance.iter())
            .enumerate()
            .map(|(index, (value, weight))| (index, value * weight))
            .filter(|(_, contribution)| *contribution > 0.0)
            .collect();
        contributions
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        contributions
            .into_iter()
            .take(5)
            .map(|(index, _)| state.vectorizer.feature_names()[index].clone())
            .collect()
    }

    fn feature_text(text: &str, context: Option<&IssueContext>) -> String {
        let mut features = text.to_string();
        if let Some(context) = context {
            context.append_feature_tokens(&mut features);
        }
        features
    }

    /// Train both ensemble members on labeled examples.
    ///
    /// Splits off `validation_fraction` of the examples (stratified by label
    /// when every label has at least two members), fits the vectorizer and
    /// both models on the training partition only, and reports per-model and
    /// fused validation accuracy. On any failure the previous trained or
    /// untrained state is left untouched.
    pub fn train(
        &mut self,
        examples: &[(String, IssueCategory)],
        validation_fraction: f32,
    ) -> Result<TrainingReport, ClassifierError> {
        if examples.len() < MIN_TRAINING_EXAMPLES {
            return Err(ClassifierError::InsufficientExamples {
                got: examples.len(),
                min: MIN_TRAINING_EXAMPLES,
            });
        }
        if !(0.0..1.0).contains(&validation_fraction) || validation_fraction == 0.0 {
            return Err(ClassifierError::InvalidValidationFraction(validation_fraction));
        }

        tracing::info!(examples = examples.len(), "training issue classifier");

        // Stable label set: sorted, deduplicated; index = class id.
        let mut labels: Vec<IssueCategory> = examples.iter().map(|(_, label)| *label).collect();
        labels.sort_unstable();
        labels.dedup();
        let label_index: BTreeMap<IssueCategory, usize> = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (*label, index))
            .collect();

        let (train_indices, validation_indices, stratified) =
            split_examples(examples, validation_fraction);
        if !stratified {
            tracing::warn!("label groups too small for stratification, using random split");
        }

        let train_texts: Vec<&str> = train_indices
            .iter()
            .map(|&index| examples[index].0.as_str())
            .collect();

        let mut vectorizer = TfidfVectorizer::new(self.vector_config.clone());
        vectorizer.fit(&train_texts)?;

        let train_x: Vec<Vec<f32>> = train_texts
            .iter()
            .map(|text| vectorizer.transform(text))
            .collect();
        let train_y: Vec<usize> = train_indices
            .iter()
            .map(|&index| label_index[&examples[index].1])
            .collect();

        let mut primary = SoftmaxModel::new();
        primary.fit(&train_x, &train_y, labels.len());
        let mut secondary = NaiveBayesModel::new();
        secondary.fit(&train_x, &train_y, labels.len());

        let validation_x: Vec<Vec<f32>> = validation_indices
            .iter()
            .map(|&index| vectorizer.transform(&examples[index].0))
            .collect();
        let validation_y: Vec<usize> = validation_indices
            .iter()
            .map(|&index| label_index[&examples[index].1])
            .collect();

        let predict_argmax = |probs: &[f32]| -> usize {
            probs
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(index, _)| index)
                .unwrap_or(0)
        };

        let mut primary_correct = 0;
        let mut secondary_correct = 0;
        let mut ensemble_correct = 0;
        let mut ensemble_predictions = Vec::with_capacity(validation_x.len());
        for (vector, &truth) in validation_x.iter().zip(validation_y.iter()) {
            let p = primary.predict_proba(vector);
            let s = secondary.predict_proba(vector);
            let fused = fuse(&p, &s, self.weights);

            if predict_argmax(&p) == truth {
                primary_correct += 1;
            }
            if predict_argmax(&s) == truth {
                secondary_correct += 1;
            }
            let prediction = predict_argmax(&fused);
            if prediction == truth {
                ensemble_correct += 1;
            }
            ensemble_predictions.push(prediction);
        }

        let validation_total = validation_y.len().max(1) as f32;
        let per_label = label_metrics(&labels, &validation_y, &ensemble_predictions);
        let trained_at = Utc::now();

        let report = TrainingReport {
            training_examples: train_indices.len(),
            validation_examples: validation_y.len(),
            primary_accuracy: primary_correct as f32 / validation_total,
            secondary_accuracy: secondary_correct as f32 / validation_total,
            ensemble_accuracy: ensemble_correct as f32 / validation_total,
            feature_count: vectorizer.dimension(),
            class_count: labels.len(),
            stratified,
            trained_at,
            per_label,
        };

        self.state = Some(TrainedState {
            vectorizer,
            primary,
            secondary,
            labels,
            trained_at,
        });

        tracing::info!(
            ensemble_accuracy = report.ensemble_accuracy,
            classes = report.class_count,
            "classifier training completed"
        );
        Ok(report)
    }

    /// Serialize the trained state to a file as an opaque blob.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassifierError> {
        let state = self.state.as_ref().ok_or(ClassifierError::NotTrained)?;
        let blob = serde_json::to_vec(state)?;
        std::fs::write(path.as_ref(), blob)?;
        tracing::info!(path = %path.as_ref().display(), "classifier model saved");
        Ok(())
    }

    /// Restore a trained state saved by `save`; sets the trained flag.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ClassifierError> {
        let blob = std::fs::read(path.as_ref())?;
        let state: TrainedState = serde_json::from_slice(&blob)?;
        tracing::info!(
            path = %path.as_ref().display(),
            classes = state.labels.len(),
            "classifier model loaded"
        );
        self.state = Some(state);
        Ok(())
    }
}

/// Split example indices into (train, validation, stratified-flag).
fn split_examples(
    examples: &[(String, IssueCategory)],
    validation_fraction: f32,
) -> (Vec<usize>, Vec<usize>, bool) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);

    let mut groups: BTreeMap<IssueCategory, Vec<usize>> = BTreeMap::new();
    for (index, (_, label)) in examples.iter().enumerate() {
        groups.entry(*label).or_default().push(index);
    }

    let stratifiable = groups.values().all(|group| group.len() >= 2);
    let mut train = Vec::new();
    let mut validation = Vec::new();

    if stratifiable {
        for group in groups.values_mut() {
            group.shuffle(&mut rng);
            let n_validation = ((group.len() as f32 * validation_fraction).round() as usize)
                .clamp(1, group.len() - 1);
            validation.extend_from_slice(&group[..n_validation]);
            train.extend_from_slice(&group[n_validation..]);
        }
    } else {
        let mut indices: Vec<usize> = (0..examples.len()).collect();
        indices.shuffle(&mut rng);
        let n_validation = ((examples.len() as f32 * validation_fraction).round() as usize)
            .clamp(1, examples.len() - 1);
        validation.extend_from_slice(&indices[..n_validation]);
        train.extend_from_slice(&indices[n_validation..]);
    }

    (train, validation, stratifiable)
}

/// Per-label precision/recall of predictions against truth (class indices).
fn label_metrics(
    labels: &[IssueCategory],
    truth: &[usize],
    predictions: &[usize],
) -> Vec<LabelMetrics> {
    labels
        .iter()
        .enumerate()
        .map(|(class, label)| {
            let mut tp = 0_usize;
            let mut fp = 0_usize;
            let mut fn_ = 0_usize;
            for (&t, &p) in truth.iter().zip(predictions.iter()) {
                if p == class && t == class {
                    tp += 1;
                } else if p == class {
                    fp += 1;
                } else if t == class {
                    fn_ += 1;
                }
            }
            let support = tp + fn_;
            LabelMetrics {
                label: *label,
                support,
                precision: if tp + fp > 0 {
                    tp as f32 / (tp + fp) as f32
                } else {
                    0.0
                },
                recall: if support > 0 {
                    tp as f32 / support as f32
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Classification errors
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Fewer labeled examples than the training minimum.
    #[error("need at least {min} training examples, got {got}")]
    InsufficientExamples {
        /// Examples supplied.
        got: usize,
        /// Minimum required.
        min: usize,
    },

    /// Validation fraction outside (0, 1).
    #[error("validation fraction must be in (0, 1), got {0}")]
    InvalidValidationFraction(f32),

    /// Save requested with no trained model.
    #[error("model must be trained before saving")]
    NotTrained,

    /// Vector engine failure during training.
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// Model blob I/O failure.
    #[error("model persistence failed: {0}")]
    Io(#[from] std::io::Error),

    /// Model blob was malformed.
    #[error("model blob is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_training_set() -> Vec<(String, IssueCategory)> {
        vec![
            ("Compilation error: undefined symbol".into(), IssueCategory::CompilationError),
            ("Compiler error in module build".into(), IssueCategory::CompilationError),
            ("Compilation failed for test program".into(), IssueCategory::CompilationError),
            ("Compilation terminated with errors".into(), IssueCategory::CompilationError),
            ("Contact failure detected on pin 5".into(), IssueCategory::ContactFailure),
            ("Open contact detected during test".into(), IssueCategory::ContactFailure),
            ("Contact resistance out of specification".into(), IssueCategory::ContactFailure),
            ("Pin contact force insufficient".into(), IssueCategory::ContactFailure),
            ("Test execution timeout after 300 seconds".into(), IssueCategory::Timeout),
            ("Operation timed out waiting for response".into(), IssueCategory::Timeout),
            ("Connection timeout while accessing device".into(), IssueCategory::Timeout),
            ("Timeout error: test did not complete".into(), IssueCategory::Timeout),
        ]
    }

    #[test]
    fn test_untrained_uses_rule_path() {
        let classifier = IssueClassifier::new();
        assert!(!classifier.is_trained());
        let result = classifier.classify("Contact failure detected on pin 5", None);
        assert_eq!(result.category, IssueCategory::ContactFailure);
        assert!(result.confidence <= 0.8);
    }

    #[test]
    fn test_empty_text_is_unknown_with_zero_confidence() {
        let classifier = IssueClassifier::new();
        let result = classifier.classify("   ", None);
        assert_eq!(result.category, IssueCategory::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_train_requires_minimum_examples() {
        let mut classifier = IssueClassifier::new();
        let examples = small_training_set()[..4].to_vec();
        let err = classifier.train(&examples, 0.2).unwrap_err();
        assert!(matches!(err, ClassifierError::InsufficientExamples { got: 4, .. }));
        assert!(!classifier.is_trained());
    }

    #[test]
    fn test_train_rejects_bad_validation_fraction() {
        let mut classifier = IssueClassifier::new();
        let examples = small_training_set();
        assert!(matches!(
            classifier.train(&examples, 0.0),
            Err(ClassifierError::InvalidValidationFraction(_))
        ));
        assert!(matches!(
            classifier.train(&examples, 1.0),
            Err(ClassifierError::InvalidValidationFraction(_))
        ));
    }

    #[test]
    fn test_trained_classifier_uses_ensemble_path() {
        let mut classifier = IssueClassifier::new();
        let report = classifier.train(&small_training_set(), 0.25).unwrap();
        assert!(classifier.is_trained());
        assert!(report.stratified);
        assert_eq!(report.class_count, 3);

        let result = classifier.classify("Contact failure on probe pin", None);
        assert_eq!(result.category, IssueCategory::ContactFailure);
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
        assert!(result.alternatives.len() <= 3);
        assert!(result.explanation.starts_with("Ensemble model"));
    }

    #[test]
    fn test_failed_train_keeps_previous_state() {
        let mut classifier = IssueClassifier::new();
        classifier.train(&small_training_set(), 0.25).unwrap();
        let trained_at = classifier.trained_at();

        let err = classifier.train(&small_training_set()[..3].to_vec(), 0.25);
        assert!(err.is_err());
        assert!(classifier.is_trained());
        assert_eq!(classifier.trained_at(), trained_at);
    }

    #[test]
    fn test_random_split_fallback_is_flagged() {
        let mut examples = small_training_set();
        // A singleton label cannot be stratified.
        examples.push(("Calibration drift detected".into(), IssueCategory::CalibrationError));
        let mut classifier = IssueClassifier::new();
        let report = classifier.train(&examples, 0.25).unwrap();
        assert!(!report.stratified);
    }

    #[test]
    fn test_save_untrained_is_error() {
        let classifier = IssueClassifier::new();
        let dir = tempfile::tempdir().unwrap();
        let err = classifier.save(dir.path().join("model.json")).unwrap_err();
        assert!(matches!(err, ClassifierError::NotTrained));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut classifier = IssueClassifier::new();
        classifier.train(&small_training_set(), 0.25).unwrap();
        classifier.save(&path).unwrap();

        let mut restored = IssueClassifier::new();
        assert!(!restored.is_trained());
        restored.load(&path).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.trained_labels(), classifier.trained_labels());

        let result = restored.classify("Contact resistance out of specification", None);
        assert_eq!(result.category, IssueCategory::ContactFailure);
    }

    #[test]
    fn test_load_malformed_blob_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not a model").unwrap();
        let mut classifier = IssueClassifier::new();
        assert!(matches!(
            classifier.load(&path),
            Err(ClassifierError::Malformed(_))
        ));
        assert!(!classifier.is_trained());
    }
}
