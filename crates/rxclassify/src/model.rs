// Ensemble member models

use serde::{Deserialize, Serialize};

/// Uniform prediction contract for ensemble members: a fitted model maps a
/// text vector to a probability distribution over the trained label set.
pub trait CategoryModel {
    /// Probability per class index, summing to 1 for any fitted model.
    fn predict_proba(&self, vector: &[f32]) -> Vec<f32>;
}

/// Fusion weights for combining the two ensemble members.
///
/// Fixed operational constants, not learned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsembleWeights {
    /// Weight of the softmax (primary) member.
    pub primary: f32,

    /// Weight of the naive-Bayes (secondary) member.
    pub secondary: f32,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            primary: 0.7,
            secondary: 0.3,
        }
    }
}

/// Fuse two member distributions with the given weights.
pub fn fuse(primary: &[f32], secondary: &[f32], weights: EnsembleWeights) -> Vec<f32> {
    primary
        .iter()
        .zip(secondary.iter())
        .map(|(p, s)| weights.primary * p + weights.secondary * s)
        .collect()
}

/// Multiclass softmax regression, the primary ensemble member.
///
/// Trained by full-batch gradient descent with L2 regularization. Weights
/// start at zero so training is deterministic; per-feature importance for
/// explanations is the mean absolute weight across classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxModel {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    epochs: usize,
    learning_rate: f32,
    l2_penalty: f32,
}

impl Default for SoftmaxModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftmaxModel {
    /// Create an unfitted model with default training hyperparameters.
    pub fn new() -> Self {
        Self {
            weights: Vec::new(),
            bias: Vec::new(),
            epochs: 150,
            learning_rate: 0.5,
            l2_penalty: 1e-3,
        }
    }

    /// Fit on row vectors `x` with class indices `y` in `0..n_classes`.
    pub fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) {
        let n_features = x.first().map_or(0, Vec::len);
        self.weights = vec![vec![0.0; n_features]; n_classes];
        self.bias = vec![0.0; n_classes];

        if x.is_empty() || n_features == 0 {
            return;
        }
        let n_samples = x.len() as f32;

        for _ in 0..self.epochs {
            let mut weight_grad = vec![vec![0.0_f32; n_features]; n_classes];
            let mut bias_grad = vec![0.0_f32; n_classes];

            for (row, &label) in x.iter().zip(y.iter()) {
                let probs = self.predict_proba(row);
                for class in 0..n_classes {
                    let error = probs[class] - if class == label { 1.0 } else { 0.0 };
                    bias_grad[class] += error;
                    for (feature, value) in row.iter().enumerate() {
                        if *value != 0.0 {
                            weight_grad[class][feature] += error * value;
                        }
                    }
                }
            }

            for class in 0..n_classes {
                self.bias[class] -= self.learning_rate * bias_grad[class] / n_samples;
                for feature in 0..n_features {
                    let grad = weight_grad[class][feature] / n_samples
                        + self.l2_penalty * self.weights[class][feature];
                    self.weights[class][feature] -= self.learning_rate * grad;
                }
            }
        }
    }

    /// Mean absolute weight per feature, used to rank explanation features.
    pub fn feature_importance(&self) -> Vec<f32> {
        let n_features = self.weights.first().map_or(0, Vec::len);
        let mut importance = vec![0.0_f32; n_features];
        for class_weights in &self.weights {
            for (feature, weight) in class_weights.iter().enumerate() {
                importance[feature] += weight.abs();
            }
        }
        if !self.weights.is_empty() {
            let classes = self.weights.len() as f32;
            for value in &mut importance {
                *value /= classes;
            }
        }
        importance
    }
}

impl CategoryModel for SoftmaxModel {
    fn predict_proba(&self, vector: &[f32]) -> Vec<f32> {
        if self.weights.is_empty() {
            return Vec::new();
        }

        let mut logits: Vec<f32> = self
            .weights
            .iter()
            .zip(self.bias.iter())
            .map(|(class_weights, bias)| {
                let dot: f32 = class_weights
                    .iter()
                    .zip(vector.iter())
                    .map(|(w, v)| w * v)
                    .sum();
                dot + bias
            })
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for logit in &mut logits {
            *logit = (*logit - max).exp();
            sum += *logit;
        }
        for logit in &mut logits {
            *logit /= sum;
        }
        logits
    }
}

/// Multinomial naive Bayes, the secondary ensemble member.
///
/// Laplace-smoothed; operates on the non-negative TF-IDF weights directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    class_log_prior: Vec<f32>,
    feature_log_prob: Vec<Vec<f32>>,
    alpha: f32,
}

impl Default for NaiveBayesModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesModel {
    /// Create an unfitted model with Laplace smoothing (alpha = 1).
    pub fn new() -> Self {
        Self {
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
            alpha: 1.0,
        }
    }

    /// Fit on row vectors `x` with class indices `y` in `0..n_classes`.
    pub fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) {
        let n_features = x.first().map_or(0, Vec::len);
        let mut class_counts = vec![0.0_f32; n_classes];
        let mut feature_counts = vec![vec![0.0_f32; n_features]; n_classes];

        for (row, &label) in x.iter().zip(y.iter()) {
            class_counts[label] += 1.0;
            for (feature, value) in row.iter().enumerate() {
                feature_counts[label][feature] += value;
            }
        }

        let total = x.len().max(1) as f32;
        self.class_log_prior = class_counts
            .iter()
            .map(|count| ((count + 1e-10) / total).ln())
            .collect();

        self.feature_log_prob = feature_counts
            .iter()
            .map(|counts| {
                let class_total: f32 = counts.iter().sum::<f32>() + self.alpha * n_features as f32;
                counts
                    .iter()
                    .map(|count| ((count + self.alpha) / class_total).ln())
                    .collect()
            })
            .collect();
    }
}

impl CategoryModel for NaiveBayesModel {
    fn predict_proba(&self, vector: &[f32]) -> Vec<f32> {
        if self.feature_log_prob.is_empty() {
            return Vec::new();
        }

        let mut log_joint: Vec<f32> = self
            .class_log_prior
            .iter()
            .zip(self.feature_log_prob.iter())
            .map(|(prior, log_probs)| {
                let likelihood: f32 = log_probs
                    .iter()
                    .zip(vector.iter())
                    .map(|(lp, v)| lp * v)
                    .sum();
                prior + likelihood
            })
            .collect();

        let max = log_joint.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for value in &mut log_joint {
            *value = (*value - max).exp();
            sum += *value;
        }
        for value in &mut log_joint {
            *value /= sum;
        }
        log_joint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f32>>, Vec<usize>) {
        // Two well-separated classes on two features.
        let x = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.8, 0.0],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
            vec![0.0, 0.8],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_softmax_learns_separable_classes() {
        let (x, y) = toy_data();
        let mut model = SoftmaxModel::new();
        model.fit(&x, &y, 2);

        let class0 = model.predict_proba(&[1.0, 0.0]);
        let class1 = model.predict_proba(&[0.0, 1.0]);
        assert!(class0[0] > class0[1]);
        assert!(class1[1] > class1[0]);
    }

    #[test]
    fn test_naive_bayes_learns_separable_classes() {
        let (x, y) = toy_data();
        let mut model = NaiveBayesModel::new();
        model.fit(&x, &y, 2);

        let class0 = model.predict_proba(&[1.0, 0.0]);
        let class1 = model.predict_proba(&[0.0, 1.0]);
        assert!(class0[0] > class0[1]);
        assert!(class1[1] > class1[0]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = toy_data();
        let mut model = SoftmaxModel::new();
        model.fit(&x, &y, 2);
        let probs = model.predict_proba(&[0.5, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fusion_weights_distributions() {
        let fused = fuse(&[0.9, 0.1], &[0.5, 0.5], EnsembleWeights::default());
        assert!((fused[0] - (0.7 * 0.9 + 0.3 * 0.5)).abs() < 1e-6);
        assert!((fused[1] - (0.7 * 0.1 + 0.3 * 0.5)).abs() < 1e-6);
        let sum: f32 = fused.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_feature_importance_highlights_discriminative_features() {
        let (x, y) = toy_data();
        let mut model = SoftmaxModel::new();
        model.fit(&x, &y, 2);
        let importance = model.feature_importance();
        assert_eq!(importance.len(), 2);
        assert!(importance.iter().all(|v| *v > 0.0));
    }
}
