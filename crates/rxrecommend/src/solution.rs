// Solution records and their confidence bookkeeping

use chrono::{DateTime, Utc};
use rxclassify::IssueCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight of the success rate in the derived confidence score.
pub const CONFIDENCE_SUCCESS_WEIGHT: f32 = 0.7;

/// Weight of the application-volume term in the derived confidence score.
pub const CONFIDENCE_VOLUME_WEIGHT: f32 = 0.3;

/// Applications at which the volume term saturates.
pub const CONFIDENCE_VOLUME_SATURATION: f32 = 10.0;

/// A remediation stored in the knowledge base.
///
/// The description is the primary text used for similarity matching; the
/// structured change payloads are opaque to the pipeline and only carried
/// for whoever applies the remediation. `confidence_score` is derived from
/// the outcome counters and can only change through `record_outcome` (or
/// verbatim via knowledge-base deserialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Unique identifier.
    #[serde(rename = "solution_id")]
    pub id: String,

    /// Kind of remediation: code_fix, config_change, parameter_update, ...
    pub solution_type: String,

    /// Human description, used for similarity matching.
    pub description: String,

    /// Opaque code edit payloads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_changes: Vec<BTreeMap<String, String>>,

    /// Opaque configuration edit payloads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_changes: Vec<BTreeMap<String, String>>,

    /// Opaque parameter edit payloads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_changes: Vec<BTreeMap<String, serde_json::Value>>,

    /// Category this solution addresses; `None` means any.
    #[serde(default)]
    pub category: Option<IssueCategory>,

    /// Module allow-list; empty means universally applicable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub module_applicability: Vec<String>,

    /// Baseline-version allow-list; empty means universally applicable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub baseline_versions: Vec<String>,

    #[serde(default)]
    success_count: u32,

    #[serde(default)]
    failure_count: u32,

    #[serde(default)]
    confidence_score: f32,

    /// When the solution was added to the knowledge base.
    pub created_date: DateTime<Utc>,

    #[serde(default)]
    last_applied: Option<DateTime<Utc>>,

    last_updated: DateTime<Utc>,
}

impl Solution {
    /// Create a new solution with zeroed outcome counters.
    pub fn new(
        id: impl Into<String>,
        solution_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            solution_type: solution_type.into(),
            description: description.into(),
            code_changes: Vec::new(),
            config_changes: Vec::new(),
            parameter_changes: Vec::new(),
            category: None,
            module_applicability: Vec::new(),
            baseline_versions: Vec::new(),
            success_count: 0,
            failure_count: 0,
            confidence_score: 0.0,
            created_date: now,
            last_applied: None,
            last_updated: now,
        }
    }

    /// Restrict this solution to one issue category.
    pub fn with_category(mut self, category: IssueCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict this solution to the given modules.
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_applicability = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict this solution to the given baseline versions.
    pub fn with_baselines<I, S>(mut self, baselines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline_versions = baselines.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an opaque code change payload.
    pub fn with_code_change(mut self, change: BTreeMap<String, String>) -> Self {
        self.code_changes.push(change);
        self
    }

    /// Attach an opaque config change payload.
    pub fn with_config_change(mut self, change: BTreeMap<String, String>) -> Self {
        self.config_changes.push(change);
        self
    }

    /// Attach an opaque parameter change payload.
    pub fn with_parameter_change(mut self, change: BTreeMap<String, serde_json::Value>) -> Self {
        self.parameter_changes.push(change);
        self
    }

    /// Seed outcome counters, recomputing the derived confidence score.
    ///
    /// Used when importing pre-existing track records; `last_applied` stays
    /// unset because no application time is known.
    pub fn with_outcome_counts(mut self, success: u32, failure: u32) -> Self {
        self.success_count = success;
        self.failure_count = failure;
        if success + failure > 0 {
            self.recompute_confidence();
        }
        self
    }

    /// Successful applications recorded so far.
    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Failed applications recorded so far.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Total recorded applications.
    pub fn total_applications(&self) -> u32 {
        self.success_count + self.failure_count
    }

    /// Fraction of applications that succeeded; 0 when never applied.
    pub fn success_rate(&self) -> f32 {
        let total = self.total_applications();
        if total > 0 {
            self.success_count as f32 / total as f32
        } else {
            0.0
        }
    }

    /// Derived reliability estimate in [0, 1].
    pub fn confidence_score(&self) -> f32 {
        self.confidence_score
    }

    /// When this solution was last applied, if ever.
    pub fn last_applied(&self) -> Option<DateTime<Utc>> {
        self.last_applied
    }

    /// When this record last changed.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Record one application outcome and refresh the confidence score.
    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        let now = Utc::now();
        self.last_applied = Some(now);
        self.last_updated = now;
        self.recompute_confidence();
    }

    /// `confidence = 0.7 * success_rate + 0.3 * min(1, applications / 10)`:
    /// the success rate dominates, but a solution needs repeated use before
    /// volume alone can push confidence toward 1.
    fn recompute_confidence(&mut self) {
        let volume = (self.total_applications() as f32 / CONFIDENCE_VOLUME_SATURATION).min(1.0);
        self.confidence_score =
            CONFIDENCE_SUCCESS_WEIGHT * self.success_rate() + CONFIDENCE_VOLUME_WEIGHT * volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_solution_has_zero_confidence() {
        let solution = Solution::new("sol_001", "code_fix", "Add missing include");
        assert_eq!(solution.success_count(), 0);
        assert_eq!(solution.confidence_score(), 0.0);
        assert!(solution.last_applied().is_none());
    }

    #[test]
    fn test_success_increments_and_raises_confidence() {
        let mut solution = Solution::new("sol_001", "code_fix", "Add missing include");
        solution.record_outcome(true);
        assert_eq!(solution.success_count(), 1);
        assert_eq!(solution.failure_count(), 0);
        // 0.7 * 1.0 + 0.3 * 0.1
        assert!((solution.confidence_score() - 0.73).abs() < 1e-6);
        assert!(solution.last_applied().is_some());
    }

    #[test]
    fn test_confidence_needs_volume_to_saturate() {
        let mut solution = Solution::new("sol_001", "code_fix", "Fix");
        for _ in 0..10 {
            solution.record_outcome(true);
        }
        assert!((solution.confidence_score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_failures_drag_confidence_down() {
        let mut solution = Solution::new("sol_001", "code_fix", "Fix");
        solution.record_outcome(true);
        let after_success = solution.confidence_score();
        solution.record_outcome(false);
        assert!(solution.confidence_score() < after_success);
        assert_eq!(solution.total_applications(), 2);
        assert!((solution.success_rate() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_outcome_counts_builder_recomputes_confidence() {
        let solution =
            Solution::new("sol_001", "parameter_update", "Increase contact force")
                .with_outcome_counts(5, 0);
        // 0.7 * 1.0 + 0.3 * 0.5
        assert!((solution.confidence_score() - 0.85).abs() < 1e-6);
        assert!(solution.last_applied().is_none());
    }

    #[test]
    fn test_serde_round_trip_preserves_confidence_verbatim() {
        let solution = Solution::new("sol_001", "config_change", "Raise timeout")
            .with_category(IssueCategory::Timeout)
            .with_outcome_counts(3, 1);
        let json = serde_json::to_string(&solution).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, solution.id);
        assert_eq!(back.success_count(), 3);
        assert_eq!(back.failure_count(), 1);
        assert_eq!(back.confidence_score(), solution.confidence_score());
        assert_eq!(back.category, Some(IssueCategory::Timeout));
    }
}
