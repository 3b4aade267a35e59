// Knowledge base storage and persistence

use crate::solution::Solution;
use chrono::{DateTime, Utc};
use rxclassify::IssueContext;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Freshness of the derived vector vocabulary with respect to the base.
///
/// Every mutation flips the state to `Stale`; only a single serialized refit
/// moves it back to `Fresh`. Readers may act on a stale-but-valid vocabulary,
/// they just never see a half-rebuilt one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    /// The fitted vocabulary reflects the current contents.
    Fresh,
    /// A mutation happened since the last fit.
    Stale,
}

/// One recorded application outcome, kept to enrich future vector fits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The solution that was applied.
    pub solution_id: String,

    /// The issue text the solution was applied against.
    pub issue_text: String,

    /// Whether the application fixed the issue.
    pub success: bool,

    /// When the outcome was recorded.
    pub timestamp: DateTime<Utc>,

    /// Context the issue carried, if any.
    #[serde(default)]
    pub context: IssueContext,
}

/// The set of known solutions plus their application history.
///
/// Solutions are unique by id and keep insertion order, which is the
/// tie-break order during ranking. The history log is append-only.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    solutions: Vec<Solution>,
    index: HashMap<String, usize>,
    history: Vec<HistoryEntry>,
    fit_state: Option<FitState>,
}

/// On-disk document layout for the knowledge base.
#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeBaseFile {
    solutions: BTreeMap<String, Solution>,
    solution_history: Vec<HistoryEntry>,
    saved_at: DateTime<Utc>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether no solutions are stored.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// All solutions, in insertion order.
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Look up a solution by id.
    pub fn get(&self, id: &str) -> Option<&Solution> {
        self.index.get(id).map(|&slot| &self.solutions[slot])
    }

    /// The append-only outcome history.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Current freshness of the derived vocabulary; `None` before any fit.
    pub fn fit_state(&self) -> Option<FitState> {
        self.fit_state
    }

    /// Whether the vocabulary must be refit before similarity scoring.
    pub fn needs_refit(&self) -> bool {
        !self.solutions.is_empty() && self.fit_state != Some(FitState::Fresh)
    }

    /// Mark the vocabulary fresh; called only from inside a refit.
    pub(crate) fn mark_fresh(&mut self) {
        self.fit_state = Some(FitState::Fresh);
    }

    /// Add a solution, replacing any existing one with the same id.
    pub fn add_solution(&mut self, solution: Solution) {
        tracing::info!(id = %solution.id, description = %solution.description, "added solution");
        match self.index.get(&solution.id) {
            Some(&slot) => self.solutions[slot] = solution,
            None => {
                self.index.insert(solution.id.clone(), self.solutions.len());
                self.solutions.push(solution);
            }
        }
        self.fit_state = Some(FitState::Stale);
    }

    /// Record an application outcome against a solution.
    ///
    /// Unknown ids are logged and ignored; nothing else changes. Known ids
    /// update the solution's counters, append to the history, and invalidate
    /// the fitted vocabulary.
    pub fn record_outcome(
        &mut self,
        solution_id: &str,
        issue_text: &str,
        success: bool,
        context: Option<&IssueContext>,
    ) -> bool {
        let Some(&slot) = self.index.get(solution_id) else {
            tracing::warn!(id = %solution_id, "outcome for unknown solution id ignored");
            return false;
        };

        self.solutions[slot].record_outcome(success);
        self.history.push(HistoryEntry {
            solution_id: solution_id.to_string(),
            issue_text: issue_text.to_string(),
            success,
            timestamp: Utc::now(),
            context: context.cloned().unwrap_or_default(),
        });
        self.fit_state = Some(FitState::Stale);

        tracing::info!(id = %solution_id, success, "recorded solution outcome");
        true
    }

    /// Texts the shared vectorizer is fitted over: every solution
    /// description plus every historical issue text.
    pub fn corpus(&self) -> Vec<&str> {
        self.solutions
            .iter()
            .map(|solution| solution.description.as_str())
            .chain(self.history.iter().map(|entry| entry.issue_text.as_str()))
            .collect()
    }

    /// Persist the knowledge base as a structured JSON document.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), KnowledgeError> {
        let file = KnowledgeBaseFile {
            solutions: self
                .solutions
                .iter()
                .map(|solution| (solution.id.clone(), solution.clone()))
                .collect(),
            solution_history: self.history.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&file)?;
        std::fs::write(path.as_ref(), json)?;
        tracing::info!(path = %path.as_ref().display(), solutions = self.len(), "knowledge base saved");
        Ok(())
    }

    /// Load a knowledge base saved by `save`.
    ///
    /// Confidence scores come back verbatim from the file, and the history
    /// log is repopulated before any refit. A missing or malformed file is
    /// an error: silently starting empty would hide history loss.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let bytes = std::fs::read(path.as_ref())?;
        let file: KnowledgeBaseFile = serde_json::from_slice(&bytes)?;

        let mut base = Self::new();
        for (_, solution) in file.solutions {
            base.index.insert(solution.id.clone(), base.solutions.len());
            base.solutions.push(solution);
        }
        base.history = file.solution_history;
        base.fit_state = if base.solutions.is_empty() {
            None
        } else {
            Some(FitState::Stale)
        };

        tracing::info!(
            path = %path.as_ref().display(),
            solutions = base.len(),
            history = base.history.len(),
            "knowledge base loaded"
        );
        Ok(base)
    }
}

/// Knowledge base persistence errors
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// The file could not be read or written.
    #[error("knowledge base I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not a valid knowledge-base document.
    #[error("knowledge base file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxclassify::IssueCategory;

    fn sample_base() -> KnowledgeBase {
        let mut base = KnowledgeBase::new();
        base.add_solution(
            Solution::new("sol_001", "code_fix", "Add missing header include")
                .with_category(IssueCategory::CompilationError),
        );
        base.add_solution(
            Solution::new("sol_002", "parameter_update", "Increase contact force")
                .with_category(IssueCategory::ContactFailure)
                .with_outcome_counts(8, 0),
        );
        base
    }

    #[test]
    fn test_add_solution_marks_stale_and_indexes() {
        let base = sample_base();
        assert_eq!(base.len(), 2);
        assert_eq!(base.fit_state(), Some(FitState::Stale));
        assert!(base.get("sol_001").is_some());
        assert!(base.get("missing").is_none());
    }

    #[test]
    fn test_re_adding_id_replaces_in_place() {
        let mut base = sample_base();
        base.add_solution(Solution::new("sol_001", "config_change", "Different fix"));
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("sol_001").unwrap().solution_type, "config_change");
        // Insertion order is preserved for the replaced entry.
        assert_eq!(base.solutions()[0].id, "sol_001");
    }

    #[test]
    fn test_record_outcome_updates_history_and_counters() {
        let mut base = sample_base();
        base.mark_fresh();
        assert!(base.record_outcome("sol_001", "compilation failed", true, None));
        assert_eq!(base.history().len(), 1);
        assert_eq!(base.get("sol_001").unwrap().success_count(), 1);
        assert_eq!(base.fit_state(), Some(FitState::Stale));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut base = sample_base();
        let before: Vec<u32> = base.solutions().iter().map(|s| s.success_count()).collect();
        assert!(!base.record_outcome("missing", "some issue", true, None));
        let after: Vec<u32> = base.solutions().iter().map(|s| s.success_count()).collect();
        assert_eq!(before, after);
        assert!(base.history().is_empty());
    }

    #[test]
    fn test_corpus_includes_descriptions_and_history() {
        let mut base = sample_base();
        base.record_outcome("sol_002", "contact failure on pin 3", true, None);
        let corpus = base.corpus();
        assert!(corpus.contains(&"Add missing header include"));
        assert!(corpus.contains(&"contact failure on pin 3"));
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");

        let mut base = sample_base();
        base.record_outcome("sol_002", "contact failure detected", false, None);
        base.save(&path).unwrap();

        let loaded = KnowledgeBase::load(&path).unwrap();
        assert_eq!(loaded.len(), base.len());
        assert_eq!(loaded.history().len(), 1);
        let original = base.get("sol_002").unwrap();
        let restored = loaded.get("sol_002").unwrap();
        assert_eq!(restored.success_count(), original.success_count());
        assert_eq!(restored.failure_count(), original.failure_count());
        assert_eq!(restored.confidence_score(), original.confidence_score());
        assert!(loaded.needs_refit());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = KnowledgeBase::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(KnowledgeError::Io(_))));
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            KnowledgeBase::load(&path),
            Err(KnowledgeError::Malformed(_))
        ));
    }
}
