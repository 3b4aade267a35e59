// Similarity-ranked solution recommendation

use crate::knowledge::{KnowledgeBase, KnowledgeError};
use crate::solution::Solution;
use chrono::{DateTime, Utc};
use rxclassify::{IssueCategory, IssueContext};
use rxvector::{cosine_similarity, TfidfVectorizer, VectorConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Ranking constants.
///
/// None of these were derived analytically; they are operational tuning
/// kept as named, overridable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Similarity assumed when the vectorizer has never been fitted.
    pub default_similarity: f32,

    /// Cap on the historical-success boost (`success_rate * cap`).
    pub success_boost_cap: f32,

    /// Floor of the confidence damping factor; low-confidence solutions are
    /// damped toward this fraction of their base score, never to zero.
    pub confidence_damp_floor: f32,

    /// Maximum recency boost for a solution applied moments ago.
    pub recency_boost: f32,

    /// Days after which the recency boost fades to zero.
    pub recency_window_days: i64,

    /// Applications required before the reliability penalty applies.
    pub reliability_min_applications: u32,

    /// Success rate below which the strong penalty multiplies the score.
    pub poor_success_rate: f32,

    /// Multiplier for solutions performing below `poor_success_rate`.
    pub poor_penalty: f32,

    /// Success rate below which the mild penalty multiplies the score.
    pub mediocre_success_rate: f32,

    /// Multiplier for solutions performing below `mediocre_success_rate`.
    pub mediocre_penalty: f32,

    /// Cap on the bonus for a clear gap between the top two results.
    pub gap_bonus_cap: f32,

    /// Floor of the availability factor.
    pub availability_floor: f32,

    /// Confidence reduction per returned result.
    pub availability_step: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_similarity: 0.5,
            success_boost_cap: 0.2,
            confidence_damp_floor: 0.5,
            recency_boost: 0.1,
            recency_window_days: 30,
            reliability_min_applications: 3,
            poor_success_rate: 0.5,
            poor_penalty: 0.7,
            mediocre_success_rate: 0.7,
            mediocre_penalty: 0.9,
            gap_bonus_cap: 0.2,
            availability_floor: 0.8,
            availability_step: 0.05,
        }
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSolution {
    /// The recommended solution.
    pub solution: Solution,

    /// Final ranking score.
    pub score: f32,
}

/// Ranked recommendations for one issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Ranked solutions, best first.
    pub solutions: Vec<ScoredSolution>,

    /// The category the query was filtered by.
    pub issue_category: IssueCategory,

    /// Aggregate confidence in the recommendation set.
    pub recommendation_confidence: f32,

    /// Human-readable summary.
    pub explanation: String,

    /// The queried issue text.
    pub issue_text: String,

    /// Module filter that was in effect, if any.
    pub module_name: Option<String>,

    /// Baseline filter that was in effect, if any.
    pub baseline_version: Option<String>,

    /// When the recommendation was produced.
    pub recommended_at: DateTime<Utc>,

    /// Candidates examined before ranking.
    pub total_solutions_considered: usize,
}

impl RecommendationResult {
    /// The highest-scored recommendation, if any.
    pub fn top(&self) -> Option<&ScoredSolution> {
        self.solutions.first()
    }

    fn empty(
        category: IssueCategory,
        confidence: f32,
        explanation: String,
        issue_text: &str,
        context: Option<&IssueContext>,
        considered: usize,
    ) -> Self {
        Self {
            solutions: Vec::new(),
            issue_category: category,
            recommendation_confidence: confidence,
            explanation,
            issue_text: issue_text.to_string(),
            module_name: context.and_then(|c| c.module_name.clone()),
            baseline_version: context.and_then(|c| c.baseline_version.clone()),
            recommended_at: Utc::now(),
            total_solutions_considered: considered,
        }
    }
}

/// Knowledge base statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Solutions in the knowledge base.
    pub total_solutions: usize,

    /// Applications recorded across all solutions.
    pub total_applications: u64,

    /// Successful applications across all solutions.
    pub successful_applications: u64,

    /// Overall success rate; 0 when nothing was applied yet.
    pub success_rate: f32,

    /// Solution count per category (category-less solutions excluded).
    pub category_distribution: BTreeMap<IssueCategory, usize>,

    /// Entries in the outcome history log.
    pub history_entries: usize,

    /// Whether the similarity vocabulary is currently fitted and fresh.
    pub is_fitted: bool,
}

/// Recommends solutions for classified issues.
///
/// Owns the knowledge base and the shared description vectorizer. Candidate
/// solutions are filtered by category and context, scored by text similarity
/// plus historical-performance heuristics, and returned ranked.
#[derive(Debug, Clone)]
pub struct SolutionRecommender {
    knowledge: KnowledgeBase,
    vectorizer: TfidfVectorizer,
    scoring: ScoringConfig,
}

impl Default for SolutionRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionRecommender {
    /// Create a recommender with an empty knowledge base.
    pub fn new() -> Self {
        Self::with_config(VectorConfig::recommender(), ScoringConfig::default())
    }

    /// Create a recommender with explicit vector and scoring config.
    pub fn with_config(vector_config: VectorConfig, scoring: ScoringConfig) -> Self {
        Self {
            knowledge: KnowledgeBase::new(),
            vectorizer: TfidfVectorizer::new(vector_config),
            scoring,
        }
    }

    /// Read access to the underlying knowledge base.
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Add a solution to the knowledge base, invalidating the vocabulary.
    pub fn add_solution(&mut self, solution: Solution) {
        self.knowledge.add_solution(solution);
    }

    /// Record an applied solution's outcome (the feedback path).
    ///
    /// Unknown ids are logged and ignored, never an error. Returns whether
    /// the outcome was applied to a known solution.
    pub fn record_outcome(
        &mut self,
        solution_id: &str,
        issue_text: &str,
        success: bool,
        context: Option<&IssueContext>,
    ) -> bool {
        self.knowledge
            .record_outcome(solution_id, issue_text, success, context)
    }

    /// Whether `refit_if_stale` would rebuild the vocabulary.
    pub fn needs_refit(&self) -> bool {
        self.knowledge.needs_refit()
    }

    /// Rebuild the vocabulary over descriptions and history, if stale.
    ///
    /// Must not run concurrently with other mutations (single-writer
    /// discipline); readers keep the previous vocabulary until the swap.
    /// A corpus with no usable terms leaves the engine on the default-score
    /// path rather than failing.
    pub fn refit_if_stale(&mut self) {
        if !self.knowledge.needs_refit() {
            return;
        }
        let corpus = self.knowledge.corpus();
        match self.vectorizer.fit(&corpus) {
            Ok(()) => {
                tracing::info!(texts = corpus.len(), "refitted recommendation vocabulary");
            }
            Err(error) => {
                tracing::warn!(%error, "vocabulary refit degraded to default scoring");
            }
        }
        self.knowledge.mark_fresh();
    }

    /// Recommend up to `max_results` solutions for a classified issue.
    ///
    /// Candidates below `min_similarity` on raw text similarity are excluded
    /// before ranking. Empty knowledge bases and empty candidate sets yield
    /// structured low-confidence results, not errors.
    pub fn recommend(
        &self,
        issue_text: &str,
        category: IssueCategory,
        context: Option<&IssueContext>,
        max_results: usize,
        min_similarity: f32,
    ) -> RecommendationResult {
        if self.knowledge.is_empty() {
            return RecommendationResult::empty(
                category,
                0.0,
                "No solutions available in knowledge base".to_string(),
                issue_text,
                context,
                0,
            );
        }

        let candidates = self.candidates(category, context);
        if candidates.is_empty() {
            return RecommendationResult::empty(
                category,
                0.1,
                format!("No solutions found for category {category}"),
                issue_text,
                context,
                self.knowledge.len(),
            );
        }
        let total_considered = candidates.len();

        let mut ranked = self.score_candidates(issue_text, candidates, min_similarity);
        // Stable sort keeps candidate insertion order on equal scores.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(max_results);

        let recommendation_confidence = self.recommendation_confidence(&ranked);
        let explanation = self.explanation(&ranked, category);

        RecommendationResult {
            solutions: ranked
                .into_iter()
                .map(|(solution, score)| ScoredSolution {
                    solution: solution.clone(),
                    score,
                })
                .collect(),
            issue_category: category,
            recommendation_confidence,
            explanation,
            issue_text: issue_text.to_string(),
            module_name: context.and_then(|c| c.module_name.clone()),
            baseline_version: context.and_then(|c| c.baseline_version.clone()),
            recommended_at: Utc::now(),
            total_solutions_considered: total_considered,
        }
    }

    /// Candidate filter: category unset-or-equal, module allow-list
    /// empty-or-contains, baseline allow-list empty-or-contains.
    fn candidates(
        &self,
        category: IssueCategory,
        context: Option<&IssueContext>,
    ) -> Vec<&Solution> {
        self.knowledge
            .solutions()
            .iter()
            .filter(|solution| {
                if let Some(solution_category) = solution.category {
                    if solution_category != category {
                        return false;
                    }
                }
                if let Some(module) = context.and_then(|c| c.module_name.as_deref()) {
                    if !solution.module_applicability.is_empty()
                        && !solution.module_applicability.iter().any(|m| m == module)
                    {
                        return false;
                    }
                }
                if let Some(baseline) = context.and_then(|c| c.baseline_version.as_deref()) {
                    if !solution.baseline_versions.is_empty()
                        && !solution.baseline_versions.iter().any(|b| b == baseline)
                    {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Base similarity plus historical boosts, damping, and penalties.
    fn score_candidates<'a>(
        &self,
        issue_text: &str,
        candidates: Vec<&'a Solution>,
        min_similarity: f32,
    ) -> Vec<(&'a Solution, f32)> {
        let issue_vector = if self.vectorizer.is_fitted() {
            Some(self.vectorizer.transform(issue_text))
        } else {
            None
        };

        let mut scored = Vec::with_capacity(candidates.len());
        for solution in candidates {
            let similarity = match &issue_vector {
                Some(vector) => {
                    let description_vector = self.vectorizer.transform(&solution.description);
                    cosine_similarity(vector, &description_vector)
                }
                None => self.scoring.default_similarity,
            };
            if similarity < min_similarity {
                continue;
            }

            let mut score = similarity;

            // Historical-success boost.
            if solution.success_count() > 0 {
                score += (solution.success_rate() * self.scoring.success_boost_cap)
                    .min(self.scoring.success_boost_cap);
            }

            // Damp by derived confidence, toward half weight at zero.
            score *= self.scoring.confidence_damp_floor
                + (1.0 - self.scoring.confidence_damp_floor) * solution.confidence_score();

            // Recency boost for recently successful solutions.
            if let Some(last_applied) = solution.last_applied() {
                if solution.success_count() > 0 {
                    let days = (Utc::now() - last_applied)
                        .num_days()
                        .clamp(0, self.scoring.recency_window_days);
                    score += self.scoring.recency_boost
                        * (self.scoring.recency_window_days - days) as f32
                        / self.scoring.recency_window_days as f32;
                }
            }

            // Reliability penalty once there is enough evidence.
            if solution.total_applications() >= self.scoring.reliability_min_applications {
                let rate = solution.success_rate();
                if rate < self.scoring.poor_success_rate {
                    score *= self.scoring.poor_penalty;
                } else if rate < self.scoring.mediocre_success_rate {
                    score *= self.scoring.mediocre_penalty;
                }
            }

            tracing::debug!(id = %solution.id, similarity, score, "scored candidate");
            scored.push((solution, score));
        }
        scored
    }

    /// `min(1, (top + gap_bonus) * availability)`: a clear winner raises
    /// confidence, an undifferentiated long tail lowers it.
    fn recommendation_confidence(&self, ranked: &[(&Solution, f32)]) -> f32 {
        let Some(&(_, top_score)) = ranked.first() else {
            return 0.0;
        };
        let gap_bonus = if ranked.len() > 1 {
            (top_score - ranked[1].1).min(self.scoring.gap_bonus_cap)
        } else {
            0.0
        };
        let availability = (1.0 - ranked.len() as f32 * self.scoring.availability_step)
            .max(self.scoring.availability_floor);
        ((top_score + gap_bonus) * availability).min(1.0)
    }

    fn explanation(&self, ranked: &[(&Solution, f32)], category: IssueCategory) -> String {
        let Some(&(top, top_score)) = ranked.first() else {
            return format!("No solutions found for {category} issues");
        };

        let mut parts = vec![
            format!("Found {} potential solutions for {category}.", ranked.len()),
            format!(
                "Top recommendation: '{}' (score: {top_score:.2})",
                top.description
            ),
        ];
        if top.success_count() > 0 {
            parts.push(format!(
                "This solution has {:.1}% success rate ({} successes, {} failures)",
                top.success_rate() * 100.0,
                top.success_count(),
                top.failure_count()
            ));
        }
        parts.join(" ")
    }

    /// Knowledge base statistics for monitoring surfaces.
    pub fn statistics(&self) -> Statistics {
        let solutions = self.knowledge.solutions();
        let total_applications: u64 = solutions
            .iter()
            .map(|s| u64::from(s.total_applications()))
            .sum();
        let successful_applications: u64 =
            solutions.iter().map(|s| u64::from(s.success_count())).sum();

        let mut category_distribution = BTreeMap::new();
        for solution in solutions {
            if let Some(category) = solution.category {
                *category_distribution.entry(category).or_insert(0) += 1;
            }
        }

        Statistics {
            total_solutions: solutions.len(),
            total_applications,
            successful_applications,
            success_rate: if total_applications > 0 {
                successful_applications as f32 / total_applications as f32
            } else {
                0.0
            },
            category_distribution,
            history_entries: self.knowledge.history().len(),
            is_fitted: self.vectorizer.is_fitted() && !self.knowledge.needs_refit(),
        }
    }

    /// Persist the knowledge base to a JSON document.
    pub fn save_knowledge_base<P: AsRef<Path>>(&self, path: P) -> Result<(), KnowledgeError> {
        self.knowledge.save(path)
    }

    /// Replace the knowledge base with one loaded from disk.
    ///
    /// The vocabulary is marked stale so the next recommendation refits over
    /// the restored descriptions and history.
    pub fn load_knowledge_base<P: AsRef<Path>>(&mut self, path: P) -> Result<(), KnowledgeError> {
        self.knowledge = KnowledgeBase::load(path)?;
        Ok(())
    }
}
