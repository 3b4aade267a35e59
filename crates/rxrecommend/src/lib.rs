//! rxrecommend - Solution Recommendation
//!
//! Persistent knowledge base of remediations with similarity-ranked
//! recommendation and outcome feedback. Ranking combines text similarity
//! against solution descriptions with each solution's historical track
//! record.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Knowledge base storage, history, and persistence.
pub mod knowledge;
/// Candidate scoring and ranked recommendation.
pub mod recommender;
/// Solution records and derived confidence.
pub mod solution;

pub use knowledge::{FitState, HistoryEntry, KnowledgeBase, KnowledgeError};
pub use recommender::{
    RecommendationResult, ScoredSolution, ScoringConfig, SolutionRecommender, Statistics,
};
pub use solution::Solution;

/// Recommendation library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
