// Walkthrough: seed a knowledge base, train, triage, and feed back outcomes.
//
// Run with: cargo run --example triage

use anyhow::Result;
use rxengine::{
    synthetic_training_data, ExtractedIssue, IssueCategory, IssueContext, RemediationEngine,
    Solution,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let engine = RemediationEngine::new();

    // Seed a few remediations the way a deployment would import them.
    engine.add_solution(
        Solution::new(
            "sol_timeout_cfg",
            "config_change",
            "Increase test timeout value in the station configuration",
        )
        .with_category(IssueCategory::Timeout)
        .with_outcome_counts(5, 1),
    )?;
    engine.add_solution(
        Solution::new(
            "sol_contact_force",
            "parameter_update",
            "Increase contact force to resolve intermittent contact failure",
        )
        .with_category(IssueCategory::ContactFailure)
        .with_modules(["CONTACT_TEST"]),
    )?;
    engine.add_solution(
        Solution::new(
            "sol_recompile",
            "code_fix",
            "Add the missing header include and rebuild the test program",
        )
        .with_category(IssueCategory::CompilationError),
    )?;

    // Bootstrap the ensemble from the synthetic corpus.
    let report = engine.train(&synthetic_training_data(), 0.2)?;
    println!(
        "trained on {} examples, ensemble accuracy {:.1}%",
        report.training_examples,
        report.ensemble_accuracy * 100.0
    );

    // Triage a freshly extracted issue.
    let issue = ExtractedIssue::new("Contact failure detected on pin 7 during continuity test")
        .with_context(IssueContext::for_module("CONTACT_TEST"));
    let (classification, recommendation) = engine.triage(&issue, 3, 0.0)?;
    println!(
        "classified as {} ({:.1}% confidence)",
        classification.category,
        classification.confidence * 100.0
    );
    for scored in &recommendation.solutions {
        println!(
            "  candidate {} score {:.2}: {}",
            scored.solution.id, scored.score, scored.solution.description
        );
    }

    // The operator applied the top recommendation and it worked.
    if let Some(top) = recommendation.top() {
        engine.record_outcome(&top.solution.id, &issue.text, true, Some(&issue.context))?;
    }

    let stats = engine.statistics()?;
    println!(
        "knowledge base: {} solutions, {:.0}% overall success over {} applications",
        stats.total_solutions,
        stats.success_rate * 100.0,
        stats.total_applications
    );

    Ok(())
}
