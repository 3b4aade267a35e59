// Engine-level error taxonomy

use rxclassify::ClassifierError;
use rxrecommend::KnowledgeError;

/// Errors surfaced by the remediation engine.
///
/// Degraded-but-valid situations (untrained classifier, unfitted vocabulary,
/// empty knowledge base) are not errors; they produce structured results with
/// explanations. Errors are reserved for rejected input and failed
/// persistence or training.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request failed validation and was not processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Classifier training or model persistence failed.
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Knowledge base persistence failed.
    #[error("knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// A component lock was poisoned by a panicking writer.
    #[error("internal lock poisoned: {0}")]
    LockPoisoned(String),
}
