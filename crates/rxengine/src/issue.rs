// Boundary types handed over by the upstream log parser

use chrono::{DateTime, Utc};
use rxclassify::IssueContext;
use serde::{Deserialize, Serialize};

/// Severity attached to an extracted issue by the upstream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational line, usually not worth remediation.
    Info,
    /// Degraded but passing.
    Warning,
    /// A failure that needs remediation.
    Error,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Error
    }
}

/// One issue extracted from a tester log.
///
/// Only `text` and `context` feed the pipeline; the remaining fields are
/// passthrough metadata for whoever consumes the recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedIssue {
    /// Free-text failure description.
    pub text: String,

    /// Line in the source log the text came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,

    /// Parser-assigned severity.
    #[serde(default)]
    pub severity: Severity,

    /// When the failure was logged, if the parser recovered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Structured context recovered alongside the text.
    #[serde(default)]
    pub context: IssueContext,
}

impl ExtractedIssue {
    /// An error-severity issue with bare text and no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            line_number: None,
            severity: Severity::default(),
            timestamp: None,
            context: IssueContext::default(),
        }
    }

    /// Attach parser context.
    pub fn with_context(mut self, context: IssueContext) -> Self {
        self.context = context;
        self
    }
}
