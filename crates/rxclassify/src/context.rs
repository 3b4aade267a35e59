// Issue context passed alongside free text

use serde::{Deserialize, Serialize};

/// Optional context attached to an issue by the upstream log parser.
///
/// Only `module_name` and `baseline_version` participate in recommendation
/// filtering; all three fields are folded into the classifier's feature text
/// as prefixed tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueContext {
    /// Test module the failure was observed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// Baseline (test program) version under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_version: Option<String>,

    /// Kind of file the text was extracted from (log, datalog, build output).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl IssueContext {
    /// Context with only a module name.
    pub fn for_module(module_name: impl Into<String>) -> Self {
        Self {
            module_name: Some(module_name.into()),
            ..Self::default()
        }
    }

    /// Append this context's fields to a feature text as prefixed tokens.
    pub(crate) fn append_feature_tokens(&self, features: &mut String) {
        if let Some(module) = &self.module_name {
            features.push_str(&format!(" module_{module}"));
        }
        if let Some(baseline) = &self.baseline_version {
            features.push_str(&format!(" baseline_{baseline}"));
        }
        if let Some(file_type) = &self.file_type {
            features.push_str(&format!(" filetype_{file_type}"));
        }
    }
}
