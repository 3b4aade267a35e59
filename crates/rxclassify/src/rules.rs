// Rule-based keyword classification fallback

use crate::category::IssueCategory;
use crate::classifier::ClassificationResult;

/// Keyword patterns per category, in priority order.
///
/// Matching is case-insensitive substring containment. Declaration order
/// breaks ties: when two categories match with equal strength, the earlier
/// entry wins. Patterns are curated from recurring tester log phrasing.
static KEYWORD_RULES: &[(IssueCategory, &[&str])] = &[
    (
        IssueCategory::CompilationError,
        &[
            "compilation error",
            "compile error",
            "compilation failed",
            "compiler error",
            "build error",
            "make error",
        ],
    ),
    (
        IssueCategory::SyntaxError,
        &[
            "syntax error",
            "parse error",
            "unexpected token",
            "missing semicolon",
            "undeclared identifier",
        ],
    ),
    (
        IssueCategory::LinkingError,
        &[
            "link error",
            "linking failed",
            "undefined reference",
            "cannot find symbol",
            "linker error",
        ],
    ),
    (
        IssueCategory::Timeout,
        &[
            "timeout",
            "time out",
            "timed out",
            "execution timeout",
            "test timeout",
            "connection timeout",
        ],
    ),
    (
        IssueCategory::ContactFailure,
        &[
            "contact failure",
            "contact error",
            "pin contact",
            "contact resistance",
            "open contact",
            "short contact",
        ],
    ),
    (
        IssueCategory::MeasurementError,
        &[
            "measurement error",
            "measurement failed",
            "invalid measurement",
            "measurement timeout",
            "measurement overflow",
        ],
    ),
    (
        IssueCategory::CalibrationError,
        &[
            "calibration error",
            "calibration failed",
            "cal error",
            "calibration timeout",
            "calibration drift",
        ],
    ),
    (
        IssueCategory::DeviceError,
        &[
            "device error",
            "device not found",
            "device failure",
            "device timeout",
            "device communication error",
        ],
    ),
    (
        IssueCategory::ResourceError,
        &[
            "resource error",
            "out of memory",
            "memory error",
            "disk space",
            "resource not available",
        ],
    ),
    (
        IssueCategory::FileError,
        &[
            "file not found",
            "file error",
            "cannot open file",
            "file permission",
            "file corrupted",
        ],
    ),
    (
        IssueCategory::PermissionError,
        &[
            "permission denied",
            "access denied",
            "insufficient privileges",
            "permission error",
            "authorization failed",
        ],
    ),
    (
        IssueCategory::BuildFailure,
        &["build failed", "build target failed", "build failure"],
    ),
    (
        IssueCategory::RuntimeError,
        &[
            "runtime error",
            "runtime exception",
            "segmentation fault",
            "null pointer",
        ],
    ),
    (
        IssueCategory::InitializationError,
        &[
            "initialization failed",
            "init error",
            "failed to initialize",
        ],
    ),
    (
        IssueCategory::ConfigError,
        &[
            "config error",
            "configuration error",
            "configuration file corrupted",
            "invalid configuration",
        ],
    ),
    (
        IssueCategory::ParameterError,
        &[
            "parameter error",
            "invalid parameter",
            "parameter out of range",
        ],
    ),
    (
        IssueCategory::EnvironmentError,
        &[
            "environment variable not set",
            "environment error",
            "missing environment",
        ],
    ),
    (
        IssueCategory::DataCorruption,
        &["data corruption", "corrupted data", "checksum mismatch"],
    ),
];

/// Confidence cap for the rule path; keyword matching never reaches full
/// certainty.
pub const RULE_CONFIDENCE_CAP: f32 = 0.8;

/// Keyword matches needed to reach the confidence cap.
pub const FULL_CONFIDENCE_MATCHES: f32 = 3.0;

/// The keyword rule table, in priority order.
pub fn keyword_rules() -> &'static [(IssueCategory, &'static [&'static str])] {
    KEYWORD_RULES
}

/// Deterministic keyword classifier used before any model is trained.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    /// Create a rule classifier over the built-in keyword table.
    pub fn new() -> Self {
        Self
    }

    /// Classify text by counting keyword matches per category.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lowered = text.to_lowercase();

        let mut scores: Vec<(IssueCategory, usize)> = Vec::new();
        let mut matched_keywords: Vec<String> = Vec::new();

        for (category, keywords) in KEYWORD_RULES {
            let mut score = 0;
            for keyword in *keywords {
                if lowered.contains(keyword) {
                    score += 1;
                    matched_keywords.push((*keyword).to_string());
                }
            }
            if score > 0 {
                scores.push((*category, score));
            }
        }

        if scores.is_empty() {
            return ClassificationResult {
                category: IssueCategory::Unknown,
                confidence: 0.1,
                explanation: "No matching patterns found".to_string(),
                top_features: Vec::new(),
                alternatives: Vec::new(),
            };
        }

        // Highest match count wins; the table's priority order breaks ties
        // because only a strictly greater score displaces the leader.
        let mut top = scores[0];
        for entry in &scores[1..] {
            if entry.1 > top.1 {
                top = *entry;
            }
        }

        let mut ranked = scores.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let alternatives: Vec<(IssueCategory, f32)> = ranked
            .iter()
            .filter(|(category, _)| *category != top.0)
            .take(3)
            .map(|(category, score)| (*category, Self::confidence(*score)))
            .collect();

        let explanation = format!(
            "Rule-based classification found {} keyword matches: {}",
            top.1,
            matched_keywords
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );

        ClassificationResult {
            category: top.0,
            confidence: Self::confidence(top.1),
            explanation,
            top_features: matched_keywords.into_iter().take(5).collect(),
            alternatives,
        }
    }

    fn confidence(matches: usize) -> f32 {
        (matches as f32 / FULL_CONFIDENCE_MATCHES).min(RULE_CONFIDENCE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Contact failure detected on pin 5", IssueCategory::ContactFailure)]
    #[case("Compilation error: undefined symbol", IssueCategory::CompilationError)]
    #[case("Test execution timeout after 300 seconds", IssueCategory::Timeout)]
    #[case("File not found: test_data.dat", IssueCategory::FileError)]
    #[case("Permission denied while opening device", IssueCategory::PermissionError)]
    #[case("Calibration drift detected on instrument", IssueCategory::CalibrationError)]
    fn test_keyword_classification(#[case] text: &str, #[case] expected: IssueCategory) {
        let result = RuleClassifier::new().classify(text);
        assert_eq!(result.category, expected, "text: {text}");
        assert!(result.confidence <= RULE_CONFIDENCE_CAP);
    }

    #[test]
    fn test_contact_failure_scenario_reports_keyword() {
        let result = RuleClassifier::new().classify("Contact failure detected on pin 5");
        assert_eq!(result.category, IssueCategory::ContactFailure);
        assert!(result.confidence <= 0.8);
        assert!(result.top_features.iter().any(|f| f == "contact failure"));
    }

    #[test]
    fn test_confidence_scales_with_matches_and_caps() {
        // One match out of three needed for the cap.
        let one = RuleClassifier::new().classify("timeout");
        assert!((one.confidence - 1.0 / 3.0).abs() < 1e-6);

        // Three or more matches saturate at the cap.
        let many = RuleClassifier::new().classify("timeout: test timed out, connection time out");
        assert_eq!(many.category, IssueCategory::Timeout);
        assert!((many.confidence - RULE_CONFIDENCE_CAP).abs() < 1e-6);
    }

    #[test]
    fn test_no_match_yields_unknown() {
        let result = RuleClassifier::new().classify("all tests passed nominally");
        assert_eq!(result.category, IssueCategory::Unknown);
        assert!((result.confidence - 0.1).abs() < 1e-6);
        assert!(result.top_features.is_empty());
    }

    #[test]
    fn test_ties_prefer_earlier_table_entry() {
        // "file permission" matches FileError, "permission denied" matches
        // PermissionError; one match each, FileError is declared first.
        let result = RuleClassifier::new().classify("file permission: permission denied");
        assert_eq!(result.category, IssueCategory::FileError);
    }

    #[test]
    fn test_alternatives_exclude_winner() {
        let result =
            RuleClassifier::new().classify("measurement timeout during calibration error check");
        assert!(result
            .alternatives
            .iter()
            .all(|(category, _)| *category != result.category));
        assert!(result.alternatives.len() <= 3);
    }
}
