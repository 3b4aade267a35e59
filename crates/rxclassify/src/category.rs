// Issue taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed taxonomy of regression issue categories.
///
/// Used both as classifier output and as the knowledge-base filter key.
/// Serialized as its snake_case string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    // Compilation and build issues
    /// Compiler reported an error.
    CompilationError,
    /// Source failed to parse.
    SyntaxError,
    /// Link step failed.
    LinkingError,
    /// Build orchestration failed outside the compiler proper.
    BuildFailure,

    // Test execution issues
    /// Test or operation exceeded its time budget.
    Timeout,
    /// Memory, disk, or other resource exhaustion.
    ResourceError,
    /// Fault while the test program was executing.
    RuntimeError,
    /// Setup or initialization failed before the test ran.
    InitializationError,

    // Tester-hardware issues
    /// Pin contact problem on the device interface board.
    ContactFailure,
    /// Measurement produced an invalid or out-of-range value.
    MeasurementError,
    /// Instrument calibration problem.
    CalibrationError,
    /// Device under test not responding or malfunctioning.
    DeviceError,

    // Configuration issues
    /// Malformed or inconsistent configuration.
    ConfigError,
    /// A parameter value is out of range or invalid.
    ParameterError,
    /// Missing or wrong environment setup.
    EnvironmentError,

    // Data and file issues
    /// File missing, unreadable, or malformed.
    FileError,
    /// Stored data failed integrity checks.
    DataCorruption,
    /// Access or privilege problem.
    PermissionError,

    // Fallbacks
    /// No category could be determined.
    Unknown,
    /// Determined but outside the taxonomy.
    Other,
}

impl IssueCategory {
    /// Every category, in declaration order.
    pub const ALL: [IssueCategory; 20] = [
        IssueCategory::CompilationError,
        IssueCategory::SyntaxError,
        IssueCategory::LinkingError,
        IssueCategory::BuildFailure,
        IssueCategory::Timeout,
        IssueCategory::ResourceError,
        IssueCategory::RuntimeError,
        IssueCategory::InitializationError,
        IssueCategory::ContactFailure,
        IssueCategory::MeasurementError,
        IssueCategory::CalibrationError,
        IssueCategory::DeviceError,
        IssueCategory::ConfigError,
        IssueCategory::ParameterError,
        IssueCategory::EnvironmentError,
        IssueCategory::FileError,
        IssueCategory::DataCorruption,
        IssueCategory::PermissionError,
        IssueCategory::Unknown,
        IssueCategory::Other,
    ];

    /// The snake_case string value of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::CompilationError => "compilation_error",
            IssueCategory::SyntaxError => "syntax_error",
            IssueCategory::LinkingError => "linking_error",
            IssueCategory::BuildFailure => "build_failure",
            IssueCategory::Timeout => "timeout",
            IssueCategory::ResourceError => "resource_error",
            IssueCategory::RuntimeError => "runtime_error",
            IssueCategory::InitializationError => "initialization_error",
            IssueCategory::ContactFailure => "contact_failure",
            IssueCategory::MeasurementError => "measurement_error",
            IssueCategory::CalibrationError => "calibration_error",
            IssueCategory::DeviceError => "device_error",
            IssueCategory::ConfigError => "config_error",
            IssueCategory::ParameterError => "parameter_error",
            IssueCategory::EnvironmentError => "environment_error",
            IssueCategory::FileError => "file_error",
            IssueCategory::DataCorruption => "data_corruption",
            IssueCategory::PermissionError => "permission_error",
            IssueCategory::Unknown => "unknown",
            IssueCategory::Other => "other",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_snake_case_value() {
        let json = serde_json::to_string(&IssueCategory::ContactFailure).unwrap();
        assert_eq!(json, "\"contact_failure\"");
        let back: IssueCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IssueCategory::ContactFailure);
    }

    #[test]
    fn test_all_matches_as_str() {
        for category in IssueCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }
}
