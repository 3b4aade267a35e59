// Synthetic training corpus

use crate::category::IssueCategory;

/// Labeled synthetic examples for bootstrapping the ensemble.
///
/// Covers every concrete category of the taxonomy with phrasing drawn from
/// real tester log messages, so a fresh deployment can train a usable model
/// before any field data has been collected.
pub fn synthetic_training_data() -> Vec<(String, IssueCategory)> {
    let examples: &[(&str, IssueCategory)] = &[
        // Compilation errors
        ("Compilation error: undefined symbol 'test_function'", IssueCategory::CompilationError),
        ("Build failed: compiler error in module.cpp", IssueCategory::CompilationError),
        ("Error: compilation terminated due to errors", IssueCategory::CompilationError),
        ("Compiler cannot find header file", IssueCategory::CompilationError),
        // Syntax errors
        ("Syntax error: expected ';' before token", IssueCategory::SyntaxError),
        ("Parse error: unexpected end of file", IssueCategory::SyntaxError),
        ("Error: missing closing brace in function", IssueCategory::SyntaxError),
        // Linking errors
        ("Linker error: undefined reference to main", IssueCategory::LinkingError),
        ("Link failed: cannot find library", IssueCategory::LinkingError),
        ("Undefined reference to external function", IssueCategory::LinkingError),
        // Build failures
        ("Make error: build target failed", IssueCategory::BuildFailure),
        ("Build failure: dependency resolution failed", IssueCategory::BuildFailure),
        ("Build aborted: missing makefile rule", IssueCategory::BuildFailure),
        // Timeouts
        ("Test execution timeout after 300 seconds", IssueCategory::Timeout),
        ("Connection timeout while accessing device", IssueCategory::Timeout),
        ("Timeout error: test did not complete", IssueCategory::Timeout),
        ("Operation timed out waiting for response", IssueCategory::Timeout),
        // Resource errors
        ("Out of memory during test execution", IssueCategory::ResourceError),
        ("Disk space insufficient for log files", IssueCategory::ResourceError),
        ("Resource allocation failed", IssueCategory::ResourceError),
        ("CPU usage exceeded limits", IssueCategory::ResourceError),
        // Runtime errors
        ("Runtime error: null pointer exception", IssueCategory::RuntimeError),
        ("Runtime exception during test", IssueCategory::RuntimeError),
        ("Segmentation fault in test code", IssueCategory::RuntimeError),
        // Initialization errors
        ("Initialization failed: tester session not ready", IssueCategory::InitializationError),
        ("Failed to initialize instrument driver", IssueCategory::InitializationError),
        ("Init error: setup sequence aborted", IssueCategory::InitializationError),
        // Contact failures
        ("Contact failure detected on pin 5", IssueCategory::ContactFailure),
        ("Pin contact resistance out of specification", IssueCategory::ContactFailure),
        ("Open contact detected during test", IssueCategory::ContactFailure),
        ("Short circuit on contact pin 12", IssueCategory::ContactFailure),
        ("Contact force insufficient on probe", IssueCategory::ContactFailure),
        // Measurement errors
        ("Measurement error: value out of range", IssueCategory::MeasurementError),
        ("Invalid measurement result from ADC", IssueCategory::MeasurementError),
        ("Measurement timeout during voltage test", IssueCategory::MeasurementError),
        ("Measurement overflow in current test", IssueCategory::MeasurementError),
        // Calibration errors
        ("Calibration drift detected", IssueCategory::CalibrationError),
        ("Calibration failed for instrument", IssueCategory::CalibrationError),
        ("Calibration timeout occurred", IssueCategory::CalibrationError),
        // Device errors
        ("Device not responding to commands", IssueCategory::DeviceError),
        ("Device communication error", IssueCategory::DeviceError),
        ("Device initialization failed", IssueCategory::DeviceError),
        ("Device hardware malfunction detected", IssueCategory::DeviceError),
        // Configuration errors
        ("Configuration file corrupted", IssueCategory::ConfigError),
        ("Invalid configuration section in testflow", IssueCategory::ConfigError),
        ("Config error: conflicting settings detected", IssueCategory::ConfigError),
        // Parameter errors
        ("Invalid parameter value in config", IssueCategory::ParameterError),
        ("Parameter out of range for level setup", IssueCategory::ParameterError),
        ("Parameter error: unknown test parameter", IssueCategory::ParameterError),
        // Environment errors
        ("Environment variable not set", IssueCategory::EnvironmentError),
        ("Environment error: workspace path missing", IssueCategory::EnvironmentError),
        ("Missing environment setup for smartest session", IssueCategory::EnvironmentError),
        // File errors
        ("File not found: test_data.dat", IssueCategory::FileError),
        ("Cannot open configuration file", IssueCategory::FileError),
        ("File corrupted during transfer", IssueCategory::FileError),
        ("Invalid file format detected", IssueCategory::FileError),
        // Data corruption
        ("Data corruption detected in result buffer", IssueCategory::DataCorruption),
        ("Checksum mismatch in datalog stream", IssueCategory::DataCorruption),
        ("Corrupted data block in waveform capture", IssueCategory::DataCorruption),
        // Permission errors
        ("File permission denied", IssueCategory::PermissionError),
        ("Access denied to device", IssueCategory::PermissionError),
        ("Insufficient privileges for operation", IssueCategory::PermissionError),
    ];

    examples
        .iter()
        .map(|(text, category)| ((*text).to_string(), *category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_corpus_is_large_enough_to_train() {
        assert!(synthetic_training_data().len() >= 60);
    }

    #[test]
    fn test_corpus_spans_all_concrete_categories() {
        let covered: BTreeSet<IssueCategory> = synthetic_training_data()
            .into_iter()
            .map(|(_, category)| category)
            .collect();
        for category in IssueCategory::ALL {
            if matches!(category, IssueCategory::Unknown | IssueCategory::Other) {
                continue;
            }
            assert!(covered.contains(&category), "missing {category}");
        }
    }

    #[test]
    fn test_every_label_is_stratifiable() {
        let mut counts = std::collections::BTreeMap::new();
        for (_, category) in synthetic_training_data() {
            *counts.entry(category).or_insert(0_usize) += 1;
        }
        assert!(counts.values().all(|count| *count >= 2));
    }
}
