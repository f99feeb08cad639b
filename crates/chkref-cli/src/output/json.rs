//! JSON output formatter for diagnostic display
//!
//! Structured output for programmatic integration; the text formatter in
//! the check command covers humans.

use chkref_core::checks::{CheckRegistry, Confidence, Severity};
use chkref_core::diagnostic::Diagnostic;
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub chkref_version: &'static str,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_diagnostics: usize,
    pub by_severity: SeverityCounts,
}

#[derive(Serialize, Default)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub hint: usize,
}

#[derive(Serialize)]
pub struct JsonDiagnostic {
    pub check_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_name: Option<String>,
    pub severity: String,
    pub confidence: String,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Serialize)]
pub struct JsonLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

pub struct JsonFormatter {
    check_names: Vec<(String, String)>,
}

impl JsonFormatter {
    pub fn with_registry(registry: &CheckRegistry) -> Self {
        let check_names = registry
            .checks()
            .map(|c| {
                let meta = c.metadata();
                (meta.id.to_string(), meta.name.to_string())
            })
            .collect();
        Self { check_names }
    }

    pub fn format(
        &self,
        diagnostics: &[Diagnostic],
        total_files: usize,
        analyzed_path: &str,
    ) -> String {
        let mut by_severity = SeverityCounts::default();
        for diag in diagnostics {
            match diag.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
                Severity::Hint => by_severity.hint += 1,
            }
        }

        let mut files_with_issues: Vec<&str> =
            diagnostics.iter().map(|d| d.file.as_str()).collect();
        files_with_issues.sort_unstable();
        files_with_issues.dedup();

        let output = JsonOutput {
            version: "1",
            metadata: JsonMetadata {
                chkref_version: env!("CARGO_PKG_VERSION"),
                analyzed_path: analyzed_path.to_string(),
            },
            summary: JsonSummary {
                total_files,
                files_with_issues: files_with_issues.len(),
                total_diagnostics: diagnostics.len(),
                by_severity,
            },
            diagnostics: diagnostics.iter().map(|d| self.to_json_diagnostic(d)).collect(),
        };

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_json_diagnostic(&self, diag: &Diagnostic) -> JsonDiagnostic {
        JsonDiagnostic {
            check_id: diag.check_id.clone(),
            check_name: self
                .check_names
                .iter()
                .find(|(id, _)| *id == diag.check_id)
                .map(|(_, name)| name.clone()),
            severity: severity_str(&diag.severity).to_string(),
            confidence: confidence_str(&diag.confidence).to_string(),
            message: diag.message.clone(),
            location: JsonLocation {
                file: diag.file.clone(),
                line: diag.line,
                column: diag.column,
            },
            suggestion: diag.suggestion.clone(),
        }
    }
}

fn severity_str(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::Hint => "hint",
    }
}

fn confidence_str(confidence: &Confidence) -> &'static str {
    match confidence {
        Confidence::High => "high",
        Confidence::Medium => "medium",
        Confidence::Low => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chkref_core::analysis::AnalysisEngine;

    fn sample_diagnostic() -> Diagnostic {
        Diagnostic::new(
            "chkref",
            Severity::Warning,
            "Lambda captures pointer: m (type int *)",
            "f2.cpp",
            3,
            14,
        )
        .with_confidence(Confidence::Medium)
        .with_suggestion("copy the pointee if the closure can outlive it")
    }

    #[test]
    fn format_produces_valid_json_with_counts() {
        let engine = AnalysisEngine::new();
        let formatter = JsonFormatter::with_registry(engine.registry());

        let rendered = formatter.format(&[sample_diagnostic()], 2, "./dumps");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed["summary"]["total_files"], 2);
        assert_eq!(parsed["summary"]["files_with_issues"], 1);
        assert_eq!(parsed["summary"]["total_diagnostics"], 1);
        assert_eq!(parsed["summary"]["by_severity"]["warning"], 1);
        assert_eq!(parsed["diagnostics"][0]["check_id"], "chkref");
        assert_eq!(parsed["diagnostics"][0]["check_name"], "lambda-captures");
        assert_eq!(parsed["diagnostics"][0]["confidence"], "medium");
        assert_eq!(parsed["diagnostics"][0]["location"]["file"], "f2.cpp");
        assert_eq!(parsed["diagnostics"][0]["location"]["line"], 3);
    }

    #[test]
    fn empty_run_still_renders_summary() {
        let engine = AnalysisEngine::new();
        let formatter = JsonFormatter::with_registry(engine.registry());

        let rendered = formatter.format(&[], 0, ".");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed["summary"]["total_diagnostics"], 0);
        assert!(parsed["diagnostics"].as_array().unwrap().is_empty());
    }
}
