//! Diagnostic reporting for analysis results.
//!
//! Checks produce [`Diagnostic`] values and hand them to a
//! [`DiagnosticSink`]; rendering (terminal output, JSON, whatever the host
//! wants) happens outside the core.

use serde::Serialize;

use crate::checks::{Confidence, Severity};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub check_id: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        check_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            check_id: check_id.into(),
            severity,
            confidence: Confidence::High,
            message: message.into(),
            file: file.into(),
            line,
            column,
            suggestion: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Where diagnostics go. Append-only; once reported, a diagnostic belongs
/// to the sink.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_required_fields() {
        let diag = Diagnostic::new("chkref", Severity::Warning, "msg", "a.cpp", 3, 7);

        assert_eq!(diag.check_id, "chkref");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.confidence, Confidence::High);
        assert_eq!(diag.message, "msg");
        assert_eq!(diag.file, "a.cpp");
        assert_eq!(diag.line, 3);
        assert_eq!(diag.column, 7);
        assert!(diag.suggestion.is_none());
    }

    #[test]
    fn builders_set_optional_fields() {
        let diag = Diagnostic::new("chkref", Severity::Warning, "msg", "a.cpp", 1, 1)
            .with_confidence(Confidence::Medium)
            .with_suggestion("copy the value instead");

        assert_eq!(diag.confidence, Confidence::Medium);
        assert_eq!(diag.suggestion.as_deref(), Some("copy the value instead"));
    }

    #[test]
    fn vec_sink_appends_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::new("chkref", Severity::Warning, "first", "a.cpp", 1, 1));
        sink.report(Diagnostic::new("chkref", Severity::Warning, "second", "a.cpp", 2, 1));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].message, "first");
        assert_eq!(sink[1].message, "second");
    }
}
