//! Check system for capture analysis.
//!
//! A [`Check`] inspects one translation unit and returns diagnostics. The
//! [`CheckRegistry`] owns the registered checks, applies configuration
//! (disabled checks, severity overrides), and runs them in registration
//! order. Registration happens through one explicit call per check; there
//! is no process-global state.

pub mod capture;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ast::{SourceLoc, TranslationUnit};
use crate::config::ChecksConfig;
use crate::diagnostic::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn level(&self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub examples: Option<&'static str>,
}

/// Raised when the front-end hands over an AST that violates its contract.
/// These abort the analysis of the unit; continuing would produce
/// meaningless diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(
        "{file}:{loc}: closure captures `this` but no enclosing class record is available"
    )]
    MissingEnclosingClass { file: String, loc: SourceLoc },
}

pub trait Check: Send + Sync {
    fn metadata(&self) -> &CheckMetadata;
    fn check(&self, unit: &TranslationUnit) -> Result<Vec<Diagnostic>, CheckError>;
}

pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
    disabled: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            disabled: HashSet::new(),
            severity_overrides: HashMap::new(),
        }
    }

    pub fn register(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn configure(&mut self, config: &ChecksConfig) {
        self.disabled.clear();
        self.severity_overrides.clear();

        for check_ref in &config.disabled {
            self.disabled.insert(check_ref.clone());
        }
        for (check_ref, severity_value) in &config.severity {
            self.severity_overrides
                .insert(check_ref.clone(), (*severity_value).into());
        }
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    /// Run every enabled check over the unit. The first contract violation
    /// aborts the run; partial results are discarded.
    pub fn run_all(&self, unit: &TranslationUnit) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for check in self.checks.iter().filter(|c| !self.is_disabled(c.as_ref())) {
            let mut produced = check.check(unit)?;
            self.apply_severity_overrides(check.as_ref(), &mut produced);
            diagnostics.append(&mut produced);
        }
        Ok(diagnostics)
    }

    fn is_disabled(&self, check: &dyn Check) -> bool {
        let metadata = check.metadata();
        self.disabled.contains(metadata.id) || self.disabled.contains(metadata.name)
    }

    fn apply_severity_overrides(&self, check: &dyn Check, diagnostics: &mut [Diagnostic]) {
        let metadata = check.metadata();
        let override_severity = self
            .severity_overrides
            .get(metadata.id)
            .or_else(|| self.severity_overrides.get(metadata.name));

        if let Some(severity) = override_severity {
            for diag in diagnostics.iter_mut() {
                diag.severity = *severity;
            }
        }
    }

    pub fn is_check_enabled(&self, id_or_name: &str) -> bool {
        match self
            .get_check(id_or_name)
            .or_else(|| self.get_check_by_name(id_or_name))
        {
            Some(check) => !self.is_disabled(check),
            None => false,
        }
    }

    pub fn get_check(&self, id: &str) -> Option<&dyn Check> {
        self.checks
            .iter()
            .find(|c| c.metadata().id == id)
            .map(|c| c.as_ref())
    }

    pub fn get_check_by_name(&self, name: &str) -> Option<&dyn Check> {
        self.checks
            .iter()
            .find(|c| c.metadata().name == name)
            .map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}
