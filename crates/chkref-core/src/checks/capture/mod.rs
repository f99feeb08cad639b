//! Lambda-capture safety check, registered under the id `chkref`.
//!
//! Walks every closure in a translation unit, including closures nested
//! inside other closures' bodies, and flags capture patterns that commonly
//! dangle: `this`-captures, by-reference captures, and pointer captures
//! (by value, or smuggled in past an imprecise capture list).

mod classifier;
mod escape;
mod fields;

use std::collections::HashSet;
use std::ops::ControlFlow;

use tracing::trace;

use crate::ast::visit::{self, Visitor};
use crate::ast::{ClosureId, TranslationUnit};
use crate::checks::{Check, CheckError, CheckMetadata, Severity};
use crate::diagnostic::{Diagnostic, DiagnosticSink};

pub(crate) const CHECK_ID: &str = "chkref";

pub struct LambdaCaptureCheck {
    metadata: CheckMetadata,
}

impl LambdaCaptureCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata {
                id: CHECK_ID,
                name: "lambda-captures",
                description: "Flag lambda captures that can dangle: `this`, references, and pointers",
                severity: Severity::Warning,
                examples: Some(
                    "// Warns: the closure aliases every field of *this\nauto f = [=]() { return m_x; };\n\n// Safe: plain value copy\nint n = m_x;\nauto g = [n]() { return n; };",
                ),
            },
        }
    }
}

impl Default for LambdaCaptureCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for LambdaCaptureCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn check(&self, unit: &TranslationUnit) -> Result<Vec<Diagnostic>, CheckError> {
        let closures = collect_closures(unit);
        trace!(file = %unit.file, closures = closures.len(), "classifying closures");

        let mut diagnostics = Vec::new();
        for id in closures {
            analyze_closure(unit, id, &mut diagnostics)?;
        }
        Ok(diagnostics)
    }
}

/// Every closure in the unit, in source order; nested closures follow the
/// closure that contains them.
fn collect_closures(unit: &TranslationUnit) -> Vec<ClosureId> {
    struct Collector {
        closures: Vec<ClosureId>,
    }

    impl Visitor for Collector {
        fn visit_closure(&mut self, id: ClosureId, _unit: &TranslationUnit) -> ControlFlow<()> {
            self.closures.push(id);
            ControlFlow::Continue(())
        }
    }

    let mut collector = Collector {
        closures: Vec::new(),
    };
    let _ = visit::walk_unit(unit, &mut collector);
    collector.closures
}

fn analyze_closure(
    unit: &TranslationUnit,
    id: ClosureId,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), CheckError> {
    let closure = unit.closure(id);

    // Dedup scope is one closure: the set dies with this call.
    let mut warned_pointers: HashSet<String> = HashSet::new();

    for capture in &closure.captures {
        classifier::classify_capture(unit, closure, capture, &mut warned_pointers, sink)?;
    }
    escape::scan_body(unit, closure, &mut warned_pointers, sink);
    Ok(())
}
