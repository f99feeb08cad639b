//! Primary classification of a closure's capture list.

use std::collections::HashSet;

use crate::ast::{Capture, CaptureKind, Closure, TranslationUnit};
use crate::checks::{CheckError, Severity};
use crate::diagnostic::{Diagnostic, DiagnosticSink};

use super::{CHECK_ID, fields};

/// Classify one capture entry and emit zero or one diagnostic.
///
/// `warned_pointers` is the per-closure dedup set shared with the body
/// escape scanner: only the first pointer warning per variable name per
/// closure gets through.
pub(crate) fn classify_capture(
    unit: &TranslationUnit,
    closure: &Closure,
    capture: &Capture,
    warned_pointers: &mut HashSet<String>,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), CheckError> {
    match capture.kind {
        CaptureKind::This => {
            let class = closure
                .enclosing_class
                .ok_or_else(|| CheckError::MissingEnclosingClass {
                    file: unit.file.clone(),
                    loc: closure.loc,
                })?;
            let summary = fields::summarize_class(unit, class);
            sink.report(
                warning(unit, closure, format!("Lambda captures this: {summary}"))
                    .with_suggestion(
                        "capture the members you need by value instead of aliasing the whole object",
                    ),
            );
        }
        CaptureKind::ByRef => {
            let name = capture
                .var
                .map(|v| unit.var(v).name.as_str())
                .unwrap_or("unknown");
            sink.report(warning(
                unit,
                closure,
                format!("Lambda captures var by ref: {name}"),
            ));
        }
        CaptureKind::ByValue => {
            // A by-value capture with no resolvable variable cannot be
            // type-checked; the body escape scanner is the fallback there.
            let Some(var_id) = capture.var else {
                return Ok(());
            };
            let var = unit.var(var_id);
            let ty = unit.ty(var.ty);
            if ty.is_pointer() && warned_pointers.insert(var.name.clone()) {
                sink.report(
                    warning(
                        unit,
                        closure,
                        format!("Lambda captures pointer: {} (type {})", var.name, ty.name),
                    )
                    .with_suggestion("copy the pointee if the closure can outlive it"),
                );
            }
        }
    }
    Ok(())
}

fn warning(unit: &TranslationUnit, closure: &Closure, message: String) -> Diagnostic {
    Diagnostic::new(
        CHECK_ID,
        Severity::Warning,
        message,
        &unit.file,
        closure.loc.line as usize,
        closure.loc.column as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Access, Class, Field, SourceLoc, StmtKind, TypeKind};

    fn closure_at(line: u32, enclosing_class: Option<crate::ast::ClassId>) -> Closure {
        Closure {
            loc: SourceLoc::new(line, 5),
            captures: Vec::new(),
            body: crate::ast::StmtId(0),
            enclosing_class,
        }
    }

    fn unit_with_block() -> TranslationUnit {
        let mut unit = TranslationUnit::new("test.cpp");
        unit.add_stmt(StmtKind::Block { stmts: Vec::new() });
        unit
    }

    fn classify(
        unit: &TranslationUnit,
        closure: &Closure,
        capture: Capture,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut warned = HashSet::new();
        let mut sink: Vec<Diagnostic> = Vec::new();
        classify_capture(unit, closure, &capture, &mut warned, &mut sink)?;
        Ok(sink)
    }

    #[test]
    fn this_capture_renders_field_summary() {
        let mut unit = unit_with_block();
        let int_ty = unit.add_type("int", TypeKind::Builtin);
        let class = unit.add_class(Class {
            name: "C".to_string(),
            fields: vec![Field {
                name: "m_x".to_string(),
                ty: int_ty,
                access: Access::Private,
            }],
            bases: Vec::new(),
        });
        let closure = closure_at(3, Some(class));

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::This,
                var: None,
            },
        )
        .unwrap();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Lambda captures this: C {m_x}");
        assert_eq!(diags[0].line, 3);
    }

    #[test]
    fn this_capture_without_class_is_fatal() {
        let unit = unit_with_block();
        let closure = closure_at(2, None);

        let err = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::This,
                var: None,
            },
        )
        .unwrap_err();

        assert!(matches!(err, CheckError::MissingEnclosingClass { .. }));
    }

    #[test]
    fn by_ref_capture_names_the_variable() {
        let mut unit = unit_with_block();
        let int_ty = unit.add_type("int", TypeKind::Builtin);
        let cap = unit.add_var("cap", int_ty, None);
        let closure = closure_at(5, None);

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::ByRef,
                var: Some(cap),
            },
        )
        .unwrap();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Lambda captures var by ref: cap");
    }

    #[test]
    fn unresolved_by_ref_capture_degrades_to_unknown() {
        let unit = unit_with_block();
        let closure = closure_at(5, None);

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::ByRef,
                var: None,
            },
        )
        .unwrap();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Lambda captures var by ref: unknown");
    }

    #[test]
    fn by_value_pointer_capture_warns_with_type() {
        let mut unit = unit_with_block();
        let ptr_ty = unit.add_type("int *", TypeKind::Pointer);
        let m = unit.add_var("m", ptr_ty, None);
        let closure = closure_at(7, None);

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::ByValue,
                var: Some(m),
            },
        )
        .unwrap();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Lambda captures pointer: m (type int *)");
    }

    #[test]
    fn by_value_non_pointer_capture_is_silent() {
        let mut unit = unit_with_block();
        let int_ty = unit.add_type("int", TypeKind::Builtin);
        let n = unit.add_var("n", int_ty, None);
        let closure = closure_at(7, None);

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::ByValue,
                var: Some(n),
            },
        )
        .unwrap();

        assert!(diags.is_empty());
    }

    #[test]
    fn by_value_capture_without_variable_is_silent() {
        let unit = unit_with_block();
        let closure = closure_at(7, None);

        let diags = classify(
            &unit,
            &closure,
            Capture {
                kind: CaptureKind::ByValue,
                var: None,
            },
        )
        .unwrap();

        assert!(diags.is_empty());
    }

    #[test]
    fn pointer_warning_dedups_within_one_closure() {
        let mut unit = unit_with_block();
        let ptr_ty = unit.add_type("int *", TypeKind::Pointer);
        let m = unit.add_var("m", ptr_ty, None);
        let closure = closure_at(7, None);
        let capture = Capture {
            kind: CaptureKind::ByValue,
            var: Some(m),
        };

        let mut warned = HashSet::new();
        let mut sink: Vec<Diagnostic> = Vec::new();
        classify_capture(&unit, &closure, &capture, &mut warned, &mut sink).unwrap();
        classify_capture(&unit, &closure, &capture, &mut warned, &mut sink).unwrap();

        assert_eq!(sink.len(), 1);
    }
}
