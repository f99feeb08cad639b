//! Secondary scan of a closure body for pointer captures the capture list
//! cannot classify precisely.
//!
//! Inside templated closures, capture-kind resolution may be deferred or
//! imprecise before instantiation, so the primary classifier can miss a
//! pointer riding in through an implicit capture. The scan is a heuristic
//! substitute for real alias analysis, kept behind this module so a more
//! precise analysis can replace it without touching the classifier.
//!
//! Two passes over the same body:
//! 1. collect every expression node written directly inside the body;
//! 2. for each identifier reference, warn when the referenced variable was
//!    initialized with a pointer-typed expression that is *not* in the
//!    pass-1 set, i.e. its initialization happened outside this closure.
//!
//! A single pass cannot tell "pointer-typed local declared and used inside
//! the closure" (safe) from "reference to an outer pointer alias" (the
//! case the classifier may have missed). Overlap with the classifier on
//! ordinary captures is absorbed by the shared dedup set.
//!
//! Nested lambda bodies are opaque to both passes; the walker analyzes
//! each nested closure separately.

use std::collections::HashSet;

use crate::ast::{Closure, ExprId, ExprKind, StmtId, StmtKind, TranslationUnit};
use crate::checks::{Confidence, Severity};
use crate::diagnostic::{Diagnostic, DiagnosticSink};

use super::CHECK_ID;

pub(crate) fn scan_body(
    unit: &TranslationUnit,
    closure: &Closure,
    warned_pointers: &mut HashSet<String>,
    sink: &mut dyn DiagnosticSink,
) {
    let mut local_exprs = HashSet::new();
    collect_local_exprs_stmt(unit, closure.body, &mut local_exprs);
    scan_refs_stmt(unit, closure.body, closure, &local_exprs, warned_pointers, sink);
}

fn collect_local_exprs_stmt(unit: &TranslationUnit, id: StmtId, set: &mut HashSet<ExprId>) {
    match &unit.stmt(id).kind {
        StmtKind::Decl { var } => {
            if let Some(init) = unit.var(*var).init {
                collect_local_exprs_expr(unit, init, set);
            }
        }
        StmtKind::Expr { expr } => collect_local_exprs_expr(unit, *expr, set),
        StmtKind::Return { value } => {
            if let Some(expr) = value {
                collect_local_exprs_expr(unit, *expr, set);
            }
        }
        StmtKind::Block { stmts } => {
            for &stmt in stmts {
                collect_local_exprs_stmt(unit, stmt, set);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            collect_local_exprs_expr(unit, *cond, set);
            collect_local_exprs_stmt(unit, *then_branch, set);
            if let Some(stmt) = else_branch {
                collect_local_exprs_stmt(unit, *stmt, set);
            }
        }
    }
}

fn collect_local_exprs_expr(unit: &TranslationUnit, id: ExprId, set: &mut HashSet<ExprId>) {
    set.insert(id);
    match &unit.expr(id).kind {
        ExprKind::Unary { operand, .. } => collect_local_exprs_expr(unit, *operand, set),
        ExprKind::Binary { lhs, rhs, .. } => {
            collect_local_exprs_expr(unit, *lhs, set);
            collect_local_exprs_expr(unit, *rhs, set);
        }
        ExprKind::Call { callee, args } => {
            collect_local_exprs_expr(unit, *callee, set);
            for &arg in args {
                collect_local_exprs_expr(unit, arg, set);
            }
        }
        // The lambda expression itself is local to this body; its
        // internals belong to the nested closure's own scan.
        ExprKind::Lambda { .. }
        | ExprKind::DeclRef { .. }
        | ExprKind::Member { .. }
        | ExprKind::IntLit { .. }
        | ExprKind::NullPtr => {}
    }
}

fn scan_refs_stmt(
    unit: &TranslationUnit,
    id: StmtId,
    closure: &Closure,
    local_exprs: &HashSet<ExprId>,
    warned_pointers: &mut HashSet<String>,
    sink: &mut dyn DiagnosticSink,
) {
    match &unit.stmt(id).kind {
        StmtKind::Decl { var } => {
            if let Some(init) = unit.var(*var).init {
                scan_refs_expr(unit, init, closure, local_exprs, warned_pointers, sink);
            }
        }
        StmtKind::Expr { expr } => {
            scan_refs_expr(unit, *expr, closure, local_exprs, warned_pointers, sink)
        }
        StmtKind::Return { value } => {
            if let Some(expr) = value {
                scan_refs_expr(unit, *expr, closure, local_exprs, warned_pointers, sink);
            }
        }
        StmtKind::Block { stmts } => {
            for &stmt in stmts {
                scan_refs_stmt(unit, stmt, closure, local_exprs, warned_pointers, sink);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            scan_refs_expr(unit, *cond, closure, local_exprs, warned_pointers, sink);
            scan_refs_stmt(unit, *then_branch, closure, local_exprs, warned_pointers, sink);
            if let Some(stmt) = else_branch {
                scan_refs_stmt(unit, *stmt, closure, local_exprs, warned_pointers, sink);
            }
        }
    }
}

fn scan_refs_expr(
    unit: &TranslationUnit,
    id: ExprId,
    closure: &Closure,
    local_exprs: &HashSet<ExprId>,
    warned_pointers: &mut HashSet<String>,
    sink: &mut dyn DiagnosticSink,
) {
    match &unit.expr(id).kind {
        ExprKind::DeclRef { var } => {
            let var = unit.var(*var);
            let Some(init) = var.init else { return };
            let init_ty = unit.ty(unit.expr(init).ty);
            if init_ty.is_pointer()
                && !local_exprs.contains(&init)
                && warned_pointers.insert(var.name.clone())
            {
                let ty = unit.ty(var.ty);
                sink.report(
                    Diagnostic::new(
                        CHECK_ID,
                        Severity::Warning,
                        format!("Lambda captures pointer: {} (type {})", var.name, ty.name),
                        &unit.file,
                        closure.loc.line as usize,
                        closure.loc.column as usize,
                    )
                    .with_confidence(Confidence::Medium)
                    .with_suggestion("copy the pointee if the closure can outlive it"),
                );
            }
        }
        ExprKind::Unary { operand, .. } => {
            scan_refs_expr(unit, *operand, closure, local_exprs, warned_pointers, sink)
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            scan_refs_expr(unit, *lhs, closure, local_exprs, warned_pointers, sink);
            scan_refs_expr(unit, *rhs, closure, local_exprs, warned_pointers, sink);
        }
        ExprKind::Call { callee, args } => {
            scan_refs_expr(unit, *callee, closure, local_exprs, warned_pointers, sink);
            for &arg in args {
                scan_refs_expr(unit, arg, closure, local_exprs, warned_pointers, sink);
            }
        }
        // Nested closures are scanned on their own; their references do
        // not belong to this closure.
        ExprKind::Lambda { .. } | ExprKind::Member { .. } | ExprKind::IntLit { .. }
        | ExprKind::NullPtr => {}
    }
}
