//! Uniform preorder traversal over a translation unit.
//!
//! The walk descends into everything, including nested lambda bodies, so a
//! visitor sees nodes in source order. Analyses that need to treat lambda
//! bodies as opaque (the escape scanner does) recurse by hand instead.

use std::ops::ControlFlow;

use super::{ClosureId, ExprId, ExprKind, StmtId, StmtKind, TranslationUnit, VarId};

pub trait Visitor {
    fn visit_stmt(&mut self, _id: StmtId, _unit: &TranslationUnit) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_expr(&mut self, _id: ExprId, _unit: &TranslationUnit) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_decl_ref(&mut self, _var: VarId, _unit: &TranslationUnit) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_closure(&mut self, _id: ClosureId, _unit: &TranslationUnit) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Walk every function body in the unit, in declaration order.
pub fn walk_unit(unit: &TranslationUnit, visitor: &mut impl Visitor) -> ControlFlow<()> {
    for function in unit.functions() {
        if let Some(body) = function.body {
            walk_stmt(unit, body, visitor)?;
        }
    }
    ControlFlow::Continue(())
}

pub fn walk_stmt(
    unit: &TranslationUnit,
    id: StmtId,
    visitor: &mut impl Visitor,
) -> ControlFlow<()> {
    visitor.visit_stmt(id, unit)?;
    match &unit.stmt(id).kind {
        StmtKind::Decl { var } => {
            if let Some(init) = unit.var(*var).init {
                walk_expr(unit, init, visitor)?;
            }
        }
        StmtKind::Expr { expr } => walk_expr(unit, *expr, visitor)?,
        StmtKind::Return { value } => {
            if let Some(expr) = value {
                walk_expr(unit, *expr, visitor)?;
            }
        }
        StmtKind::Block { stmts } => {
            for &stmt in stmts {
                walk_stmt(unit, stmt, visitor)?;
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(unit, *cond, visitor)?;
            walk_stmt(unit, *then_branch, visitor)?;
            if let Some(stmt) = else_branch {
                walk_stmt(unit, *stmt, visitor)?;
            }
        }
    }
    ControlFlow::Continue(())
}

pub fn walk_expr(
    unit: &TranslationUnit,
    id: ExprId,
    visitor: &mut impl Visitor,
) -> ControlFlow<()> {
    visitor.visit_expr(id, unit)?;
    match &unit.expr(id).kind {
        ExprKind::DeclRef { var } => visitor.visit_decl_ref(*var, unit)?,
        ExprKind::Unary { operand, .. } => walk_expr(unit, *operand, visitor)?,
        ExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(unit, *lhs, visitor)?;
            walk_expr(unit, *rhs, visitor)?;
        }
        ExprKind::Call { callee, args } => {
            walk_expr(unit, *callee, visitor)?;
            for &arg in args {
                walk_expr(unit, arg, visitor)?;
            }
        }
        ExprKind::Lambda { closure } => {
            visitor.visit_closure(*closure, unit)?;
            walk_stmt(unit, unit.closure(*closure).body, visitor)?;
        }
        ExprKind::Member { .. } | ExprKind::IntLit { .. } | ExprKind::NullPtr => {}
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Capture, CaptureKind, Closure, SourceLoc, TypeKind};

    struct RefCollector {
        names: Vec<String>,
    }

    impl Visitor for RefCollector {
        fn visit_decl_ref(&mut self, var: VarId, unit: &TranslationUnit) -> ControlFlow<()> {
            self.names.push(unit.var(var).name.clone());
            ControlFlow::Continue(())
        }
    }

    struct ClosureCounter {
        count: usize,
        stop_at: Option<usize>,
    }

    impl Visitor for ClosureCounter {
        fn visit_closure(&mut self, _id: ClosureId, _unit: &TranslationUnit) -> ControlFlow<()> {
            self.count += 1;
            if Some(self.count) == self.stop_at {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
    }

    fn unit_with_nested_lambda() -> TranslationUnit {
        let mut unit = TranslationUnit::new("nested.cpp");
        let int_ty = unit.add_type("int", TypeKind::Builtin);
        let fn_ty = unit.add_type("(lambda)", TypeKind::Record);

        let n = unit.add_var("n", int_ty, None);
        let n_ref = unit.add_expr(ExprKind::DeclRef { var: n }, int_ty);
        let inner_ret = unit.add_stmt(StmtKind::Return { value: Some(n_ref) });
        let inner_body = unit.add_stmt(StmtKind::Block {
            stmts: vec![inner_ret],
        });
        let inner = unit.add_closure(Closure {
            loc: SourceLoc::new(3, 5),
            captures: vec![Capture {
                kind: CaptureKind::ByValue,
                var: Some(n),
            }],
            body: inner_body,
            enclosing_class: None,
        });
        let inner_lambda = unit.add_expr(ExprKind::Lambda { closure: inner }, fn_ty);
        let outer_ret = unit.add_stmt(StmtKind::Return {
            value: Some(inner_lambda),
        });
        let outer_body = unit.add_stmt(StmtKind::Block {
            stmts: vec![outer_ret],
        });
        let outer = unit.add_closure(Closure {
            loc: SourceLoc::new(2, 3),
            captures: Vec::new(),
            body: outer_body,
            enclosing_class: None,
        });
        let outer_lambda = unit.add_expr(ExprKind::Lambda { closure: outer }, fn_ty);
        let stmt = unit.add_stmt(StmtKind::Expr { expr: outer_lambda });
        let block = unit.add_stmt(StmtKind::Block { stmts: vec![stmt] });
        unit.add_function("f", Some(block));
        unit
    }

    #[test]
    fn walk_descends_into_nested_lambda_bodies() {
        let unit = unit_with_nested_lambda();
        let mut collector = RefCollector { names: Vec::new() };

        let _ = walk_unit(&unit, &mut collector);

        assert_eq!(collector.names, vec!["n"]);
    }

    #[test]
    fn closures_are_visited_outer_first() {
        let unit = unit_with_nested_lambda();
        let mut counter = ClosureCounter {
            count: 0,
            stop_at: None,
        };

        let _ = walk_unit(&unit, &mut counter);

        assert_eq!(counter.count, 2);
    }

    #[test]
    fn break_stops_the_walk_early() {
        let unit = unit_with_nested_lambda();
        let mut counter = ClosureCounter {
            count: 0,
            stop_at: Some(1),
        };

        let flow = walk_unit(&unit, &mut counter);

        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(counter.count, 1);
    }
}
