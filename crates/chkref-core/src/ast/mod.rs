//! AST query surface consumed by the capture checks.
//!
//! Parsing and type-checking C++ source is not this crate's job. A host
//! front-end hands the analyzer one [`TranslationUnit`] per source file:
//! flat node tables addressed by typed index handles. Checks navigate the
//! unit exclusively through the query methods here and never hold raw
//! references across calls, which keeps them decoupled from how the host
//! manages AST memory.
//!
//! Units round-trip through JSON so a front-end in another process (or
//! another language) can dump them for the CLI.

pub mod visit;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StmtId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClosureId(pub u32);

/// Line/column position in the original source file, 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Scalar or otherwise opaque non-pointer type.
    Builtin,
    Pointer,
    Reference,
    /// A class type; field layout lives on the [`Class`] node.
    Record,
    /// Template-dependent type the front-end could not resolve.
    Dependent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Printable spelling, e.g. `int *`.
    pub name: String,
    pub kind: TypeKind,
}

impl Type {
    pub fn is_pointer(&self) -> bool {
        self.kind == TypeKind::Pointer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    /// Declared fields in declaration order.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Direct bases in declaration order. Acyclic by language construction.
    #[serde(default)]
    pub bases: Vec<ClassId>,
}

/// A named, typed declaration: local variable, parameter, or synthesized
/// capture field. Not owned by any closure that captures it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub ty: TypeId,
    /// Present when declared with `= expr` or a braces-equivalent.
    #[serde(default)]
    pub init: Option<ExprId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    AddrOf,
    Deref,
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
    Eq,
    Ne,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ExprKind {
    /// Reference to a declared variable by name.
    DeclRef { var: VarId },
    /// Implicit-`this` member access, e.g. a bare `m_x` inside a method.
    Member { name: String },
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },
    Call { callee: ExprId, args: Vec<ExprId> },
    Lambda { closure: ClosureId },
    IntLit { value: i64 },
    NullPtr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum StmtKind {
    Decl { var: VarId },
    Expr { expr: ExprId },
    Return { value: Option<ExprId> },
    Block { stmts: Vec<StmtId> },
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    ByValue,
    ByRef,
    This,
}

/// One entry in a closure's capture list.
///
/// `var` is absent for malformed or template-unresolved captures; the
/// classifier degrades those to `"unknown"` (by-ref) or skips them
/// (by-value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub kind: CaptureKind,
    #[serde(default)]
    pub var: Option<VarId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closure {
    pub loc: SourceLoc,
    /// Captures in written (or compiler-synthesized) order.
    #[serde(default)]
    pub captures: Vec<Capture>,
    pub body: StmtId,
    /// Pointee record of the synthesized `this`-capture field. `None` for
    /// closures outside any class; a `this`-capture without it is a
    /// front-end contract violation.
    #[serde(default)]
    pub enclosing_class: Option<ClassId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub body: Option<StmtId>,
}

#[derive(Debug, thiserror::Error)]
pub enum AstError {
    #[error("failed to parse AST dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed AST dump: {node} handle {index} out of range (table holds {len})")]
    DanglingHandle {
        node: &'static str,
        index: u32,
        len: usize,
    },
}

/// One already-parsed translation unit: the whole query surface the checks
/// see. Flat tables, indexed by the handle types above.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub file: String,
    #[serde(default)]
    types: Vec<Type>,
    #[serde(default)]
    classes: Vec<Class>,
    #[serde(default)]
    vars: Vec<Var>,
    #[serde(default)]
    exprs: Vec<Expr>,
    #[serde(default)]
    stmts: Vec<Stmt>,
    #[serde(default)]
    closures: Vec<Closure>,
    #[serde(default)]
    functions: Vec<Function>,
}

impl TranslationUnit {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Parse a serialized unit and validate every handle it contains.
    pub fn from_json(input: &str) -> Result<Self, AstError> {
        let unit: Self = serde_json::from_str(input)?;
        unit.validate()?;
        Ok(unit)
    }

    /// Serialize the unit the way [`Self::from_json`] expects it back.
    pub fn to_json(&self) -> Result<String, AstError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.0 as usize]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn closure(&self, id: ClosureId) -> &Closure {
        &self.closures[id.0 as usize]
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn add_type(&mut self, name: impl Into<String>, kind: TypeKind) -> TypeId {
        self.types.push(Type {
            name: name.into(),
            kind,
        });
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn add_class(&mut self, class: Class) -> ClassId {
        self.classes.push(class);
        ClassId(self.classes.len() as u32 - 1)
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        init: Option<ExprId>,
    ) -> VarId {
        self.vars.push(Var {
            name: name.into(),
            ty,
            init,
        });
        VarId(self.vars.len() as u32 - 1)
    }

    pub fn add_expr(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        self.exprs.push(Expr { kind, ty });
        ExprId(self.exprs.len() as u32 - 1)
    }

    pub fn add_stmt(&mut self, kind: StmtKind) -> StmtId {
        self.stmts.push(Stmt { kind });
        StmtId(self.stmts.len() as u32 - 1)
    }

    pub fn add_closure(&mut self, closure: Closure) -> ClosureId {
        self.closures.push(closure);
        ClosureId(self.closures.len() as u32 - 1)
    }

    pub fn add_function(&mut self, name: impl Into<String>, body: Option<StmtId>) {
        self.functions.push(Function {
            name: name.into(),
            body,
        });
    }

    /// Check that every handle stored anywhere in the unit lands inside its
    /// table. Hosts that hand over inconsistent dumps get a hard error here
    /// instead of a panic deep inside a check.
    pub fn validate(&self) -> Result<(), AstError> {
        let ty = |id: TypeId| Self::bounded("type", id.0, self.types.len());
        let class = |id: ClassId| Self::bounded("class", id.0, self.classes.len());
        let var = |id: VarId| Self::bounded("var", id.0, self.vars.len());
        let expr = |id: ExprId| Self::bounded("expr", id.0, self.exprs.len());
        let stmt = |id: StmtId| Self::bounded("stmt", id.0, self.stmts.len());
        let closure = |id: ClosureId| Self::bounded("closure", id.0, self.closures.len());

        for c in &self.classes {
            for f in &c.fields {
                ty(f.ty)?;
            }
            for &b in &c.bases {
                class(b)?;
            }
        }
        for v in &self.vars {
            ty(v.ty)?;
            if let Some(init) = v.init {
                expr(init)?;
            }
        }
        for e in &self.exprs {
            ty(e.ty)?;
            match &e.kind {
                ExprKind::DeclRef { var: v } => var(*v)?,
                ExprKind::Unary { operand, .. } => expr(*operand)?,
                ExprKind::Binary { lhs, rhs, .. } => {
                    expr(*lhs)?;
                    expr(*rhs)?;
                }
                ExprKind::Call { callee, args } => {
                    expr(*callee)?;
                    for &a in args {
                        expr(a)?;
                    }
                }
                ExprKind::Lambda { closure: c } => closure(*c)?,
                ExprKind::Member { .. } | ExprKind::IntLit { .. } | ExprKind::NullPtr => {}
            }
        }
        for s in &self.stmts {
            match &s.kind {
                StmtKind::Decl { var: v } => var(*v)?,
                StmtKind::Expr { expr: e } => expr(*e)?,
                StmtKind::Return { value } => {
                    if let Some(e) = value {
                        expr(*e)?;
                    }
                }
                StmtKind::Block { stmts } => {
                    for &s in stmts {
                        stmt(s)?;
                    }
                }
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    expr(*cond)?;
                    stmt(*then_branch)?;
                    if let Some(e) = else_branch {
                        stmt(*e)?;
                    }
                }
            }
        }
        for c in &self.closures {
            stmt(c.body)?;
            for cap in &c.captures {
                if let Some(v) = cap.var {
                    var(v)?;
                }
            }
            if let Some(cl) = c.enclosing_class {
                class(cl)?;
            }
        }
        for f in &self.functions {
            if let Some(b) = f.body {
                stmt(b)?;
            }
        }
        Ok(())
    }

    fn bounded(node: &'static str, index: u32, len: usize) -> Result<(), AstError> {
        if (index as usize) < len {
            Ok(())
        } else {
            Err(AstError::DanglingHandle { node, index, len })
        }
    }
}
