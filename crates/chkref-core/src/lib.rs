//! chkref-core - capture-safety analysis for C++-like ASTs.
//!
//! Flags lambda captures that commonly produce dangling references and
//! pointers: capturing `this`, capturing by reference, capturing a pointer
//! by value, and pointer aliases that sneak past an imprecise capture list
//! in template code.
//!
//! The crate analyzes, it does not parse: a host front-end supplies one
//! [`ast::TranslationUnit`] per source file (in process through the
//! builder API, or as a JSON dump), and [`analysis::AnalysisEngine`]
//! returns [`diagnostic::Diagnostic`]s for it. This is a best-effort lint,
//! not a verifier: no escape or lifetime analysis, no aliasing beyond one
//! level of indirection.

pub mod analysis;
pub mod ast;
pub mod checks;
pub mod config;
pub mod diagnostic;

pub use analysis::AnalysisEngine;
pub use diagnostic::Diagnostic;
