//! CLI command implementations

pub mod check;
pub mod explain;

pub use check::CheckArgs;
pub use explain::ExplainArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze AST dumps for unsafe lambda captures
    Check(CheckArgs),

    /// Show detailed explanation for a specific check
    Explain(ExplainArgs),
}
