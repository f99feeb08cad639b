//! chkref CLI - driver for the capture-safety checker.
//!
//! Reads serialized AST dumps produced by a host front-end and reports
//! lambda captures that are likely to dangle.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "chkref",
    version,
    about = "Capture-safety checker for lambda expressions",
    long_about = "chkref inspects closures in already-parsed C++-like translation units\n\
                  and warns about capture patterns that commonly dangle: capturing this,\n\
                  capturing by reference, and capturing pointers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Explain(args) => args.run(),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
