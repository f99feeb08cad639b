//! Explain command - provides detailed explanation of a check

use chkref_core::analysis::AnalysisEngine;
use chkref_core::checks::Severity;
use chkref_core::config::load_config_or_default_with_warnings;
use clap::Args;
use colored::Colorize;
use std::env;
use std::process;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(
        value_name = "CHECK_ID",
        help = "Check ID or name to explain (e.g., \"chkref\", \"lambda-captures\")"
    )]
    pub check_id: String,
}

impl ExplainArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config_or_default_with_warnings(&cwd).config;
        let engine = AnalysisEngine::with_config(&config);
        let registry = engine.registry();

        let check = registry
            .get_check(&self.check_id)
            .or_else(|| registry.get_check_by_name(&self.check_id));

        let Some(check) = check else {
            eprintln!(
                "{} Unknown check '{}'",
                "error:".red().bold(),
                self.check_id
            );
            eprintln!();
            eprintln!("Available checks:");
            for check in registry.checks() {
                let meta = check.metadata();
                eprintln!("  {} ({})", meta.id, meta.name);
            }
            process::exit(1);
        };

        let metadata = check.metadata();
        let is_enabled = registry.is_check_enabled(&self.check_id);

        println!();
        println!("{}", format!("Check {}", metadata.id).bold());
        println!();
        println!("  {}: {}", "Name".cyan(), metadata.name);
        println!("  {}: {}", "Description".cyan(), metadata.description);
        println!(
            "  {}: {}",
            "Severity".cyan(),
            format_severity(&metadata.severity)
        );

        if let Some(examples) = metadata.examples {
            println!();
            println!("  {}:", "Examples".cyan());
            for line in examples.lines() {
                println!("    {}", line);
            }
        }

        println!();
        if is_enabled {
            println!("  {}: {}", "Status".cyan(), "enabled".green());
        } else {
            println!("  {}: {}", "Status".cyan(), "disabled".red());
        }
        println!();

        Ok(())
    }
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Error => "error".red().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
        Severity::Hint => "hint".cyan().to_string(),
    }
}
