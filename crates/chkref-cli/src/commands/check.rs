//! Check command - analyzes AST dumps for unsafe lambda captures

use crate::output::json::JsonFormatter;
use anyhow::{Context, Result};
use chkref_core::analysis::AnalysisEngine;
use chkref_core::ast::TranslationUnit;
use chkref_core::checks::{Confidence, Severity};
use chkref_core::config::load_config_or_default_with_warnings;
use chkref_core::diagnostic::Diagnostic;
use clap::Args;
use colored::Colorize;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use walkdir::WalkDir;

const DUMP_EXTENSION: &str = "json";

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to an AST dump or a directory of dumps
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format for diagnostics (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Filter diagnostics by minimum confidence level (high, medium, low)
    #[arg(long, value_name = "LEVEL", default_value = "medium")]
    pub min_confidence: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();
        let min_confidence = self.parse_confidence()?;

        let config_result = load_config_or_default_with_warnings(&self.path);
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let files = discover_files(&self.path)?;
        tracing::debug!(files = files.len(), "discovered AST dumps");
        if files.is_empty() {
            println!("No AST dumps found.");
            return Ok(());
        }

        let engine = AnalysisEngine::with_config(&config);

        // Units are independent, so they can run in parallel; the indexed
        // collect keeps the output ordered by file.
        let per_file: Vec<Result<Vec<Diagnostic>>> = files
            .par_iter()
            .map(|file| analyze_dump(&engine, file))
            .collect();

        let mut all_diagnostics = Vec::new();
        for result in per_file {
            all_diagnostics.extend(result?);
        }
        let all_diagnostics: Vec<Diagnostic> = all_diagnostics
            .into_iter()
            .filter(|d| d.confidence.level() >= min_confidence.level())
            .collect();

        match self.format.as_str() {
            "json" => self.output_json(&all_diagnostics, &engine, files.len()),
            "text" => self.output_text(&all_diagnostics),
            other => anyhow::bail!("Invalid format '{}'. Valid values: text, json", other),
        }

        let error_count = all_diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
            .count();
        let warning_count = all_diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
            .count();

        if error_count > 0 || (warning_count > 0 && self.fail_on_warnings) {
            process::exit(1);
        }

        Ok(())
    }

    fn parse_confidence(&self) -> Result<Confidence> {
        match self.min_confidence.as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => anyhow::bail!(
                "Invalid confidence '{}'. Valid values: high, medium, low",
                other
            ),
        }
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }

    fn output_text(&self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
                Severity::Hint => "hint".cyan().bold(),
            };

            println!(
                "{}:{}:{}: {} [{}]: {}",
                diag.file,
                diag.line,
                diag.column,
                severity_str,
                diag.check_id.dimmed(),
                diag.message
            );

            if let Some(suggestion) = &diag.suggestion {
                println!("  {} {}", "suggestion:".green(), suggestion);
            }
        }

        if !diagnostics.is_empty() {
            let warning_count = diagnostics
                .iter()
                .filter(|d| matches!(d.severity, Severity::Warning))
                .count();
            println!();
            println!("Found {} warning(s)", warning_count);
        }
    }

    fn output_json(&self, diagnostics: &[Diagnostic], engine: &AnalysisEngine, total_files: usize) {
        let formatter = JsonFormatter::with_registry(engine.registry());
        println!(
            "{}",
            formatter.format(diagnostics, total_files, &self.path.to_string_lossy())
        );
    }
}

fn analyze_dump(engine: &AnalysisEngine, file: &Path) -> Result<Vec<Diagnostic>> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read AST dump '{}'", file.display()))?;
    let unit = TranslationUnit::from_json(&content)
        .with_context(|| format!("Invalid AST dump '{}'", file.display()))?;
    engine
        .analyze(&unit)
        .with_context(|| format!("Analysis aborted for '{}'", file.display()))
}

fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("Path '{}' does not exist", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext == DUMP_EXTENSION)
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dump(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn pointer_capture_dump() -> String {
        let mut unit = TranslationUnit::new("f2.cpp");
        let ptr_ty = unit.add_type("int *", chkref_core::ast::TypeKind::Pointer);
        let lambda_ty = unit.add_type("(lambda)", chkref_core::ast::TypeKind::Record);
        let m = unit.add_var("m", ptr_ty, None);
        let body = unit.add_stmt(chkref_core::ast::StmtKind::Block { stmts: Vec::new() });
        let closure = unit.add_closure(chkref_core::ast::Closure {
            loc: chkref_core::ast::SourceLoc::new(3, 14),
            captures: vec![chkref_core::ast::Capture {
                kind: chkref_core::ast::CaptureKind::ByValue,
                var: Some(m),
            }],
            body,
            enclosing_class: None,
        });
        let lambda = unit.add_expr(
            chkref_core::ast::ExprKind::Lambda { closure },
            lambda_ty,
        );
        let stmt = unit.add_stmt(chkref_core::ast::StmtKind::Expr { expr: lambda });
        let block = unit.add_stmt(chkref_core::ast::StmtKind::Block { stmts: vec![stmt] });
        unit.add_function("f2", Some(block));
        unit.to_json().unwrap()
    }

    #[test]
    fn discover_files_finds_json_dumps_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_dump(dir.path(), "b.json", "{}");
        write_dump(dir.path(), "a.json", "{}");
        write_dump(dir.path(), "notes.txt", "ignored");

        let files = discover_files(dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.json"));
        assert!(files[1].ends_with("b.json"));
    }

    #[test]
    fn discover_files_accepts_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let dump = write_dump(dir.path(), "tu.json", "{}");

        let files = discover_files(&dump).unwrap();

        assert_eq!(files, vec![dump]);
    }

    #[test]
    fn discover_files_rejects_missing_paths() {
        let dir = tempfile::tempdir().unwrap();

        assert!(discover_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn analyze_dump_reports_pointer_capture() {
        let dir = tempfile::tempdir().unwrap();
        let dump = write_dump(dir.path(), "f2.json", &pointer_capture_dump());
        let engine = AnalysisEngine::new();

        let diagnostics = analyze_dump(&engine, &dump).unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Lambda captures pointer: m (type int *)"
        );
        assert_eq!(diagnostics[0].file, "f2.cpp");
    }

    #[test]
    fn analyze_dump_rejects_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let dump = write_dump(dir.path(), "broken.json", "{\"file\": 42}");
        let engine = AnalysisEngine::new();

        assert!(analyze_dump(&engine, &dump).is_err());
    }
}
