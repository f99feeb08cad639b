//! Analysis engine: wires configuration into the check registry and runs
//! it over translation units.

use tracing::debug;

use crate::ast::TranslationUnit;
use crate::checks::capture::LambdaCaptureCheck;
use crate::checks::{CheckError, CheckRegistry};
use crate::config::Config;
use crate::diagnostic::Diagnostic;

pub struct AnalysisEngine {
    registry: CheckRegistry,
}

impl AnalysisEngine {
    /// Build an engine with the stock checks. This is the single place
    /// where checks are registered; embedders that want a different set
    /// can assemble their own [`CheckRegistry`].
    pub fn new() -> Self {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(LambdaCaptureCheck::new()));
        Self { registry }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut engine = Self::new();
        engine.registry.configure(&config.checks);
        engine
    }

    /// Analyze one translation unit. Units are independent; calling this
    /// from several threads on different units is fine.
    pub fn analyze(&self, unit: &TranslationUnit) -> Result<Vec<Diagnostic>, CheckError> {
        debug!(file = %unit.file, "analyzing translation unit");
        let diagnostics = self.registry.run_all(unit)?;
        debug!(
            file = %unit.file,
            diagnostics = diagnostics.len(),
            "analysis finished"
        );
        Ok(diagnostics)
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
