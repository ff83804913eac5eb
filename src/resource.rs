//! Resource adapter over the LG engine.
//!
//! Every call parses from scratch; nothing is cached between calls.

use tower_lsp::lsp_types::Diagnostic;

use crate::diagnostics::to_lsp_diagnostic;
use crate::lg::{self, Template};

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub templates: Vec<Template>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` and collect its templates and diagnostics.
///
/// Empty text skips the engine entirely and yields an empty analysis.
pub fn analyze(text: &str, source: &str) -> Analysis {
    if text.is_empty() {
        return Analysis::default();
    }

    let output = lg::parse(text, source);
    Analysis {
        templates: output.templates,
        diagnostics: output
            .diagnostics
            .iter()
            .map(|diagnostic| to_lsp_diagnostic(diagnostic, source))
            .collect(),
    }
}

/// Templates only; used by hover and completion.
pub fn templates(text: &str, source: &str) -> Vec<Template> {
    analyze(text, source).templates
}
