//! LG parsing and static analysis.
//!
//! `parse` is a pure function of the text: it never consults earlier
//! results. A grammar failure yields a single diagnostic and no templates;
//! otherwise the checker reports semantic problems over the parsed sections.

mod checker;
mod parser;

use thiserror::Error;
use tower_lsp::lsp_types::Range;

use crate::line_index::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LgDiagnostic {
    pub severity: Severity,
    pub range: Range,
    pub message: String,
}

impl LgDiagnostic {
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            range,
            message: message.into(),
        }
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            range,
            message: message.into(),
        }
    }
}

/// A named template as declared in an LG document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: String,
    /// Identifier of the resource the template was parsed from.
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub templates: Vec<Template>,
    pub diagnostics: Vec<LgDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LgError {
    #[error("Syntax error: {message}")]
    Syntax { offset: usize, message: String },
}

impl LgError {
    /// Diagnostic spanning from the failure point to the end of its line.
    pub fn to_diagnostic(&self, index: &LineIndex) -> LgDiagnostic {
        let LgError::Syntax { offset, .. } = self;
        let start = index.position_of(*offset);
        let end = index
            .line_end(start.line as usize)
            .map(|end| index.position_of(end.max(*offset)))
            .unwrap_or(start);
        LgDiagnostic::error(Range { start, end }, self.to_string())
    }
}

pub fn parse(text: &str, source: &str) -> ParseOutput {
    let index = LineIndex::new(text);
    let file = match parser::parse_file(text) {
        Ok(file) => file,
        Err(err) => {
            log::debug!("LG parse failed for {}: {}", source, err);
            return ParseOutput {
                diagnostics: vec![err.to_diagnostic(&index)],
                ..Default::default()
            };
        }
    };

    let diagnostics = checker::check(&file, &index);
    let templates = file
        .sections
        .iter()
        .map(|section| Template {
            name: section.name.to_string(),
            parameters: section.parameters.iter().map(|p| p.0.to_string()).collect(),
            body: section.body(),
            source: source.to_string(),
        })
        .collect();

    ParseOutput {
        templates,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn templates_carry_name_parameters_body_and_source() {
        let out = parse("# Greeting(name)\n- Hi ${name}\n# Bye\n- bye\n", "file:///a.lg");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.templates.len(), 2);

        let greeting = &out.templates[0];
        assert_eq!(greeting.name, "Greeting");
        assert_eq!(greeting.parameters, vec!["name".to_string()]);
        assert_eq!(greeting.body, "- Hi ${name}");
        assert_eq!(greeting.source, "file:///a.lg");
    }

    #[test]
    fn syntax_failure_is_a_single_error_diagnostic() {
        let out = parse("# Ok\n- a\n# not valid\n- b", "file:///a.lg");
        assert!(out.templates.is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        let diag = &out.diagnostics[0];
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.starts_with("Syntax error:"), "{}", diag.message);
        assert_eq!(diag.range.start.line, 2);
        assert_eq!(diag.range.end, Position { line: 2, character: 11 });
    }

    #[test]
    fn imports_are_accepted_but_not_resolved() {
        let out = parse("[shared](../shared.lg)\n# T\n- ${T2()}", "file:///a.lg");
        assert_eq!(out.templates.len(), 1);
        assert_eq!(
            out.diagnostics
                .iter()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>(),
            vec!["'T2' is neither a template nor a builtin function"]
        );
    }
}
