//! Diagnostic mapping and publishing.
//!
//! Engine diagnostics are converted into LSP diagnostics here, and published
//! through a `DiagnosticsPublisher`. Publishing an empty list is the signal
//! that clears whatever the client currently shows for a document.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};
use tower_lsp::Client;

use crate::lg::{LgDiagnostic, Severity};

/// Sink for `textDocument/publishDiagnostics` notifications.
#[tower_lsp::async_trait]
pub trait DiagnosticsPublisher: Send + Sync + 'static {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);
}

#[tower_lsp::async_trait]
impl DiagnosticsPublisher for Client {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.publish_diagnostics(uri, diagnostics, version).await;
    }
}

/// Convert an engine diagnostic for the document `source` into an LSP one.
pub fn to_lsp_diagnostic(diagnostic: &LgDiagnostic, source: &str) -> Diagnostic {
    Diagnostic {
        range: diagnostic.range,
        severity: Some(severity_to_lsp(diagnostic.severity)),
        source: Some(source.to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

pub fn severity_to_lsp(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}
