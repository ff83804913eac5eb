//! Server capability declarations for the LG language server.

use tower_lsp::lsp_types::*;

/// Returns the server capabilities to be sent during initialization.
///
/// Declares full-document sync, hover, and completion with resolve.
/// Document symbols, range formatting, colors and folding are not offered.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full document sync - receive entire document on each change
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(true),
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
