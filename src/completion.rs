//! Completion items for LG documents.
//!
//! Offers the document's own templates, then the builtin functions. Items
//! carry a ready-to-insert call with the parameter names filled in.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Documentation};

use crate::builtins::{self, BuiltinFunction};
use crate::lg::Template;

/// Every template of the document followed by every builtin, in parse and
/// registry order. Filtering by the typed prefix is left to the client.
pub fn completion(templates: &[Template]) -> Vec<CompletionItem> {
    templates
        .iter()
        .map(template_item)
        .chain(builtins::all().iter().map(builtin_item))
        .collect()
}

fn template_item(template: &Template) -> CompletionItem {
    let insert_text = if template.parameters.is_empty() {
        template.name.clone()
    } else {
        format!("{}({})", template.name, template.parameters.join(", "))
    };
    CompletionItem {
        label: template.name.clone(),
        kind: Some(CompletionItemKind::REFERENCE),
        detail: Some("Template".to_string()),
        documentation: Some(Documentation::String(template.body.clone())),
        insert_text: Some(insert_text),
        ..Default::default()
    }
}

fn builtin_item(function: &BuiltinFunction) -> CompletionItem {
    let params: Vec<&str> = function.param_names().collect();
    CompletionItem {
        label: function.name.to_string(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(format!("Builtin function, returns {}", function.return_type)),
        documentation: Some(Documentation::String(function.description.to_string())),
        insert_text: Some(format!("{}({})", function.name, params.join(", "))),
        ..Default::default()
    }
}
