//! Hover documentation for templates and builtin functions.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkedString, Position};

use crate::builtins::{self, BuiltinFunction};
use crate::lg::Template;
use crate::line_index::LineIndex;

/// Resolve the word under `position` against the document's templates first,
/// then the builtin registry. `None` when nothing matches.
pub fn hover(text: &str, templates: &[Template], position: Position) -> Option<Hover> {
    let index = LineIndex::new(text);
    let (start, end, word) = index.word_at(position)?;
    let name = builtins::strip_prefix(word);

    let contents = match find_template(templates, word, name) {
        Some(template) => template_contents(template),
        None => builtin_contents(builtins::lookup(name)?),
    };

    Some(Hover {
        contents: HoverContents::Array(contents),
        range: Some(index.range_of(start, end)),
    })
}

fn find_template<'a>(templates: &'a [Template], word: &str, name: &str) -> Option<&'a Template> {
    templates
        .iter()
        .find(|t| t.name == word)
        .or_else(|| templates.iter().find(|t| t.name == name))
}

fn template_contents(template: &Template) -> Vec<MarkedString> {
    vec![
        MarkedString::String(template.source.clone()),
        MarkedString::String(template.body.clone()),
    ]
}

fn builtin_contents(function: &BuiltinFunction) -> Vec<MarkedString> {
    vec![
        MarkedString::String(format!("Parameters: {}", function.parameters.join(", "))),
        MarkedString::String(format!("Documentation: {}", function.description)),
        MarkedString::String(format!("ReturnType: {}", function.return_type.name())),
    ]
}
