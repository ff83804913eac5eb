//! Static checks over a parsed LG file.

use std::collections::{HashMap, HashSet};

use super::parser::{BodyLine, ParsedFile};
use super::LgDiagnostic;
use crate::builtins;
use crate::line_index::{is_word_char, LineIndex};

pub(crate) fn check(file: &ParsedFile<'_>, index: &LineIndex<'_>) -> Vec<LgDiagnostic> {
    let mut diagnostics = Vec::new();

    for line in &file.stray_lines {
        let content = line.text.trim_end();
        diagnostics.push(LgDiagnostic::warning(
            index.range_of(line.offset, line.offset + content.len()),
            "Content outside of a template definition is ignored",
        ));
    }

    let mut imported = HashSet::new();
    for import in &file.imports {
        if !imported.insert(import.path) {
            diagnostics.push(LgDiagnostic::warning(
                index.range_of(import.span.start, import.span.end),
                format!(
                    "Duplicated import of '{}' as '{}'",
                    import.path, import.label
                ),
            ));
        }
    }

    let template_names: HashSet<&str> = file.sections.iter().map(|s| s.name).collect();
    let mut defined: HashMap<&str, usize> = HashMap::new();

    for section in &file.sections {
        let name_range = index.range_of(section.name_span.start, section.name_span.end);

        let seen = defined.entry(section.name).or_insert(0);
        *seen += 1;
        if *seen > 1 {
            diagnostics.push(LgDiagnostic::error(
                name_range,
                format!("Duplicated definitions found for template: '{}'", section.name),
            ));
        }

        let mut params = HashSet::new();
        for (param, span) in &section.parameters {
            if !params.insert(*param) {
                diagnostics.push(LgDiagnostic::error(
                    index.range_of(span.start, span.end),
                    format!(
                        "Duplicated parameter '{}' in template '{}'",
                        param, section.name
                    ),
                ));
            }
        }

        if section.lines.iter().all(|line| line.text.trim().is_empty()) {
            diagnostics.push(LgDiagnostic::warning(
                name_range,
                format!("There is no template body in template '{}'", section.name),
            ));
        }

        for line in &section.lines {
            check_expressions(line, &template_names, index, &mut diagnostics);
        }
    }

    diagnostics.sort_by_key(|d| (d.range.start.line, d.range.start.character));
    diagnostics
}

fn check_expressions(
    line: &BodyLine<'_>,
    templates: &HashSet<&str>,
    index: &LineIndex<'_>,
    out: &mut Vec<LgDiagnostic>,
) {
    for expr in expressions(line.text) {
        let start = line.offset + expr.start;
        let Some(content) = expr.content else {
            let end = line.offset + line.text.trim_end_matches('\r').len();
            out.push(LgDiagnostic::error(
                index.range_of(start, end),
                format!(
                    "Close }} is missing in expression '{}'",
                    &line.text[expr.start..end - line.offset]
                ),
            ));
            continue;
        };

        let content_offset = start + 2;
        for (call_start, name) in function_calls(content) {
            let bare = builtins::strip_prefix(name);
            if templates.contains(name) || templates.contains(bare) || builtins::lookup(bare).is_some() {
                continue;
            }
            let call_start = content_offset + call_start;
            out.push(LgDiagnostic::error(
                index.range_of(call_start, call_start + name.len()),
                format!("'{}' is neither a template nor a builtin function", name),
            ));
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Expression<'a> {
    /// Offset of `$` within the line.
    start: usize,
    /// Text between `${` and the matching `}`; `None` when unclosed.
    content: Option<&'a str>,
}

/// `${...}` expressions in a body line. A backslash escapes the next character.
fn expressions(line: &str) -> Vec<Expression<'_>> {
    let mut found = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '$' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                let body_start = idx + 2;
                let mut depth = 1usize;
                let mut quote: Option<char> = None;
                let mut close = None;
                for (pos, c) in chars.by_ref() {
                    match (quote, c) {
                        (Some(q), c) if c == q => quote = None,
                        (Some(_), _) => {}
                        (None, '\'' | '"' | '`') => quote = Some(c),
                        (None, '{') => depth += 1,
                        (None, '}') => {
                            depth -= 1;
                            if depth == 0 {
                                close = Some(pos);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                found.push(Expression {
                    start: idx,
                    content: close.map(|end| &line[body_start..end]),
                });
                if close.is_none() {
                    break;
                }
            }
            _ => {}
        }
    }

    found
}

/// Names directly followed by `(` in an expression, skipping string literals.
fn function_calls(expr: &str) -> Vec<(usize, &str)> {
    let mut calls = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '\'' | '"' | '`') {
            for (_, c) in chars.by_ref() {
                if c == ch {
                    break;
                }
            }
            continue;
        }
        if !is_word_char(ch) {
            continue;
        }

        let mut end = idx + ch.len_utf8();
        while let Some(&(pos, c)) = chars.peek() {
            if !is_word_char(c) {
                break;
            }
            end = pos + c.len_utf8();
            chars.next();
        }

        let word = &expr[idx..end];
        let starts_like_name = word
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');
        let followed_by_paren = expr[end..].trim_start().starts_with('(');
        if starts_like_name && followed_by_paren {
            calls.push((idx, word));
        }
    }

    calls
}
