//! pest front end for LG files.
//!
//! Turns raw text into a flat list of template sections, each with the byte
//! spans the checker needs to report precise ranges.

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::LgError;

#[derive(Parser)]
#[grammar = "lg/lg.pest"]
pub(crate) struct LgGrammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

impl From<pest::Span<'_>> for ByteSpan {
    fn from(span: pest::Span<'_>) -> Self {
        Self {
            start: span.start(),
            end: span.end(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BodyLine<'a> {
    pub offset: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone)]
pub(crate) struct Section<'a> {
    pub name: &'a str,
    pub name_span: ByteSpan,
    pub parameters: Vec<(&'a str, ByteSpan)>,
    pub lines: Vec<BodyLine<'a>>,
}

impl Section<'_> {
    /// Body text with trailing blank lines dropped.
    pub fn body(&self) -> String {
        let keep = self
            .lines
            .iter()
            .rposition(|line| !line.text.trim().is_empty())
            .map_or(0, |idx| idx + 1);
        self.lines[..keep]
            .iter()
            .map(|line| line.text.trim_end_matches('\r'))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ImportDecl<'a> {
    pub label: &'a str,
    pub path: &'a str,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedFile<'a> {
    pub sections: Vec<Section<'a>>,
    pub imports: Vec<ImportDecl<'a>>,
    /// Non-blank body lines that appear before the first template header.
    pub stray_lines: Vec<BodyLine<'a>>,
}

pub(crate) fn parse_file(text: &str) -> Result<ParsedFile<'_>, LgError> {
    let mut pairs = LgGrammar::parse(Rule::file, text).map_err(LgError::from)?;
    let mut parsed = ParsedFile::default();
    let Some(file) = pairs.next() else {
        return Ok(parsed);
    };

    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::template_header => parsed.sections.push(section_from_header(pair)),
            Rule::body_line => {
                let line = BodyLine {
                    offset: pair.as_span().start(),
                    text: pair.as_str(),
                };
                match parsed.sections.last_mut() {
                    Some(section) => section.lines.push(line),
                    None if !line.text.trim().is_empty() => parsed.stray_lines.push(line),
                    None => {}
                }
            }
            Rule::import_def => {
                let span = ByteSpan::from(pair.as_span());
                let mut label = "";
                let mut path = "";
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::import_label => label = inner.as_str(),
                        Rule::import_path => path = inner.as_str().trim(),
                        _ => {}
                    }
                }
                parsed.imports.push(ImportDecl { label, path, span });
            }
            _ => {}
        }
    }

    Ok(parsed)
}

fn section_from_header(header: Pair<'_, Rule>) -> Section<'_> {
    let mut section = Section {
        name: "",
        name_span: ByteSpan::from(header.as_span()),
        parameters: Vec::new(),
        lines: Vec::new(),
    };
    for inner in header.into_inner() {
        match inner.as_rule() {
            Rule::template_name => {
                section.name = inner.as_str();
                section.name_span = ByteSpan::from(inner.as_span());
            }
            Rule::parameters => {
                section.parameters = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::parameter)
                    .map(|p| (p.as_str(), ByteSpan::from(p.as_span())))
                    .collect();
            }
            _ => {}
        }
    }
    section
}

impl From<pest::error::Error<Rule>> for LgError {
    fn from(error: pest::error::Error<Rule>) -> Self {
        let offset = match error.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let error = error.renamed_rules(describe_rule);
        LgError::Syntax {
            offset,
            message: error.variant.message().into_owned(),
        }
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::template_header => "a template definition",
        Rule::template_name => "a template name",
        Rule::parameters => "a parameter list",
        Rule::parameter => "a parameter name",
        Rule::import_def => "an import",
        Rule::import_label => "an import label",
        Rule::import_path => "an import path",
        Rule::comment => "a comment",
        Rule::body_line => "a template body line",
        Rule::EOI => "end of line",
        other => return format!("{other:?}"),
    }
    .to_string()
}
