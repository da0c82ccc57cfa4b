//! Stub parser
//!
//! Splits a template stub into sections. Grammar:
//!
//! ```text
//! document := preamble? (marker body)*
//! marker   := '#' ws* '@section' ws* ':' ws* name ws*
//! name     := [A-Za-z0-9_-]+
//! body     := every following line up to the next marker or end of input
//! ```
//!
//! A stub without any marker is a legacy stub and becomes a single `base`
//! section. Preamble lines before the first marker are kept as `base` only when
//! they hold something other than blanks and comments.

use thiserror::Error;

use crate::domain::entities::{TemplateDocument, SECTION_BASE};

const MARKER_KEYWORD: &str = "@section";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: section marker has an empty name")]
    EmptySectionName { line: usize },

    #[error("line {line}: invalid section name '{name}' (use letters, digits, '-' or '_')")]
    InvalidSectionName { name: String, line: usize },
}

/// Parse raw stub text into a `TemplateDocument`.
pub fn parse(raw: &str) -> Result<TemplateDocument, ParseError> {
    let mut doc = TemplateDocument::new();
    let mut current: Option<String> = None;
    let mut preamble: Vec<&str> = Vec::new();
    let mut body: Vec<&str> = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        match parse_marker(line, idx + 1)? {
            Some(name) => {
                match current.take() {
                    Some(prev) => doc.push_section(prev, std::mem::take(&mut body).join("\n")),
                    None => preamble = std::mem::take(&mut body),
                }
                current = Some(name);
            }
            None => body.push(line),
        }
    }

    match current {
        Some(last) => {
            if preamble.iter().any(|l| is_content(l)) {
                let mut with_base =
                    TemplateDocument::new().with_section(SECTION_BASE, preamble.join("\n"));
                for name in doc.section_names() {
                    with_base.push_section(name, doc.section(name).unwrap_or_default());
                }
                doc = with_base;
            }
            doc.push_section(last, body.join("\n"));
        }
        None => doc.push_section(SECTION_BASE, body.join("\n")),
    }

    Ok(doc)
}

/// Returns the section name when `line` is a marker.
fn parse_marker(line: &str, line_no: usize) -> Result<Option<String>, ParseError> {
    let Some(rest) = line.trim().strip_prefix('#') else {
        return Ok(None);
    };
    let rest = rest.trim_start();
    let is_marker = rest
        .get(..MARKER_KEYWORD.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MARKER_KEYWORD));
    if !is_marker {
        return Ok(None);
    }
    let Some(name) = rest[MARKER_KEYWORD.len()..].trim_start().strip_prefix(':') else {
        return Ok(None);
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::EmptySectionName { line: line_no });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ParseError::InvalidSectionName {
            name: name.to_string(),
            line: line_no,
        });
    }
    Ok(Some(name.to_ascii_lowercase()))
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}
