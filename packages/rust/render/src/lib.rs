//! .docx template rendering for CourseDocs.
//!
//! A template is parsed fresh for every document, so state from one render
//! can never leak into the next. Rewriting is paragraph-scoped: the visible
//! text of each paragraph is collected, the substitution rules run against
//! that one string, and only paragraphs whose text actually changed are
//! written back. Writing back replaces the paragraph's children with a
//! single unstyled run; paragraph-level formatting survives, run-level
//! formatting inside rewritten paragraphs does not.

mod filename;

pub use filename::build_filename;

use std::io::Cursor;
use std::path::Path;

use coursedocs_shared::{ADULTS_LABEL, CourseDocsError, GenerateOptions, RenderContext, Result};
use docx_rs::{Docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, read_docx};
use regex::Regex;
use tracing::debug;

/// Placeholder tokens recognized in template paragraphs.
const LEVEL_TOKEN: &str = "{{LEVEL}}";
const ID_TOKEN: &str = "{{ID}}";
const WA_LINK_TOKEN: &str = "{{WA_LINK}}";
const SCHEDULE_TOKEN: &str = "{{SCHEDULE}}";
const TYPE_TOKEN: &str = "{{TYPE}}";

// ---------------------------------------------------------------------------
// RenderRules
// ---------------------------------------------------------------------------

/// Batch-wide rewrite rules, compiled once and shared by every render.
#[derive(Debug, Clone)]
pub struct RenderRules {
    anchor: Regex,
    date_text: String,
}

impl RenderRules {
    /// Compile the date anchor from the merged options. An invalid pattern
    /// is a config error and stops the batch before any row is processed.
    pub fn new(options: &GenerateOptions) -> Result<Self> {
        let anchor = Regex::new(&options.anchor_pattern).map_err(|e| {
            CourseDocsError::config(format!(
                "invalid anchor pattern {:?}: {e}",
                options.anchor_pattern
            ))
        })?;
        Ok(Self {
            anchor,
            date_text: options.date_text.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A .docx template held as raw bytes. [`Template::render`] re-parses the
/// bytes on every call.
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Vec<u8>,
}

impl Template {
    /// Load a template from disk, verifying up front that it parses.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| CourseDocsError::io(path, e))?;
        Self::from_bytes(bytes)
    }

    /// Wrap template bytes, verifying up front that they parse. A broken
    /// template fails the batch here instead of once per row.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        parse_docx(&bytes)?;
        Ok(Self { bytes })
    }

    /// Render one document: apply the rewrite rules to every paragraph of a
    /// fresh copy of the template and return the packed bytes.
    pub fn render(&self, context: &RenderContext, rules: &RenderRules) -> Result<Vec<u8>> {
        let mut docx = parse_docx(&self.bytes)?;

        let mut rewritten = 0usize;
        for child in &mut docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                let text = paragraph_text(paragraph);
                if let Some(new_text) = rewrite_paragraph(&text, context, rules) {
                    paragraph.children =
                        vec![ParagraphChild::Run(Box::new(Run::new().add_text(new_text)))];
                    rewritten += 1;
                }
            }
        }
        debug!(rewritten, "rendered document");

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| CourseDocsError::template(format!("failed to pack document: {e}")))?;
        Ok(buffer.into_inner())
    }
}

fn parse_docx(bytes: &[u8]) -> Result<Docx> {
    read_docx(bytes).map_err(|e| CourseDocsError::template(format!("failed to parse .docx: {e}")))
}

// ---------------------------------------------------------------------------
// Paragraph rewriting
// ---------------------------------------------------------------------------

/// Apply the rewrite rules to one paragraph's text, in order: date anchor,
/// placeholder tokens, audience wording. Returns the new text only when at
/// least one rule changed something.
fn rewrite_paragraph(text: &str, context: &RenderContext, rules: &RenderRules) -> Option<String> {
    let mut out = text.to_string();

    // Only the first anchor occurrence is a course date.
    if let Some(range) = rules.anchor.find(&out).map(|m| m.range()) {
        out.replace_range(range, &rules.date_text);
    }

    for (token, value) in [
        (LEVEL_TOKEN, context.level.as_str()),
        (ID_TOKEN, context.id.as_str()),
        (WA_LINK_TOKEN, context.wa_link.as_str()),
        (SCHEDULE_TOKEN, context.schedule.as_str()),
        (TYPE_TOKEN, context.type_label.as_str()),
    ] {
        if out.contains(token) {
            out = out.replace(token, value);
        }
    }

    // Templates are worded for adult courses; fix the audience when this
    // row targets another one.
    if context.type_label != ADULTS_LABEL && out.contains(ADULTS_LABEL) {
        out = out.replace(ADULTS_LABEL, &context.type_label);
    }

    (out != text).then_some(out)
}

/// Visible text of a paragraph: run text in order, breaks as newlines,
/// tabs as tabs. Runs nested in hyperlinks are included.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        append_child_text(child, &mut buffer);
    }
    buffer
}

fn append_child_text(child: &ParagraphChild, buffer: &mut String) {
    match child {
        ParagraphChild::Run(run) => append_run_text(run.as_ref(), buffer),
        ParagraphChild::Hyperlink(hyperlink) => {
            for inner in &hyperlink.children {
                append_child_text(inner, buffer);
            }
        }
        _ => {}
    }
}

fn append_run_text(run: &Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => buffer.push_str(&text.text),
            RunChild::Break(_) => buffer.push('\n'),
            RunChild::Tab(_) => buffer.push('\t'),
            _ => {}
        }
    }
}

/// Per-paragraph visible text of a packed document. Lets callers check
/// rendered output without unpacking files by hand.
pub fn extract_text(bytes: &[u8]) -> Result<Vec<String>> {
    let docx = parse_docx(bytes)?;
    Ok(docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect())
}
