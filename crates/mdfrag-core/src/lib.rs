//! Converts a small Markdown dialect into an HTML fragment for rich-text
//! surfaces that render a fixed tag set and cannot be styled with CSS.
//!
//! ```
//! assert_eq!(mdfrag_core::convert("**bold**"), "<p><b>bold</b></p>");
//! ```

mod ast;
mod diagnostic;
mod emit;
mod escape;
mod parser;
mod segment;
mod source_map;
mod span;

pub use ast::{Block, Document, Inline, InlineSeq, ListItem, ListMarker};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, W_CODE_UNTERMINATED, W_EMPHASIS_UNMATCHED,
    W_FENCE_UNTERMINATED,
};
pub use emit::{HtmlEmitOptions, emit_html, emit_html_with_options};
pub use parser::{ParseResult, parse};
pub use segment::{CodeKind, Placeholder, ProtectedSegment, ProtectedTable};
pub use source_map::{Position, Range, SourceMap};
pub use span::Span;

/// Converts `text` to an HTML fragment using the default options.
///
/// Empty input yields an empty string. Malformed markup is kept as escaped
/// text; this never fails.
pub fn convert(text: &str) -> String {
    convert_with_options(text, &HtmlEmitOptions::default())
}

/// Same as [`convert`], treating absent input like empty input.
pub fn convert_opt(text: Option<&str>) -> String {
    text.map(convert).unwrap_or_default()
}

pub fn convert_with_options(text: &str, options: &HtmlEmitOptions) -> String {
    if text.is_empty() {
        return String::new();
    }
    let parsed = parse(text);
    emit_html_with_options(&parsed.document, options)
}
