use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, W_CODE_UNTERMINATED, W_FENCE_UNTERMINATED,
};
use crate::escape::escape_html;
use crate::source_map::SourceMap;
use crate::span::Span;

const FENCE: &str = "```";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CodeKind {
    Fenced,
    Inline,
}

/// Stand-in for a protected segment inside the segment stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Placeholder {
    pub kind: CodeKind,
    pub index: usize,
}

/// Pre-rendered HTML for a code region, never touched by markup rules.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtectedSegment {
    pub html: String,
}

/// Protected segments in extraction order, one list per kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtectedTable {
    fenced: Vec<ProtectedSegment>,
    inline: Vec<ProtectedSegment>,
}

impl ProtectedTable {
    fn push(&mut self, kind: CodeKind, segment: ProtectedSegment) -> Placeholder {
        let list = self.list_mut(kind);
        list.push(segment);
        Placeholder {
            kind,
            index: list.len() - 1,
        }
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&ProtectedSegment> {
        match placeholder.kind {
            CodeKind::Fenced => self.fenced.get(placeholder.index),
            CodeKind::Inline => self.inline.get(placeholder.index),
        }
    }

    pub fn count(&self, kind: CodeKind) -> usize {
        match kind {
            CodeKind::Fenced => self.fenced.len(),
            CodeKind::Inline => self.inline.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.fenced.len() + self.inline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, kind: CodeKind) -> &mut Vec<ProtectedSegment> {
        match kind {
            CodeKind::Fenced => &mut self.fenced,
            CodeKind::Inline => &mut self.inline,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    /// Unprotected source text starting at byte `start`.
    Literal { start: usize, text: &'a str },
    Protected(Placeholder),
}

pub struct Extraction<'a> {
    pub segments: Vec<Segment<'a>>,
    pub table: ProtectedTable,
}

/// Splits `source` into literal text and protected code segments.
///
/// Fenced blocks are taken first over the whole input; inline spans are
/// then searched for in the literal text that remains, so backticks inside
/// a fence never start an inline span.
pub fn extract<'a>(
    source: &'a str,
    source_map: &SourceMap<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Extraction<'a> {
    let mut table = ProtectedTable::default();
    let (fenced, open_fence) = extract_fences(source, &mut table);

    if let Some(open) = open_fence {
        diagnostics.push(Diagnostic::new(
            source_map.range(Span::new(open, open + FENCE.len())),
            DiagnosticSeverity::Warning,
            W_FENCE_UNTERMINATED,
            "code fence is never closed; it is kept as text",
        ));
    }

    let mut segments = Vec::with_capacity(fenced.len());
    for segment in fenced {
        match segment {
            Segment::Literal { start, text } => {
                let unmatched = extract_inline_code(start, text, &mut table, &mut segments);
                let Some(offset) = unmatched else {
                    continue;
                };
                let in_open_fence = open_fence
                    .map(|open| (open..open + FENCE.len()).contains(&offset))
                    .unwrap_or(false);
                if !in_open_fence {
                    diagnostics.push(Diagnostic::new(
                        source_map.range(Span::new(offset, offset + 1)),
                        DiagnosticSeverity::Warning,
                        W_CODE_UNTERMINATED,
                        "backtick has no closing partner; it is kept as text",
                    ));
                }
            }
            Segment::Protected(_) => segments.push(segment),
        }
    }

    log::debug!(
        "extracted {} fenced and {} inline code segments into {} segments",
        table.count(CodeKind::Fenced),
        table.count(CodeKind::Inline),
        segments.len()
    );

    Extraction { segments, table }
}

/// Returns the segments and the offset of an opening fence that never closes.
fn extract_fences<'a>(
    source: &'a str,
    table: &mut ProtectedTable,
) -> (Vec<Segment<'a>>, Option<usize>) {
    let mut segments = Vec::new();
    let mut last = 0;
    let mut open_fence = None;

    while let Some(rel) = source[last..].find(FENCE) {
        let open = last + rel;
        let body_start = open + FENCE.len();
        let Some(close_rel) = source[body_start..].find(FENCE) else {
            open_fence = Some(open);
            break;
        };
        let close = body_start + close_rel;
        let end = close + FENCE.len();

        push_literal(&mut segments, source, last, open);
        let body = trim_blank_lines(&source[body_start..close]);
        let placeholder = table.push(
            CodeKind::Fenced,
            ProtectedSegment {
                html: format!("<pre><code>{}</code></pre>", escape_html(body)),
            },
        );
        log::trace!("fenced code {:?} at {}..{}", placeholder, open, end);
        segments.push(Segment::Protected(placeholder));
        last = end;
    }

    push_literal(&mut segments, source, last, source.len());
    (segments, open_fence)
}

/// Returns the absolute offset of the first backtick that has no partner.
fn extract_inline_code<'a>(
    base: usize,
    text: &'a str,
    table: &mut ProtectedTable,
    out: &mut Vec<Segment<'a>>,
) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut last = 0;
    let mut i = 0;
    let mut unmatched = None;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        match text[i + 1..].find('`') {
            // "``" encloses nothing; the second backtick may still open a span.
            Some(0) => i += 1,
            Some(rel) => {
                let close = i + 1 + rel;
                if i > last {
                    out.push(Segment::Literal {
                        start: base + last,
                        text: &text[last..i],
                    });
                }
                let placeholder = table.push(
                    CodeKind::Inline,
                    ProtectedSegment {
                        html: format!("<code>{}</code>", escape_html(&text[i + 1..close])),
                    },
                );
                out.push(Segment::Protected(placeholder));
                i = close + 1;
                last = i;
            }
            None => {
                unmatched = Some(base + i);
                break;
            }
        }
    }

    if last < text.len() {
        out.push(Segment::Literal {
            start: base + last,
            text: &text[last..],
        });
    }
    unmatched
}

fn push_literal<'a>(segments: &mut Vec<Segment<'a>>, source: &'a str, start: usize, end: usize) {
    if start < end {
        segments.push(Segment::Literal {
            start,
            text: &source[start..end],
        });
    }
}

fn trim_blank_lines(body: &str) -> &str {
    let is_newline = |ch: char| ch == '\n' || ch == '\r';
    body.trim_start_matches(is_newline).trim_end_matches(is_newline)
}

#[cfg(test)]
mod tests {
    use super::{CodeKind, Placeholder, Segment, extract};
    use crate::diagnostic::{W_CODE_UNTERMINATED, W_FENCE_UNTERMINATED};
    use crate::source_map::SourceMap;

    fn run(source: &str) -> (super::Extraction<'_>, Vec<&'static str>) {
        let map = SourceMap::new(source);
        let mut diagnostics = Vec::new();
        let extraction = extract(source, &map, &mut diagnostics);
        let codes = diagnostics.iter().map(|diag| diag.code).collect();
        (extraction, codes)
    }

    #[test]
    fn fences_are_taken_before_inline_spans() {
        let (extraction, codes) = run("a ```\nx `y` z\n``` `b`");
        assert!(codes.is_empty());
        assert_eq!(extraction.table.count(CodeKind::Fenced), 1);
        assert_eq!(extraction.table.count(CodeKind::Inline), 1);

        let fenced = Placeholder {
            kind: CodeKind::Fenced,
            index: 0,
        };
        assert_eq!(
            extraction.table.get(fenced).map(|seg| seg.html.as_str()),
            Some("<pre><code>x `y` z</code></pre>")
        );
        assert_eq!(
            extraction.segments,
            vec![
                Segment::Literal {
                    start: 0,
                    text: "a "
                },
                Segment::Protected(fenced),
                Segment::Literal {
                    start: 17,
                    text: " "
                },
                Segment::Protected(Placeholder {
                    kind: CodeKind::Inline,
                    index: 0
                }),
            ]
        );
    }

    #[test]
    fn fence_strips_only_blank_lines() {
        let (extraction, _) = run("```\n\n  indented\n\n```");
        let segment = extraction.table.get(Placeholder {
            kind: CodeKind::Fenced,
            index: 0,
        });
        assert_eq!(
            segment.map(|seg| seg.html.as_str()),
            Some("<pre><code>  indented</code></pre>")
        );
    }

    #[test]
    fn code_is_escaped_once() {
        let (extraction, _) = run("`a<b && c>d`");
        let segment = extraction.table.get(Placeholder {
            kind: CodeKind::Inline,
            index: 0,
        });
        assert_eq!(
            segment.map(|seg| seg.html.as_str()),
            Some("<code>a&lt;b &amp;&amp; c&gt;d</code>")
        );
    }

    #[test]
    fn empty_pair_does_not_open_a_span() {
        let (extraction, codes) = run("``x`");
        assert!(codes.is_empty());
        assert_eq!(extraction.table.count(CodeKind::Inline), 1);
        assert_eq!(
            extraction.segments.first(),
            Some(&Segment::Literal {
                start: 0,
                text: "`"
            })
        );
    }

    #[test]
    fn unterminated_fence_reports_once() {
        let (extraction, codes) = run("```rust\nfn main() {}");
        assert_eq!(codes, vec![W_FENCE_UNTERMINATED]);
        assert!(extraction.table.is_empty());
        assert_eq!(extraction.segments.len(), 1);
    }

    #[test]
    fn stray_backtick_reports() {
        let (extraction, codes) = run("`a` and ` alone");
        assert_eq!(codes, vec![W_CODE_UNTERMINATED]);
        assert_eq!(extraction.table.len(), 1);
    }
}
