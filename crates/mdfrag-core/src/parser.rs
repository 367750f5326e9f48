use crate::ast::{Block, Document, Inline, InlineSeq, ListItem, ListMarker};
use crate::diagnostic::{Diagnostic, DiagnosticSeverity, W_EMPHASIS_UNMATCHED};
use crate::segment::{CodeKind, Extraction, Placeholder, Segment, extract};
use crate::source_map::SourceMap;
use crate::span::Span;

const AUTOLINK_SCHEMES: [&str; 3] = ["http://", "https://", "file://"];

pub struct ParseResult {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> ParseResult {
    let source_map = SourceMap::new(source);
    let mut diagnostics = Vec::new();
    let Extraction { segments, table } = extract(source, &source_map, &mut diagnostics);

    let lines = split_lines(&segments);
    let mut parser = Parser {
        source_map: &source_map,
        diagnostics,
    };
    let blocks = parser.parse_blocks(&lines);
    log::debug!(
        "parsed {} lines into {} blocks ({} diagnostics)",
        lines.len(),
        blocks.len(),
        parser.diagnostics.len()
    );

    ParseResult {
        document: Document {
            blocks,
            protected: table,
        },
        diagnostics: parser.diagnostics,
    }
}

/// One unit of a line: a source char, or a whole protected segment.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Atom {
    Char { ch: char, offset: usize },
    Code(Placeholder),
}

impl Atom {
    fn is(&self, expected: char) -> bool {
        matches!(self, Atom::Char { ch, .. } if *ch == expected)
    }

    fn char(&self) -> Option<char> {
        match self {
            Atom::Char { ch, .. } => Some(*ch),
            Atom::Code(_) => None,
        }
    }
}

struct Parser<'m, 's> {
    source_map: &'m SourceMap<'s>,
    diagnostics: Vec<Diagnostic>,
}

impl Parser<'_, '_> {
    fn parse_blocks(&mut self, lines: &[Vec<Atom>]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut paragraph: Vec<InlineSeq> = Vec::new();

        for (idx, atoms) in lines.iter().enumerate() {
            log::trace!("line {}: {} atoms", idx + 1, atoms.len());

            if is_blank(atoms) {
                flush_paragraph(&mut blocks, &mut paragraph);
                continue;
            }

            if let Some((level, rest)) = heading_prefix(atoms) {
                flush_paragraph(&mut blocks, &mut paragraph);
                let content = self.parse_inlines(rest, false);
                blocks.push(Block::Heading { level, content });
                continue;
            }

            if let Some((marker, rest)) = list_marker(atoms) {
                flush_paragraph(&mut blocks, &mut paragraph);
                let item = ListItem {
                    marker,
                    content: self.parse_inlines(rest, false),
                };
                // Items separated only by blank lines stay in one list.
                match blocks.last_mut() {
                    Some(Block::List { items }) => items.push(item),
                    _ => blocks.push(Block::List { items: vec![item] }),
                }
                continue;
            }

            if let Some(placeholder) = lone_fence(atoms) {
                flush_paragraph(&mut blocks, &mut paragraph);
                blocks.push(Block::CodeBlock(placeholder));
                continue;
            }

            paragraph.push(self.parse_inlines(atoms, false));
        }

        flush_paragraph(&mut blocks, &mut paragraph);
        blocks
    }

    fn parse_inlines(&mut self, atoms: &[Atom], in_link: bool) -> InlineSeq {
        let mut out = Vec::new();
        let mut text = String::new();
        let mut brackets = NextChar::new(']');
        let mut parens = NextChar::new(')');
        let mut i = 0;

        while i < atoms.len() {
            let (ch, offset) = match atoms[i] {
                Atom::Code(placeholder) => {
                    flush_text(&mut out, &mut text);
                    out.push(Inline::Code(placeholder));
                    i += 1;
                    continue;
                }
                Atom::Char { ch, offset } => (ch, offset),
            };

            let parsed = match ch {
                '*' | '_' => {
                    let parsed = self.parse_emphasis(atoms, i, ch, in_link);
                    if parsed.is_none() && (i == 0 || !atoms[i - 1].is(ch)) {
                        self.push_unmatched(ch, offset);
                    }
                    parsed
                }
                '[' => self.parse_link(atoms, i, &mut brackets, &mut parens),
                'h' | 'f' if !in_link => match_autolink(atoms, i),
                _ => None,
            };

            match parsed {
                Some((inline, next)) => {
                    flush_text(&mut out, &mut text);
                    out.push(inline);
                    i = next;
                }
                None => {
                    text.push(ch);
                    i += 1;
                }
            }
        }

        flush_text(&mut out, &mut text);
        out
    }

    /// Tries the triple, double and single marker at `start`, in that order.
    fn parse_emphasis(
        &mut self,
        atoms: &[Atom],
        start: usize,
        marker: char,
        in_link: bool,
    ) -> Option<(Inline, usize)> {
        for width in [3usize, 2, 1] {
            if !run_at(atoms, start, marker, width) {
                continue;
            }
            let content_start = start + width;
            // At least one atom of content.
            let Some(close) = find_closer(atoms, content_start + 1, marker, width) else {
                continue;
            };
            let children = self.parse_inlines(&atoms[content_start..close], in_link);
            let inline = match width {
                3 => Inline::Strong(vec![Inline::Emph(children)]),
                2 => Inline::Strong(children),
                _ => Inline::Emph(children),
            };
            return Some((inline, close + width));
        }
        None
    }

    /// `[label](url)`; the label is non-empty up to the first `]`, the url
    /// non-empty up to the first `)`.
    fn parse_link(
        &mut self,
        atoms: &[Atom],
        start: usize,
        brackets: &mut NextChar,
        parens: &mut NextChar,
    ) -> Option<(Inline, usize)> {
        let label_start = start + 1;
        let label_end = brackets.find(atoms, label_start)?;
        if label_end == label_start || !atoms.get(label_end + 1)?.is('(') {
            return None;
        }
        let url_start = label_end + 2;
        let url_end = parens.find(atoms, url_start)?;
        if url_end == url_start {
            return None;
        }
        let url = atoms[url_start..url_end]
            .iter()
            .map(Atom::char)
            .collect::<Option<String>>()?;
        let children = self.parse_inlines(&atoms[label_start..label_end], true);
        Some((Inline::Link { url, children }, url_end + 1))
    }

    fn push_unmatched(&mut self, marker: char, offset: usize) {
        let span = Span::new(offset, offset + marker.len_utf8());
        self.diagnostics.push(Diagnostic::new(
            self.source_map.range(span),
            DiagnosticSeverity::Info,
            W_EMPHASIS_UNMATCHED,
            format!("`{}` has no closing marker on this line; it is kept as text", marker),
        ));
    }
}

fn split_lines(segments: &[Segment<'_>]) -> Vec<Vec<Atom>> {
    let mut lines = vec![Vec::new()];
    for segment in segments {
        match *segment {
            Segment::Literal { start, text } => {
                for (idx, ch) in text.char_indices() {
                    let Some(line) = lines.last_mut() else {
                        continue;
                    };
                    if ch != '\n' {
                        line.push(Atom::Char {
                            ch,
                            offset: start + idx,
                        });
                        continue;
                    }
                    if line.last().is_some_and(|atom| atom.is('\r')) {
                        line.pop();
                    }
                    lines.push(Vec::new());
                }
            }
            Segment::Protected(placeholder) => {
                if let Some(line) = lines.last_mut() {
                    line.push(Atom::Code(placeholder));
                }
            }
        }
    }
    lines
}

fn flush_paragraph(blocks: &mut Vec<Block>, paragraph: &mut Vec<InlineSeq>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph {
            lines: std::mem::take(paragraph),
        });
    }
}

fn flush_text(out: &mut InlineSeq, text: &mut String) {
    if !text.is_empty() {
        out.push(Inline::Text(std::mem::take(text)));
    }
}

fn is_blank(atoms: &[Atom]) -> bool {
    atoms
        .iter()
        .all(|atom| atom.char().is_some_and(char::is_whitespace))
}

/// `### `, `## ` or `# ` at the very start of the line.
fn heading_prefix(atoms: &[Atom]) -> Option<(u8, &[Atom])> {
    let hashes = atoms.iter().take_while(|atom| atom.is('#')).count();
    if !(1..=3).contains(&hashes) || !atoms.get(hashes)?.is(' ') {
        return None;
    }
    Some((hashes as u8, &atoms[hashes + 1..]))
}

/// `* `, `- ` or `<digits>. ` at the very start of the line.
fn list_marker(atoms: &[Atom]) -> Option<(ListMarker, &[Atom])> {
    let first = atoms.first()?.char()?;
    if matches!(first, '*' | '-') && atoms.get(1)?.is(' ') {
        return Some((ListMarker::Bullet(first), &atoms[2..]));
    }

    let digits = atoms
        .iter()
        .take_while(|atom| atom.char().is_some_and(|ch| ch.is_ascii_digit()))
        .count();
    if digits == 0 || !atoms.get(digits)?.is('.') || !atoms.get(digits + 1)?.is(' ') {
        return None;
    }
    let number = atoms[..digits]
        .iter()
        .filter_map(|atom| atom.char()?.to_digit(10))
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        });
    Some((ListMarker::Ordered(number), &atoms[digits + 2..]))
}

/// A fenced segment with nothing but whitespace around it on its line.
fn lone_fence(atoms: &[Atom]) -> Option<Placeholder> {
    let mut found = None;
    for atom in atoms {
        match atom {
            Atom::Code(placeholder) if placeholder.kind == CodeKind::Fenced && found.is_none() => {
                found = Some(*placeholder);
            }
            Atom::Char { ch, .. } if ch.is_whitespace() => {}
            _ => return None,
        }
    }
    found
}

/// Remembers the last lookup of `target` so a line is scanned once overall,
/// however many openers search it.
struct NextChar {
    target: char,
    /// `Some(None)` once a scan reached the end of the line without a match.
    last: Option<Option<usize>>,
}

impl NextChar {
    fn new(target: char) -> Self {
        Self { target, last: None }
    }

    /// First `target` at or after `from`. Callers must ask with a
    /// non-decreasing `from`.
    fn find(&mut self, atoms: &[Atom], from: usize) -> Option<usize> {
        match self.last {
            Some(Some(found)) if found >= from => return Some(found),
            Some(None) => return None,
            _ => {}
        }
        let found = atoms
            .get(from..)?
            .iter()
            .position(|atom| atom.is(self.target))
            .map(|rel| from + rel);
        self.last = Some(found);
        found
    }
}

/// Length of the marker run starting at `start`.
fn run_len(atoms: &[Atom], start: usize, marker: char) -> usize {
    atoms[start..]
        .iter()
        .take_while(|atom| atom.is(marker))
        .count()
}

/// Nearest run that can close a `width` opener, searching from `from`.
///
/// Narrower runs never close it. A wider run that has a partner of its own
/// width further on is skipped together with everything up to that partner,
/// so `*a **b** c*` closes on the last `*`. A wider run without a partner
/// closes with its first `width` markers.
fn find_closer(atoms: &[Atom], from: usize, marker: char, width: usize) -> Option<usize> {
    let mut idx = from;
    while idx < atoms.len() {
        if !atoms[idx].is(marker) {
            idx += 1;
            continue;
        }
        let run = run_len(atoms, idx, marker);
        if run == width {
            return Some(idx);
        }
        if run > width {
            let inner = run.min(3);
            match find_closer(atoms, idx + run + 1, marker, inner) {
                Some(partner) => {
                    idx = partner + run_len(atoms, partner, marker);
                    continue;
                }
                None => return Some(idx),
            }
        }
        idx += run;
    }
    None
}

fn run_at(atoms: &[Atom], start: usize, marker: char, width: usize) -> bool {
    atoms
        .get(start..start + width)
        .is_some_and(|run| run.iter().all(|atom| atom.is(marker)))
}

fn match_autolink(atoms: &[Atom], start: usize) -> Option<(Inline, usize)> {
    // A quote right before the scheme means the URL is already an attribute value.
    if start > 0 && (atoms[start - 1].is('"') || atoms[start - 1].is('\'')) {
        return None;
    }
    let scheme = AUTOLINK_SCHEMES.iter().find(|scheme| {
        scheme
            .chars()
            .enumerate()
            .all(|(idx, expected)| atoms.get(start + idx).is_some_and(|a| a.is(expected)))
    })?;
    let body_start = start + scheme.len();
    let end = body_start
        + atoms[body_start..]
            .iter()
            .take_while(|atom| atom.char().is_some_and(|ch| !ch.is_whitespace() && ch != '<'))
            .count();
    if end == body_start {
        return None;
    }
    let url = atoms[start..end].iter().filter_map(Atom::char).collect();
    Some((Inline::AutoLink { url }, end))
}
