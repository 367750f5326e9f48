use crate::ast::{Block, Document, Inline, ListItem};
use crate::escape::{escape_attr, escape_html};
use crate::segment::{CodeKind, Placeholder};

const BREAK: &str = "<br/>";

#[derive(Clone, Debug)]
pub struct HtmlEmitOptions {
    /// Wrap bare `http`, `https` and `file` URLs in anchors.
    pub autolink: bool,
    /// Render newlines inside code as `<br/>` instead of raw `\n`.
    pub code_line_breaks: bool,
    /// Upper bound on adjacent `<br/>` markers anywhere in the output.
    pub max_consecutive_breaks: usize,
}

impl Default for HtmlEmitOptions {
    fn default() -> Self {
        Self {
            autolink: true,
            code_line_breaks: true,
            max_consecutive_breaks: 2,
        }
    }
}

/// Renders a parsed document to an HTML fragment with default options.
pub fn emit_html(document: &Document) -> String {
    emit_html_with_options(document, &HtmlEmitOptions::default())
}

pub fn emit_html_with_options(document: &Document, options: &HtmlEmitOptions) -> String {
    let mut writer = HtmlWriter::new(document, options);
    for block in &document.blocks {
        writer.block(block);
    }
    writer.finish()
}

struct HtmlWriter<'d> {
    out: String,
    trailing_breaks: usize,
    document: &'d Document,
    options: &'d HtmlEmitOptions,
}

impl<'d> HtmlWriter<'d> {
    fn new(document: &'d Document, options: &'d HtmlEmitOptions) -> Self {
        Self {
            out: String::new(),
            trailing_breaks: 0,
            document,
            options,
        }
    }

    fn push(&mut self, html: &str) {
        if html.is_empty() {
            return;
        }
        self.out.push_str(html);
        self.trailing_breaks = 0;
    }

    fn line_break(&mut self) {
        if self.trailing_breaks < self.options.max_consecutive_breaks {
            self.out.push_str(BREAK);
            self.trailing_breaks += 1;
        }
    }

    fn trim_trailing_breaks(&mut self) {
        while self.trailing_breaks > 0 {
            self.out.truncate(self.out.len() - BREAK.len());
            self.trailing_breaks -= 1;
        }
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph { lines } => self.paragraph(lines),
            Block::Heading { level, content } => {
                self.push(&format!("<h{}>", level));
                self.inlines(content);
                self.push(&format!("</h{}>", level));
            }
            Block::List { items } => self.list(items),
            Block::CodeBlock(placeholder) => self.restore(*placeholder),
        }
    }

    fn paragraph(&mut self, lines: &[Vec<Inline>]) {
        let mark = self.out.len();
        let breaks_before = self.trailing_breaks;
        self.push("<p>");
        let body_start = self.out.len();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                self.line_break();
            }
            self.inlines(line);
        }
        if is_break_only(&self.out[body_start..]) {
            log::trace!("dropping empty paragraph");
            self.out.truncate(mark);
            self.trailing_breaks = breaks_before;
            return;
        }
        self.push("</p>");
    }

    fn list(&mut self, items: &[ListItem]) {
        // Bulleted and numbered items are rendered alike.
        self.push("<ul>");
        for item in items {
            self.push("<li>");
            self.inlines(&item.content);
            self.push("</li>");
        }
        self.push("</ul>");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.push(&escape_html(text)),
                Inline::Strong(children) => {
                    self.push("<b>");
                    self.inlines(children);
                    self.push("</b>");
                }
                Inline::Emph(children) => {
                    self.push("<i>");
                    self.inlines(children);
                    self.push("</i>");
                }
                Inline::Link { url, children } => {
                    self.push(&format!("<a href=\"{}\">", escape_attr(url)));
                    self.inlines(children);
                    self.push("</a>");
                }
                Inline::AutoLink { url } if self.options.autolink => {
                    self.push(&format!(
                        "<a href=\"{}\">{}</a>",
                        escape_attr(url),
                        escape_html(url)
                    ));
                }
                Inline::AutoLink { url } => self.push(&escape_html(url)),
                Inline::Code(placeholder) => self.restore(*placeholder),
            }
        }
    }

    /// Writes the protected segment behind `placeholder`, looked up by index.
    fn restore(&mut self, placeholder: Placeholder) {
        let document = self.document;
        let Some(segment) = document.protected.get(placeholder) else {
            log::warn!("no protected segment for {:?}", placeholder);
            return;
        };
        if placeholder.kind == CodeKind::Fenced {
            self.trim_trailing_breaks();
        }
        if !self.options.code_line_breaks {
            self.push(&segment.html);
            return;
        }
        for (idx, piece) in segment.html.split('\n').enumerate() {
            if idx > 0 {
                self.line_break();
            }
            self.push(piece.strip_suffix('\r').unwrap_or(piece));
        }
    }
}

fn is_break_only(html: &str) -> bool {
    let mut rest = html.trim();
    while let Some(next) = rest.strip_prefix(BREAK) {
        rest = next.trim_start();
    }
    rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::{HtmlEmitOptions, emit_html, emit_html_with_options, is_break_only};
    use crate::parser::parse;

    fn render(source: &str) -> String {
        emit_html(&parse(source).document)
    }

    #[test]
    fn break_only_detection() {
        assert!(is_break_only(""));
        assert!(is_break_only(" <br/> <br/>"));
        assert!(!is_break_only("<br/>x"));
    }

    #[test]
    fn paragraph_lines_join_with_breaks() {
        assert_eq!(render("a\nb\n\nc"), "<p>a<br/>b</p><p>c</p>");
    }

    #[test]
    fn multi_line_fence_uses_breaks_and_caps_them() {
        assert_eq!(
            render("```\na\n\n\n\nb\n```"),
            "<pre><code>a<br/><br/>b</code></pre>"
        );
    }

    #[test]
    fn raw_code_newlines_option() {
        let options = HtmlEmitOptions {
            code_line_breaks: false,
            ..Default::default()
        };
        assert_eq!(
            emit_html_with_options(&parse("```\na\nb\n```").document, &options),
            "<pre><code>a\nb</code></pre>"
        );
    }

    #[test]
    fn inline_fence_drops_the_break_before_it() {
        assert_eq!(
            render("a\n```x``` b"),
            "<p>a<pre><code>x</code></pre> b</p>"
        );
    }

    #[test]
    fn autolink_can_be_disabled() {
        let options = HtmlEmitOptions {
            autolink: false,
            ..Default::default()
        };
        assert_eq!(
            emit_html_with_options(&parse("see https://a.b/?x=1&y=2").document, &options),
            "<p>see https://a.b/?x=1&amp;y=2</p>"
        );
        assert_eq!(
            render("see https://a.b/?x=1&y=2"),
            "<p>see <a href=\"https://a.b/?x=1&amp;y=2\">https://a.b/?x=1&amp;y=2</a></p>"
        );
    }

    #[test]
    fn break_limit_is_configurable() {
        let options = HtmlEmitOptions {
            max_consecutive_breaks: 0,
            ..Default::default()
        };
        assert_eq!(
            emit_html_with_options(&parse("a\nb").document, &options),
            "<p>ab</p>"
        );
    }
}
