/// Escapes `&`, `<` and `>` in that order.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Like [`escape_html`], and also escapes `"` so the value can sit in a quoted attribute.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_attr, escape_html};

    #[test]
    fn ampersand_is_not_double_escaped() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn attr_escapes_quotes() {
        assert_eq!(
            escape_attr("http://x/?q=\"a\"&b"),
            "http://x/?q=&quot;a&quot;&amp;b"
        );
        assert_eq!(escape_html("\"'"), "\"'");
    }
}
