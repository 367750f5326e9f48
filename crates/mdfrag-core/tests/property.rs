use mdfrag_core::{convert, parse};
use proptest::prelude::*;

proptest! {
    #[test]
    fn never_panics_and_caps_breaks(source in "[a-z#*_`\\[\\]()\\-. \n:/<>&'\"0-9]{0,96}") {
        let html = convert(&source);
        prop_assert!(!html.contains("<br/><br/><br/>"), "{:?} -> {}", source, html);
        prop_assert_eq!(html.trim(), html.as_str());
    }

    #[test]
    fn plain_text_is_one_paragraph(source in "[a-zA-Z0-9]([a-zA-Z0-9 ,;!?]{0,40}[a-zA-Z0-9])?") {
        prop_assert_eq!(convert(&source), format!("<p>{}</p>", source));
    }

    #[test]
    fn protected_segments_render_exactly_once(source in "[a-z*_`\n ]{0,64}") {
        let parsed = parse(&source);
        let html = convert(&source);
        prop_assert_eq!(html.matches("<code>").count(), parsed.document.protected.len());
    }

    #[test]
    fn no_raw_angle_brackets_from_input(source in "[a-z<>& \n]{0,64}") {
        let html = convert(&source);
        let stripped = html
            .replace("<p>", "")
            .replace("</p>", "")
            .replace("<br/>", "");
        prop_assert!(!stripped.contains('<') && !stripped.contains('>'), "{}", html);
    }
}
