use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOptions {
    autolink: Option<bool>,
    code_line_breaks: Option<bool>,
    max_consecutive_breaks: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    html: String,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsDiagnostic {
    code: String,
    message: String,
    severity: String,
    range: JsRange,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsRange {
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
}

/// `null` and `undefined` convert to an empty string.
#[wasm_bindgen(js_name = markdownToHtml)]
pub fn markdown_to_html(text: Option<String>) -> String {
    mdfrag_core::convert_opt(text.as_deref())
}

#[wasm_bindgen]
pub fn render_html(source: &str) -> Result<JsValue, JsValue> {
    render_html_with_options(source, JsValue::UNDEFINED)
}

#[wasm_bindgen]
pub fn render_html_with_options(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let emit_options = options_from_js(options)?;
    let result = render(source, &emit_options);
    serde_wasm_bindgen::to_value(&result).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn render(source: &str, options: &mdfrag_core::HtmlEmitOptions) -> RenderResult {
    let parsed = mdfrag_core::parse(source);
    let html = mdfrag_core::emit_html_with_options(&parsed.document, options);

    let diagnostics = parsed
        .diagnostics
        .into_iter()
        .map(|diag| JsDiagnostic {
            code: diag.code.to_string(),
            message: diag.message,
            severity: diag.severity.label().to_string(),
            range: JsRange {
                start_line: diag.range.start.line,
                start_col: diag.range.start.character,
                end_line: diag.range.end.line,
                end_col: diag.range.end.character,
            },
        })
        .collect();

    RenderResult { html, diagnostics }
}

fn options_from_js(value: JsValue) -> Result<mdfrag_core::HtmlEmitOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(mdfrag_core::HtmlEmitOptions::default());
    }
    let parsed: RenderOptions =
        serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(apply_options(parsed))
}

fn apply_options(parsed: RenderOptions) -> mdfrag_core::HtmlEmitOptions {
    let mut out = mdfrag_core::HtmlEmitOptions::default();
    if let Some(autolink) = parsed.autolink {
        out.autolink = autolink;
    }
    if let Some(code_line_breaks) = parsed.code_line_breaks {
        out.code_line_breaks = code_line_breaks;
    }
    if let Some(max) = parsed.max_consecutive_breaks {
        out.max_consecutive_breaks = max;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{RenderOptions, apply_options, markdown_to_html, render};

    #[test]
    fn absent_text_is_empty() {
        assert_eq!(markdown_to_html(None), "");
        assert_eq!(markdown_to_html(Some("*x*".to_string())), "<p><i>x</i></p>");
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let options = apply_options(RenderOptions {
            autolink: Some(false),
            code_line_breaks: None,
            max_consecutive_breaks: None,
        });
        assert!(!options.autolink);
        assert!(options.code_line_breaks);
        assert_eq!(options.max_consecutive_breaks, 2);
    }

    #[test]
    fn render_reports_diagnostics() {
        let result = render("`open", &Default::default());
        assert_eq!(result.html, "<p>`open</p>");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "W_CODE_UNTERMINATED");
        assert_eq!(result.diagnostics[0].severity, "warning");
    }
}
