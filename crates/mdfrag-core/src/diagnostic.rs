use crate::source_map::Range;

pub const W_FENCE_UNTERMINATED: &str = "W_FENCE_UNTERMINATED";
pub const W_CODE_UNTERMINATED: &str = "W_CODE_UNTERMINATED";
pub const W_EMPHASIS_UNMATCHED: &str = "W_EMPHASIS_UNMATCHED";

/// A piece of markup that was left as literal text.
///
/// Conversion never fails; diagnostics only explain why some input did not
/// turn into markup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        range: Range,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            severity,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticSeverity {
    Warning,
    /// Literal markers that are often intentional, e.g. `2 * 3`.
    Info,
}

impl DiagnosticSeverity {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        }
    }
}
