use smol_str::SmolStr;

use crate::span::Span;

/// A literal or reconstructed-expression value, e.g. a `DEFAULT` clause or a
/// blob-literal default. `Unknown` carries whatever `rebuild_sql` produced
/// for the expression verbatim; no evaluation is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    String,
    Blob,
    Keyword,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub kind: ValueKind,
    pub text: SmolStr,
    pub span: Span,
}

impl Value {
    pub fn new(kind: ValueKind, text: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}
