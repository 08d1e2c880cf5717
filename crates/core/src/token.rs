use smol_str::SmolStr;

use crate::span::Span;

/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Invalid,
    Identifier,
    Keyword,
    Number,
    String,
    Blob,
    Symbol,
    Param,
    DocComment,
    Eof,
}

/// A single lexical token.
///
/// `text` holds the original-case, still-quoted source text for identifiers
/// and literals; keyword text is normalized to uppercase. Use
/// [`crate::model::normalize_identifier`] to strip quoting and lowercase an
/// identifier for canonical lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Whether this token is the keyword `word` (case-insensitive; keyword
    /// text is already uppercased, so this compares against an uppercase
    /// literal for clarity at call sites).
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == sym
    }
}
