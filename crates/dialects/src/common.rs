use sqlfix_core::keywords::KeywordTable;
use sqlfix_core::model::{normalize_identifier, Catalog, ForeignKeyRef, Value, ValueKind};
use sqlfix_core::rebuild::rebuild_sql;
use sqlfix_core::token::{Token, TokenKind};
use sqlfix_core::{Diagnostic, DiagnosticCode, Diagnostics, Severity, Span};

/// Shared cursor + accumulator state for all three dialect parsers. Each
/// dialect's parser owns one of these and adds its own grammar on top
/// through the helper methods here, per the shared-shape described for the
/// parsers: tokens, position, partial catalog, diagnostics, pending doc,
/// path.
pub struct ParserState<'k> {
    pub tokens: Vec<Token>,
    pub pos: usize,
    pub path: String,
    pub catalog: Catalog,
    pub diagnostics: Diagnostics,
    pub pending_doc: Option<(String, Span)>,
    pub keywords: &'k dyn KeywordTable,
}

impl<'k> ParserState<'k> {
    pub fn new(path: &str, tokens: Vec<Token>, keywords: &'k dyn KeywordTable) -> Self {
        Self {
            tokens,
            pos: 0,
            path: path.to_string(),
            catalog: Catalog::new(),
            diagnostics: Vec::new(),
            pending_doc: None,
            keywords,
        }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    pub fn check_keyword(&self, word: &str) -> bool {
        self.peek().is_keyword(word)
    }

    pub fn check_symbol(&self, sym: &str) -> bool {
        self.peek().is_symbol(sym)
    }

    pub fn eat_keyword(&mut self, word: &str) -> bool {
        if self.check_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_symbol(&mut self, sym: &str) -> bool {
        if self.check_symbol(sym) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Accepts a `DocComment` token if present and buffers it; returns
    /// whether one was consumed.
    pub fn eat_doc_comment(&mut self) -> bool {
        if self.peek().kind == TokenKind::DocComment {
            let tok = self.advance();
            self.pending_doc = Some((tok.text.to_string(), tok.span));
            true
        } else {
            false
        }
    }

    pub fn take_pending_doc(&mut self) -> Option<String> {
        self.pending_doc.take().map(|(text, _)| text)
    }

    pub fn discard_pending_doc(&mut self) {
        self.pending_doc = None;
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        let span = self.peek().span.clone();
        self.diagnostics.push(Diagnostic::new(Severity::Error, code, &span, message));
    }

    pub fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        let span = self.peek().span.clone();
        self.diagnostics.push(Diagnostic::new(Severity::Warning, code, &span, message));
    }

    /// Accepts either a bare identifier or a keyword-as-identifier token
    /// (tolerated when the surrounding grammar makes the role unambiguous,
    /// e.g. a column name position).
    pub fn parse_name(&mut self) -> Option<Token> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::Keyword => Some(self.advance()),
            _ => None,
        }
    }

    /// Parses a possibly schema-qualified name, returning the bare trailing
    /// segment's token (qualifiers are recognized and normalized away for
    /// catalog lookup, per the common grammar rule).
    pub fn parse_qualified_name(&mut self) -> Option<Token> {
        let first = self.parse_name()?;
        if self.eat_symbol(".") {
            self.parse_name()
        } else {
            Some(first)
        }
    }

    /// Parses `(name [ASC|DESC] [COLLATE ident] [NULLS FIRST|LAST] , ...)`,
    /// returning the bare column names in order. Ordering suffixes are
    /// recognized and discarded.
    pub fn parse_column_name_list(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        if !self.eat_symbol("(") {
            return names;
        }
        loop {
            if self.check_symbol(")") || self.is_eof() {
                break;
            }
            if let Some(tok) = self.parse_name() {
                names.push(tok.text.to_string());
            } else {
                self.advance();
            }
            if self.eat_keyword("COLLATE") {
                self.parse_name();
            }
            if self.eat_keyword("ASC") || self.eat_keyword("DESC") {}
            if self.eat_keyword("NULLS") {
                let _ = self.eat_keyword("FIRST") || self.eat_keyword("LAST");
            }
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.eat_symbol(")");
        names
    }

    /// Consumes from the current `(` through its matching `)`, returning the
    /// consumed tokens including both parens. Caller must be positioned on
    /// `(`. Handles nesting.
    pub fn consume_balanced_parens(&mut self) -> Vec<Token> {
        let mut depth = 0i32;
        let mut out = Vec::new();
        loop {
            if self.is_eof() {
                break;
            }
            let tok = self.advance();
            if tok.is_symbol("(") {
                depth += 1;
            } else if tok.is_symbol(")") {
                depth -= 1;
            }
            out.push(tok);
            if depth == 0 {
                break;
            }
        }
        out
    }

    /// Reconstructs a type-spec textually until a clause-boundary keyword or
    /// symbol, consuming matched parens greedily (`VARCHAR(255)`,
    /// `NUMERIC(10,2)`, `ENUM('a','b')`). `boundary_keywords` is the
    /// dialect's clause-boundary set.
    pub fn parse_type_spec(&mut self, boundary_keywords: &[&str]) -> String {
        let mut collected = Vec::new();
        loop {
            let tok = self.peek().clone();
            if tok.kind == TokenKind::Eof || tok.is_symbol(",") || tok.is_symbol(")") {
                break;
            }
            if tok.kind == TokenKind::Keyword && boundary_keywords.contains(&tok.text.as_str()) {
                break;
            }
            if tok.is_symbol("(") {
                collected.extend(self.consume_balanced_parens());
                continue;
            }
            collected.push(self.advance());
        }
        rebuild_sql(&collected)
    }

    /// Parses a `DEFAULT` value: a bare literal becomes a typed `Value`;
    /// anything else is reconstructed as `Value::Unknown` up to the next
    /// clause boundary, respecting balanced parens.
    pub fn parse_default_value(&mut self, boundary_keywords: &[&str]) -> Value {
        let tok = self.peek().clone();
        let is_simple_literal = matches!(tok.kind, TokenKind::Number | TokenKind::String | TokenKind::Blob)
            || tok.is_keyword("TRUE")
            || tok.is_keyword("FALSE")
            || tok.is_keyword("NULL");
        if is_simple_literal && !self.peek_at(1).is_symbol("(") {
            self.advance();
            let kind = match tok.kind {
                TokenKind::Number => ValueKind::Number,
                TokenKind::String => ValueKind::String,
                TokenKind::Blob => ValueKind::Blob,
                _ => ValueKind::Keyword,
            };
            return Value::new(kind, tok.text, tok.span);
        }
        let start_span = tok.span.clone();
        let mut collected = Vec::new();
        loop {
            let t = self.peek().clone();
            if t.kind == TokenKind::Eof || t.is_symbol(",") || t.is_symbol(")") {
                break;
            }
            if t.kind == TokenKind::Keyword && boundary_keywords.contains(&t.text.as_str()) {
                break;
            }
            if t.is_symbol("(") {
                collected.extend(self.consume_balanced_parens());
                continue;
            }
            collected.push(self.advance());
        }
        let mut span = start_span;
        if let Some(last) = collected.last() {
            span.extend(&last.span);
        }
        Value::new(ValueKind::Unknown, rebuild_sql(&collected), span)
    }

    /// `REFERENCES table [(cols)]`. Caller has already consumed the
    /// `REFERENCES` keyword.
    pub fn parse_foreign_key_ref(&mut self) -> Option<ForeignKeyRef> {
        let name_tok = self.parse_qualified_name()?;
        let columns = if self.check_symbol("(") {
            self.parse_column_name_list()
        } else {
            Vec::new()
        };
        self.consume_action_clauses();
        Some(ForeignKeyRef {
            table: name_tok.text.clone(),
            table_canonical: normalize_identifier(&name_tok.text).into(),
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    /// Consumes `ON DELETE|UPDATE CASCADE|RESTRICT|SET NULL|SET DEFAULT|NO ACTION`
    /// clauses, discarding them, per the common grammar rule that action
    /// clauses are consumed but the reference itself is retained.
    pub fn consume_action_clauses(&mut self) {
        loop {
            if self.eat_keyword("ON") {
                let _ = self.eat_keyword("DELETE") || self.eat_keyword("UPDATE");
                if self.eat_keyword("CASCADE") || self.eat_keyword("RESTRICT") {
                    continue;
                }
                if self.eat_keyword("SET") {
                    let _ = self.eat_keyword("NULL") || self.eat_keyword("DEFAULT");
                    continue;
                }
                if self.eat_keyword("NO") {
                    self.eat_keyword("ACTION");
                    continue;
                }
                continue;
            }
            break;
        }
    }

    /// Skips a balanced-paren group for `CHECK(...)`; the expression is not
    /// retained.
    pub fn skip_check_expr(&mut self) {
        if self.check_symbol("(") {
            self.consume_balanced_parens();
        }
    }

    /// Error recovery: advances until the next `;` (consumed) or a
    /// top-level `CREATE`/`ALTER` (kept), so one syntax error costs one
    /// statement, not the whole file.
    pub fn sync(&mut self) {
        loop {
            if self.is_eof() {
                return;
            }
            if self.check_symbol(";") {
                self.advance();
                return;
            }
            if self.check_keyword("CREATE") || self.check_keyword("ALTER") {
                return;
            }
            self.advance();
        }
    }
}
