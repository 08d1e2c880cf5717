use smol_str::SmolStr;

use crate::error::TokenizeError;
use crate::keywords::KeywordTable;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Character-at-a-time cursor with line/column tracking. `peek`/`bump` count
/// runes, not bytes, and a `\r\n` pair advances the line counter once.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    fn mark(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    /// Consume and return one char, updating line/col. A `\r` that is
    /// immediately followed by `\n` is consumed as a single newline.
    fn bump(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        match c {
            '\r' => {
                if self.peek() == '\n' {
                    self.pos += 1;
                }
                self.line += 1;
                self.col = 1;
            }
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            _ => self.col += 1,
        }
        c
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c == '@' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// The shared scanning engine for both the batch [`Tokenizer`] and the
/// forward-only [`TokenStream`]. Holds the one piece of lexer state the
/// spec calls out as stateful: the buffered doc-comment text pending a
/// `CREATE` keyword.
struct Scanner<'k> {
    cursor: Cursor,
    file: SmolStr,
    capture_docs: bool,
    keywords: &'k dyn KeywordTable,
    pending_docs: Vec<String>,
    pending_doc_span: Option<Span>,
    stashed: Option<Token>,
    emitted_eof: bool,
}

impl<'k> Scanner<'k> {
    fn new(file: &str, text: &str, capture_docs: bool, keywords: &'k dyn KeywordTable) -> Self {
        Self {
            cursor: Cursor::new(text),
            file: file.into(),
            capture_docs,
            keywords,
            pending_docs: Vec::new(),
            pending_doc_span: None,
            stashed: None,
            emitted_eof: false,
        }
    }

    fn span_from(&self, start: (usize, usize)) -> Span {
        let (end_line, end_col) = self.cursor.mark();
        Span::new(self.file.clone(), start.0, start.1, end_line, end_col)
    }

    /// Returns `None` once the EOF token has already been produced.
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        if let Some(tok) = self.stashed.take() {
            return Ok(Some(tok));
        }
        if self.emitted_eof {
            return Ok(None);
        }

        self.skip_trivia()?;

        let start = self.cursor.mark();
        if self.cursor.is_eof() {
            self.pending_docs.clear();
            self.pending_doc_span = None;
            self.emitted_eof = true;
            return Ok(Some(Token::new(
                TokenKind::Eof,
                "",
                Span::point(self.file.clone(), start.0, start.1),
            )));
        }

        let tok = self.scan_one(start)?;

        if !self.pending_docs.is_empty() {
            if tok.kind == TokenKind::Keyword && tok.text == "CREATE" {
                let text = self.pending_docs.join("\n");
                let span = self.pending_doc_span.take().unwrap();
                self.pending_docs.clear();
                self.stashed = Some(tok);
                return Ok(Some(Token::new(TokenKind::DocComment, text, span)));
            }
            self.pending_docs.clear();
            self.pending_doc_span = None;
        }

        Ok(Some(tok))
    }

    fn skip_trivia(&mut self) -> Result<(), TokenizeError> {
        loop {
            if self.cursor.is_eof() {
                return Ok(());
            }
            let c = self.cursor.peek();
            if c.is_whitespace() {
                self.cursor.bump();
                continue;
            }
            if c == '-' && self.cursor.peek_at(1) == '-' {
                let start = self.cursor.mark();
                self.cursor.bump();
                self.cursor.bump();
                let mut text = String::new();
                while !self.cursor.is_eof() && self.cursor.peek() != '\n' && self.cursor.peek() != '\r' {
                    text.push(self.cursor.bump());
                }
                if self.capture_docs {
                    self.push_pending_doc(text, start);
                }
                continue;
            }
            if c == '/' && self.cursor.peek_at(1) == '*' {
                let start = self.cursor.mark();
                self.cursor.bump();
                self.cursor.bump();
                let mut text = String::new();
                loop {
                    if self.cursor.is_eof() {
                        return Err(TokenizeError::UnterminatedBlockComment {
                            span: self.span_from(start),
                        });
                    }
                    if self.cursor.peek() == '*' && self.cursor.peek_at(1) == '/' {
                        self.cursor.bump();
                        self.cursor.bump();
                        break;
                    }
                    text.push(self.cursor.bump());
                }
                if self.capture_docs {
                    self.push_pending_doc(text, start);
                }
                continue;
            }
            return Ok(());
        }
    }

    fn push_pending_doc(&mut self, raw: String, start: (usize, usize)) {
        let span = self.span_from(start);
        self.pending_docs.push(raw.trim().to_string());
        match &mut self.pending_doc_span {
            Some(existing) => existing.extend(&span),
            None => self.pending_doc_span = Some(span),
        }
    }

    fn scan_one(&mut self, start: (usize, usize)) -> Result<Token, TokenizeError> {
        let c = self.cursor.peek();

        if c == '"' || c == '`' || c == '[' {
            return self.scan_quoted_identifier(start, c);
        }
        if c == '\'' {
            return self.scan_string(start);
        }
        if (c == 'x' || c == 'X') && self.cursor.peek_at(1) == '\'' {
            return self.scan_blob(start);
        }
        if c.is_ascii_digit() {
            return Ok(self.scan_number(start));
        }
        if c == '$' && self.cursor.peek_at(1).is_ascii_digit() {
            return Ok(self.scan_param(start));
        }
        if is_ident_start(c) {
            return Ok(self.scan_identifier_or_keyword(start));
        }
        Ok(self.scan_symbol(start))
    }

    fn scan_quoted_identifier(&mut self, start: (usize, usize), open: char) -> Result<Token, TokenizeError> {
        let close = match open {
            '[' => ']',
            other => other,
        };
        let mut text = String::new();
        text.push(self.cursor.bump());
        loop {
            if self.cursor.is_eof() {
                return Err(TokenizeError::UnterminatedQuotedIdentifier {
                    span: self.span_from(start),
                });
            }
            let c = self.cursor.peek();
            if c == close {
                if close != ']' && self.cursor.peek_at(1) == close {
                    text.push(self.cursor.bump());
                    text.push(self.cursor.bump());
                    continue;
                }
                text.push(self.cursor.bump());
                break;
            }
            text.push(self.cursor.bump());
        }
        Ok(Token::new(TokenKind::Identifier, text, self.span_from(start)))
    }

    fn scan_string(&mut self, start: (usize, usize)) -> Result<Token, TokenizeError> {
        let mut text = String::new();
        text.push(self.cursor.bump());
        loop {
            if self.cursor.is_eof() {
                return Err(TokenizeError::UnterminatedString {
                    span: self.span_from(start),
                });
            }
            let c = self.cursor.peek();
            if c == '\'' {
                if self.cursor.peek_at(1) == '\'' {
                    text.push(self.cursor.bump());
                    text.push(self.cursor.bump());
                    continue;
                }
                text.push(self.cursor.bump());
                break;
            }
            text.push(self.cursor.bump());
        }
        Ok(Token::new(TokenKind::String, text, self.span_from(start)))
    }

    fn scan_blob(&mut self, start: (usize, usize)) -> Result<Token, TokenizeError> {
        self.cursor.bump(); // leading x/X
        self.cursor.bump(); // opening quote
        let mut payload = String::new();
        loop {
            if self.cursor.is_eof() {
                return Err(TokenizeError::UnterminatedBlob {
                    span: self.span_from(start),
                });
            }
            if self.cursor.peek() == '\'' {
                self.cursor.bump();
                break;
            }
            payload.push(self.cursor.bump());
        }
        if payload.len() % 2 != 0 {
            return Err(TokenizeError::OddBlobLength {
                span: self.span_from(start),
            });
        }
        if !payload.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TokenizeError::InvalidBlobHex {
                span: self.span_from(start),
            });
        }
        let text = format!("X'{payload}'");
        Ok(Token::new(TokenKind::Blob, text, self.span_from(start)))
    }

    fn scan_number(&mut self, start: (usize, usize)) -> Token {
        let mut text = String::new();
        while self.cursor.peek().is_ascii_digit() {
            text.push(self.cursor.bump());
        }
        if self.cursor.peek() == '.' && self.cursor.peek_at(1).is_ascii_digit() {
            text.push(self.cursor.bump());
            while self.cursor.peek().is_ascii_digit() {
                text.push(self.cursor.bump());
            }
        }
        if matches!(self.cursor.peek(), 'e' | 'E') {
            let mut lookahead = 1;
            if matches!(self.cursor.peek_at(1), '+' | '-') {
                lookahead = 2;
            }
            if self.cursor.peek_at(lookahead).is_ascii_digit() {
                for _ in 0..lookahead {
                    text.push(self.cursor.bump());
                }
                while self.cursor.peek().is_ascii_digit() {
                    text.push(self.cursor.bump());
                }
            }
        }
        Token::new(TokenKind::Number, text, self.span_from(start))
    }

    fn scan_param(&mut self, start: (usize, usize)) -> Token {
        let mut text = String::new();
        text.push(self.cursor.bump()); // $
        while self.cursor.peek().is_ascii_digit() {
            text.push(self.cursor.bump());
        }
        Token::new(TokenKind::Param, text, self.span_from(start))
    }

    fn scan_identifier_or_keyword(&mut self, start: (usize, usize)) -> Token {
        let mut text = String::new();
        text.push(self.cursor.bump());
        while is_ident_continue(self.cursor.peek()) {
            text.push(self.cursor.bump());
        }
        let upper = text.to_ascii_uppercase();
        if self.keywords.is_keyword(&upper) {
            Token::new(TokenKind::Keyword, upper, self.span_from(start))
        } else {
            Token::new(TokenKind::Identifier, text, self.span_from(start))
        }
    }

    fn scan_symbol(&mut self, start: (usize, usize)) -> Token {
        let c = self.cursor.bump();
        if c.is_control() {
            return Token::new(TokenKind::Invalid, c.to_string(), self.span_from(start));
        }
        let next = self.cursor.peek();
        let two_char = match (c, next) {
            ('<', '=') | ('>', '=') | ('!', '=') | ('<', '>') | (':', ':') => true,
            _ => false,
        };
        let mut text = c.to_string();
        if two_char {
            text.push(self.cursor.bump());
        }
        Token::new(TokenKind::Symbol, text, self.span_from(start))
    }
}

/// Scans the whole buffer up front, for parsers that need to backtrack
/// within a statement.
pub struct Tokenizer;

impl Tokenizer {
    /// Tokenize `text` (already-decoded UTF-8) into a full sequence ending in
    /// `EOF`. Returns an error if an unterminated literal/comment or a
    /// malformed blob is found; never panics on arbitrary input.
    pub fn tokenize(
        file: &str,
        text: &str,
        capture_docs: bool,
        keywords: &dyn KeywordTable,
    ) -> Result<Vec<Token>, TokenizeError> {
        let mut scanner = Scanner::new(file, text, capture_docs, keywords);
        let mut tokens = Vec::new();
        while let Some(tok) = scanner.next_token()? {
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Tokenize a raw byte buffer, first validating it is UTF-8.
    pub fn tokenize_bytes(
        file: &str,
        bytes: &[u8],
        capture_docs: bool,
        keywords: &dyn KeywordTable,
    ) -> Result<Vec<Token>, TokenizeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| TokenizeError::InvalidUtf8 {
            path: file.to_string(),
        })?;
        Self::tokenize(file, text, capture_docs, keywords)
    }
}

/// Forward-only token iterator. Never materializes the full token sequence,
/// and supports early termination (dropping it mid-scan costs nothing extra).
/// Produces the exact same tokens as [`Tokenizer::tokenize`] for the same
/// input and `capture_docs` setting.
pub struct TokenStream<'k> {
    scanner: Scanner<'k>,
    errored: bool,
}

impl<'k> TokenStream<'k> {
    pub fn new(file: &str, text: &str, capture_docs: bool, keywords: &'k dyn KeywordTable) -> Self {
        Self {
            scanner: Scanner::new(file, text, capture_docs, keywords),
            errored: false,
        }
    }
}

impl<'k> Iterator for TokenStream<'k> {
    type Item = Result<Token, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        match self.scanner.next_token() {
            Ok(Some(tok)) => Some(Ok(tok)),
            Ok(None) => None,
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::CommonKeywords;

    fn toks(src: &str, capture_docs: bool) -> Vec<Token> {
        Tokenizer::tokenize("f.sql", src, capture_docs, &CommonKeywords).unwrap()
    }

    #[test]
    fn scenario_tokenizer_positions() {
        let src = "CREATE TABLE users (\n    id INTEGER PRIMARY KEY\n);\n";
        let tokens = toks(src, false);
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::DocComment));
        let create = &tokens[0];
        assert_eq!(create.text, "CREATE");
        assert_eq!((create.span.start_line, create.span.start_col), (1, 1));

        let users = tokens.iter().find(|t| t.text == "users").unwrap();
        assert_eq!((users.span.start_line, users.span.start_col), (1, 14));

        let id = tokens.iter().find(|t| t.text == "id").unwrap();
        assert_eq!((id.span.start_line, id.span.start_col), (2, 5));

        assert!(tokens.iter().any(|t| t.text == ")"));
        assert!(tokens.iter().any(|t| t.text == ";"));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn scenario_doc_attach() {
        let src = "-- User table\n/* fields: id, name */\nCREATE TABLE users (id INTEGER PRIMARY KEY);\n";
        let tokens = toks(src, true);
        assert_eq!(tokens[0].kind, TokenKind::DocComment);
        assert_eq!(tokens[0].text, "User table\nfields: id, name");
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].text, "CREATE");
    }

    #[test]
    fn doc_discarded_when_not_followed_by_create() {
        let src = "-- comment\nSELECT 1;\n";
        let tokens = toks(src, true);
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::DocComment));
    }

    #[test]
    fn string_literal_with_doubled_quote_escape() {
        let tokens = toks("'it''s here'", false);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "'it''s here'");
    }

    #[test]
    fn unterminated_string_errors() {
        let err = Tokenizer::tokenize("f.sql", "'abc", false, &CommonKeywords).unwrap_err();
        assert!(matches!(err, TokenizeError::UnterminatedString { .. }));
    }

    #[test]
    fn blob_literal_canonicalizes_leading_x() {
        let tokens = toks("x'deadBEEF'", false);
        assert_eq!(tokens[0].kind, TokenKind::Blob);
        assert_eq!(tokens[0].text, "X'deadBEEF'");
    }

    #[test]
    fn blob_with_odd_length_errors() {
        let err = Tokenizer::tokenize("f.sql", "X'abc'", false, &CommonKeywords).unwrap_err();
        assert!(matches!(err, TokenizeError::OddBlobLength { .. }));
    }

    #[test]
    fn blob_with_bad_hex_errors() {
        let err = Tokenizer::tokenize("f.sql", "X'zz'", false, &CommonKeywords).unwrap_err();
        assert!(matches!(err, TokenizeError::InvalidBlobHex { .. }));
    }

    #[test]
    fn quoted_identifiers_all_three_forms() {
        let tokens = toks(r#""a""b" [c] `d`"#, false);
        assert_eq!(tokens[0].text, r#""a""b""#);
        assert_eq!(tokens[1].text, "[c]");
        assert_eq!(tokens[2].text, "`d`");
    }

    #[test]
    fn numbers_with_fraction_and_exponent() {
        let tokens = toks("10 3.14 2e10 1.5e-3", false);
        let nums: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Number).collect();
        assert_eq!(nums[0].text, "10");
        assert_eq!(nums[1].text, "3.14");
        assert_eq!(nums[2].text, "2e10");
        assert_eq!(nums[3].text, "1.5e-3");
    }

    #[test]
    fn dollar_digit_is_param_but_bare_dollar_is_identifier() {
        let tokens = toks("$1 $foo", false);
        assert_eq!(tokens[0].kind, TokenKind::Param);
        assert_eq!(tokens[0].text, "$1");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "$foo");
    }

    #[test]
    fn multi_char_symbols() {
        let tokens = toks("a <= b <> c :: d", false);
        let syms: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Symbol).map(|t| t.text.as_str()).collect();
        assert_eq!(syms, vec!["<=", "<>", "::"]);
    }

    #[test]
    fn unicode_rune_columns_not_bytes() {
        // "café" has 4 runes but 5 bytes; the following identifier's column
        // must be computed from rune count.
        let tokens = toks("café bar", false);
        let bar = tokens.iter().find(|t| t.text == "bar").unwrap();
        assert_eq!(bar.span.start_col, 6);
    }

    #[test]
    fn crlf_counts_as_one_newline() {
        let tokens = toks("a\r\nb", false);
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.span.start_line, b.span.start_col), (2, 1));
    }

    #[test]
    fn batch_and_stream_agree() {
        let src = "CREATE TABLE t (id INTEGER, name TEXT);";
        let batch = toks(src, false);
        let streamed: Vec<Token> = TokenStream::new("f.sql", src, false, &CommonKeywords)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(batch, streamed);
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let err = Tokenizer::tokenize("f.sql", "/* oops", false, &CommonKeywords).unwrap_err();
        assert!(matches!(err, TokenizeError::UnterminatedBlockComment { .. }));
    }

    #[test]
    fn never_panics_on_arbitrary_bytes() {
        for byte in 0u8..=255 {
            let bytes = vec![byte, b'a', byte];
            let _ = Tokenizer::tokenize_bytes("f.sql", &bytes, false, &CommonKeywords);
        }
    }
}
