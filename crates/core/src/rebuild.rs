use crate::token::{Token, TokenKind};

/// Rebuild a canonical textual form from a token slice: join token text with
/// single spaces, but suppress the space before `,`/`)`/`.` and after
/// `(`/`.`. Used for view bodies and reconstructed `DEFAULT` expressions.
/// Lossy for whitespace, not for semantics.
pub fn rebuild_sql(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if tok.kind == TokenKind::Eof {
            break;
        }
        if let Some(p) = prev {
            if !suppress_space_before(tok) && !suppress_space_after(p) {
                out.push(' ');
            }
        }
        out.push_str(&tok.text);
        prev = Some(tok);
    }
    out
}

fn suppress_space_before(tok: &Token) -> bool {
    tok.is_symbol(",") || tok.is_symbol(")") || tok.is_symbol(".")
}

fn suppress_space_after(tok: &Token) -> bool {
    tok.is_symbol("(") || tok.is_symbol(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::CommonKeywords;
    use crate::tokenizer::Tokenizer;

    fn rebuild(src: &str) -> String {
        let tokens = Tokenizer::tokenize("f.sql", src, false, &CommonKeywords).unwrap();
        rebuild_sql(&tokens)
    }

    #[test]
    fn suppresses_space_around_call_punctuation() {
        assert_eq!(rebuild("VARCHAR ( 255 )"), "VARCHAR(255)");
    }

    #[test]
    fn suppresses_space_before_comma_and_around_dot() {
        assert_eq!(rebuild("a . b , c"), "a.b, c");
    }

    #[test]
    fn fixed_point_after_one_normalization() {
        let once = rebuild("SELECT  a,b   FROM   t");
        let twice = rebuild(&once);
        assert_eq!(once, twice);
    }
}
