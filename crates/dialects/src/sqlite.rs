use sqlfix_core::model::Column;
use sqlfix_core::model::Table;
use sqlfix_core::token::TokenKind;
use sqlfix_core::{CancellationToken, Catalog, Diagnostic, DiagnosticCode, Diagnostics, Severity, TokenizeError, Tokenizer};

use crate::common::ParserState;
use crate::ddl::{self, DialectHooks};
use crate::keywords::SqliteKeywords;
use crate::DialectParser;

const TYPE_BOUNDARY: &[&str] = &[
    "PRIMARY", "NOT", "NULL", "DEFAULT", "REFERENCES", "UNIQUE", "CHECK",
    "CONSTRAINT", "COLLATE", "GENERATED", "AS",
];

struct SqliteHooks;

impl DialectHooks for SqliteHooks {
    fn type_boundary_keywords(&self) -> &'static [&'static str] {
        TYPE_BOUNDARY
    }

    fn try_column_constraint(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) -> bool {
        if state.eat_keyword("AUTOINCREMENT") {
            if table.primary_key.is_none() {
                table.primary_key = Some(sqlfix_core::model::PrimaryKey {
                    name: None,
                    columns: vec![col.name.clone()],
                    span: col.span.clone(),
                });
            }
            return true;
        }
        if state.eat_keyword("COLLATE") {
            state.parse_name();
            return true;
        }
        if state.eat_keyword("GENERATED") {
            state.eat_keyword("ALWAYS");
            state.eat_keyword("AS");
            state.skip_check_expr();
            state.eat_keyword("STORED");
            state.eat_keyword("VIRTUAL");
            return true;
        }
        false
    }

    fn after_type_spec(&self, state: &mut ParserState, col: &mut Column, _table: &mut Table) {
        if col.type_text.eq_ignore_ascii_case("SERIAL") {
            state.warning(
                DiagnosticCode::DeprecatedConstruct,
                "SQLite has no native SERIAL type; treating \"SERIAL\" as its declared type text verbatim",
            );
        }
    }
}

pub struct SqliteParser;

impl DialectParser for SqliteParser {
    fn parse(&self, path: &str, bytes: &[u8]) -> (Catalog, Diagnostics, Option<TokenizeError>) {
        parse_with_cancellation(path, bytes, &CancellationToken::new())
    }

    fn parse_cancellable(
        &self,
        path: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> (Catalog, Diagnostics, Option<TokenizeError>) {
        parse_with_cancellation(path, bytes, cancel)
    }

    fn validate_sql(&self, sql: &str) -> Diagnostics {
        let (_, diags, _) = self.parse("<memory>", sql.as_bytes());
        diags
    }
}

fn parse_with_cancellation(
    path: &str,
    bytes: &[u8],
    cancel: &CancellationToken,
) -> (Catalog, Diagnostics, Option<TokenizeError>) {
    if cancel.is_cancelled() {
        return (Catalog::new(), Vec::new(), None);
    }
    let keywords = SqliteKeywords;
    let tokens = match Tokenizer::tokenize_bytes(path, bytes, true, &keywords) {
        Ok(tokens) => tokens,
        Err(err) => return (Catalog::new(), Vec::new(), Some(err)),
    };
    if cancel.is_cancelled() {
        return (Catalog::new(), Vec::new(), None);
    }

    let mut state = ParserState::new(path, tokens, &keywords);
    let hooks = SqliteHooks;

    while !state.is_eof() {
        if state.eat_doc_comment() {
            continue;
        }
        if state.check_keyword("CREATE") {
            state.advance();
            dispatch_create(&mut state, &hooks);
        } else if state.check_keyword("ALTER") {
            state.advance();
            state.eat_keyword("TABLE");
            ddl::parse_alter_table(&mut state, &hooks);
        } else if state.peek().kind == TokenKind::Eof {
            break;
        } else {
            state.error(
                DiagnosticCode::UnknownTopLevelStatement,
                format!("unexpected top-level token \"{}\"", state.peek().text),
            );
            state.sync();
        }
    }

    ddl::validate(&mut state);
    (state.catalog, state.diagnostics, None)
}

fn dispatch_create(state: &mut ParserState, hooks: &SqliteHooks) {
    let doc = state.take_pending_doc();
    let _ = state.eat_keyword("TEMP") || state.eat_keyword("TEMPORARY");
    if state.check_keyword("TABLE") {
        state.advance();
        ddl::parse_create_table(state, doc, hooks);
    } else if state.check_keyword("VIEW") {
        ddl::parse_create_view(state, doc);
    } else if state.check_keyword("UNIQUE") || state.check_keyword("INDEX") {
        ddl::parse_create_index(state);
    } else {
        state.diagnostics.push(Diagnostic::new(
            Severity::Error,
            DiagnosticCode::UnknownTopLevelStatement,
            &state.peek().span,
            format!("unrecognized CREATE form near \"{}\"", state.peek().text),
        ));
        state.sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_table_with_primary_key() {
        let (catalog, diags, err) = SqliteParser.parse(
            "f.sql",
            b"CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        );
        assert!(err.is_none());
        assert!(diags.is_empty());
        let table = catalog.table("users").unwrap();
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
        assert!(table.column("name").unwrap().not_null);
    }

    #[test]
    fn serial_warns_under_sqlite() {
        let (_catalog, diags, _) = SqliteParser.parse("f.sql", b"CREATE TABLE t (id SERIAL PRIMARY KEY);");
        assert!(diags.iter().any(|d| d.message.contains("SERIAL")));
    }

    #[test]
    fn duplicate_primary_key_warns_and_keeps_the_first() {
        let sql = b"CREATE TABLE t (id INTEGER PRIMARY KEY, other INTEGER PRIMARY KEY);";
        let (catalog, diags, _) = SqliteParser.parse("f.sql", sql);
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::DuplicatePrimaryKey));
        let table = catalog.table("t").unwrap();
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
    }

    #[test]
    fn foreign_key_validation_success() {
        let sql = b"CREATE TABLE users (id INTEGER PRIMARY KEY);\nCREATE TABLE posts (user_id INTEGER REFERENCES users(id));";
        let (catalog, diags, _) = SqliteParser.parse("f.sql", sql);
        assert!(diags.is_empty());
        let posts = catalog.table("posts").unwrap();
        assert_eq!(posts.foreign_keys[0].reference.table_canonical.as_str(), "users");
    }

    #[test]
    fn foreign_key_validation_failure() {
        let sql = b"CREATE TABLE users (id INTEGER PRIMARY KEY);\nCREATE TABLE posts (user_id INTEGER REFERENCES users(email));";
        let (_catalog, diags, _) = SqliteParser.parse("f.sql", sql);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unknown column \"email\""));
    }

    #[test]
    fn alter_table_add_column() {
        let sql = b"CREATE TABLE t (id INTEGER);\nALTER TABLE t ADD COLUMN name TEXT;";
        let (catalog, diags, _) = SqliteParser.parse("f.sql", sql);
        assert!(diags.is_empty());
        assert!(catalog.table("t").unwrap().column("name").is_some());
    }

    #[test]
    fn alter_unknown_table_errors() {
        let (_catalog, diags, _) = SqliteParser.parse("f.sql", b"ALTER TABLE missing ADD COLUMN x TEXT;");
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::AlterUnknownTable));
    }

    #[test]
    fn doc_comment_attaches_to_table() {
        let sql = b"-- Users table\nCREATE TABLE users (id INTEGER PRIMARY KEY);";
        let (catalog, _diags, _) = SqliteParser.parse("f.sql", sql);
        assert_eq!(catalog.table("users").unwrap().doc.as_deref(), Some("Users table"));
    }

    #[test]
    fn never_panics_on_arbitrary_bytes() {
        for byte in 0u8..=255 {
            let bytes = vec![b'C', b'R', byte, b'E', b'A', b'T', b'E'];
            let _ = SqliteParser.parse("f.sql", &bytes);
        }
    }
}
