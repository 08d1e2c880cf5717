use smol_str::SmolStr;
use sqlfix_core::model::{normalize_identifier, Column, Domain, Enum, Table};
use sqlfix_core::token::TokenKind;
use sqlfix_core::{CancellationToken, Catalog, Diagnostic, DiagnosticCode, Diagnostics, Severity, TokenizeError, Tokenizer};

use crate::common::ParserState;
use crate::ddl::{self, DialectHooks};
use crate::keywords::PostgresKeywords;
use crate::DialectParser;

const TYPE_BOUNDARY: &[&str] = &[
    "PRIMARY", "NOT", "NULL", "DEFAULT", "REFERENCES", "UNIQUE", "CHECK",
    "CONSTRAINT", "COLLATE", "GENERATED",
];

struct PostgresHooks;

impl DialectHooks for PostgresHooks {
    fn type_boundary_keywords(&self) -> &'static [&'static str] {
        TYPE_BOUNDARY
    }

    fn try_column_constraint(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) -> bool {
        if state.eat_keyword("GENERATED") {
            state.eat_keyword("ALWAYS");
            state.eat_keyword("BY");
            state.eat_keyword("DEFAULT");
            state.eat_keyword("AS");
            state.eat_keyword("IDENTITY");
            state.skip_check_expr();
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
        false
    }

    fn try_table_constraint(&self, state: &mut ParserState, _table: &mut Table) -> bool {
        if state.eat_keyword("EXCLUDE") {
            state.eat_keyword("USING");
            state.parse_name();
            if state.check_symbol("(") {
                state.consume_balanced_parens();
            }
            return true;
        }
        false
    }
}

pub struct PostgresParser;

impl DialectParser for PostgresParser {
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
    let keywords = PostgresKeywords;
    let tokens = match Tokenizer::tokenize_bytes(path, bytes, true, &keywords) {
        Ok(tokens) => tokens,
        Err(err) => return (Catalog::new(), Vec::new(), Some(err)),
    };
    if cancel.is_cancelled() {
        return (Catalog::new(), Vec::new(), None);
    }

    let mut state = ParserState::new(path, tokens, &keywords);
    let hooks = PostgresHooks;

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

fn dispatch_create(state: &mut ParserState, hooks: &PostgresHooks) {
    let doc = state.take_pending_doc();
    let _ = state.eat_keyword("TEMP") || state.eat_keyword("TEMPORARY");
    if state.check_keyword("TABLE") {
        state.advance();
        ddl::parse_create_table(state, doc, hooks);
    } else if state.check_keyword("VIEW") {
        ddl::parse_create_view(state, doc);
    } else if state.check_keyword("UNIQUE") || state.check_keyword("INDEX") {
        ddl::parse_create_index(state);
    } else if state.check_keyword("TYPE") {
        parse_create_type(state);
    } else if state.check_keyword("DOMAIN") {
        parse_create_domain(state);
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

/// `CREATE TYPE name AS ENUM ('v', ...)`. Any other `CREATE TYPE` form is
/// skipped to the statement terminator.
fn parse_create_type(state: &mut ParserState) {
    state.advance(); // TYPE
    let name_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.sync();
            return;
        }
    };
    if !(state.eat_keyword("AS") && state.check_keyword("ENUM")) {
        state.sync();
        return;
    }
    state.advance(); // ENUM
    let mut values: Vec<SmolStr> = Vec::new();
    if state.eat_symbol("(") {
        loop {
            if state.check_symbol(")") || state.is_eof() {
                break;
            }
            if state.peek().kind == TokenKind::String {
                values.push(state.advance().text);
            } else {
                state.advance();
            }
            if !state.eat_symbol(",") {
                break;
            }
        }
        state.eat_symbol(")");
    }
    state.eat_symbol(";");
    let enum_ty = Enum {
        name: name_tok.text.clone(),
        values,
        span: name_tok.span,
    };
    state.catalog.enums.insert(normalize_identifier(&enum_ty.name), enum_ty);
}

/// `CREATE DOMAIN name AS type [constraints...]`. Constraints are consumed
/// and discarded; only the base type is retained.
fn parse_create_domain(state: &mut ParserState) {
    state.advance(); // DOMAIN
    let name_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.sync();
            return;
        }
    };
    if !state.eat_keyword("AS") {
        state.sync();
        return;
    }
    let base_type = state.parse_type_spec(&["NOT", "NULL", "DEFAULT", "CHECK", "CONSTRAINT"]);
    while !state.check_symbol(";") && !state.is_eof() {
        state.advance();
    }
    state.eat_symbol(";");
    let domain = Domain {
        name: name_tok.text.clone(),
        base_type: base_type.into(),
        span: name_tok.span,
    };
    state.catalog.domains.insert(normalize_identifier(&domain.name), domain);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_under_postgres_is_native_no_diagnostics() {
        let (catalog, diags, _) = PostgresParser.parse("f.sql", b"CREATE TABLE t (id SERIAL PRIMARY KEY);");
        assert!(diags.is_empty());
        let table = catalog.table("t").unwrap();
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
    }

    #[test]
    fn create_type_as_enum() {
        let (catalog, diags, _) = PostgresParser.parse("f.sql", b"CREATE TYPE mood AS ENUM ('sad', 'ok', 'happy');");
        assert!(diags.is_empty());
        let e = catalog.enums.get("mood").unwrap();
        assert_eq!(e.values, vec!["'sad'", "'ok'", "'happy'"]);
    }

    #[test]
    fn create_domain() {
        let (catalog, diags, _) = PostgresParser.parse("f.sql", b"CREATE DOMAIN us_zip AS TEXT CHECK (VALUE ~ '^[0-9]{5}$');");
        assert!(diags.is_empty());
        let d = catalog.domains.get("us_zip").unwrap();
        assert_eq!(d.base_type, "TEXT");
    }

    #[test]
    fn generated_identity_synthesizes_pk() {
        let (catalog, _diags, _) =
            PostgresParser.parse("f.sql", b"CREATE TABLE t (id INTEGER GENERATED ALWAYS AS IDENTITY, name TEXT);");
        let table = catalog.table("t").unwrap();
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
    }
}
