use sqlfix_core::model::{Column, PrimaryKey, Table};
use sqlfix_core::token::TokenKind;
use sqlfix_core::{CancellationToken, Catalog, Diagnostic, DiagnosticCode, Diagnostics, Severity, TokenizeError, Tokenizer};

use crate::common::ParserState;
use crate::ddl::{self, DialectHooks};
use crate::keywords::MysqlKeywords;
use crate::DialectParser;

const TYPE_BOUNDARY: &[&str] = &[
    "PRIMARY", "NOT", "NULL", "DEFAULT", "REFERENCES", "UNIQUE", "CHECK",
    "CONSTRAINT", "AUTO_INCREMENT", "COMMENT", "CHARACTER", "COLLATE",
    "UNSIGNED", "ZEROFILL",
];

struct MysqlHooks;

impl DialectHooks for MysqlHooks {
    fn type_boundary_keywords(&self) -> &'static [&'static str] {
        TYPE_BOUNDARY
    }

    fn try_column_constraint(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) -> bool {
        if state.eat_keyword("UNSIGNED") {
            col.type_text = format!("{} UNSIGNED", col.type_text).into();
            return true;
        }
        if state.eat_keyword("ZEROFILL") {
            col.type_text = format!("{} ZEROFILL", col.type_text).into();
            return true;
        }
        if state.eat_keyword("AUTO_INCREMENT") {
            if table.primary_key.is_none() {
                table.primary_key = Some(PrimaryKey {
                    name: None,
                    columns: vec![col.name.clone()],
                    span: col.span.clone(),
                });
            }
            return true;
        }
        if state.eat_keyword("COMMENT") {
            state.advance(); // string literal; not stored
            return true;
        }
        if state.eat_keyword("CHARACTER") {
            state.eat_keyword("SET");
            state.parse_name();
            return true;
        }
        if state.eat_keyword("COLLATE") {
            state.parse_name();
            return true;
        }
        false
    }

    fn try_table_constraint(&self, state: &mut ParserState, table: &mut Table) -> bool {
        let is_index_lead =
            state.check_keyword("INDEX") || state.check_keyword("KEY") || state.check_keyword("FULLTEXT") || state.check_keyword("SPATIAL");
        if !is_index_lead {
            return false;
        }
        let _ = state.eat_keyword("FULLTEXT") || state.eat_keyword("SPATIAL");
        let _ = state.eat_keyword("INDEX") || state.eat_keyword("KEY");
        let name_tok = state.parse_name();
        let span = name_tok.as_ref().map(|t| t.span.clone()).unwrap_or_else(|| state.peek().span.clone());
        let columns = state.parse_column_name_list();
        table.indexes.push(sqlfix_core::model::Index {
            name: name_tok.map(|t| t.text).unwrap_or_else(|| table.name.clone()),
            table: table.name.clone(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            span,
        });
        true
    }

    fn after_type_spec(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) {
        if col.type_text.eq_ignore_ascii_case("SERIAL") {
            state.warning(
                DiagnosticCode::DeprecatedConstruct,
                "MySQL treats SERIAL as BIGINT UNSIGNED NOT NULL AUTO_INCREMENT UNIQUE",
            );
            col.type_text = "BIGINT UNSIGNED".into();
            col.not_null = true;
            table.unique_keys.push(sqlfix_core::model::UniqueKey {
                name: None,
                columns: vec![col.name.clone()],
                span: col.span.clone(),
            });
            if table.primary_key.is_none() {
                table.primary_key = Some(PrimaryKey {
                    name: None,
                    columns: vec![col.name.clone()],
                    span: col.span.clone(),
                });
            }
        }
    }
}

pub struct MysqlParser;

impl DialectParser for MysqlParser {
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
    let keywords = MysqlKeywords;
    let tokens = match Tokenizer::tokenize_bytes(path, bytes, true, &keywords) {
        Ok(tokens) => tokens,
        Err(err) => return (Catalog::new(), Vec::new(), Some(err)),
    };
    if cancel.is_cancelled() {
        return (Catalog::new(), Vec::new(), None);
    }

    let mut state = ParserState::new(path, tokens, &keywords);
    let hooks = MysqlHooks;

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

fn dispatch_create(state: &mut ParserState, hooks: &MysqlHooks) {
    let doc = state.take_pending_doc();
    let _ = state.eat_keyword("TEMPORARY");
    if state.check_keyword("TABLE") {
        state.advance();
        ddl::parse_create_table(state, doc, hooks);
    } else if state.check_keyword("VIEW") {
        ddl::parse_create_view(state, doc);
    } else if state.check_keyword("UNIQUE")
        || state.check_keyword("INDEX")
        || state.check_keyword("FULLTEXT")
        || state.check_keyword("SPATIAL")
    {
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
    fn serial_rewrites_to_bigint_unsigned_and_warns() {
        let (catalog, diags, _) = MysqlParser.parse("f.sql", b"CREATE TABLE t (id SERIAL);");
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::DeprecatedConstruct));
        let table = catalog.table("t").unwrap();
        assert_eq!(table.column("id").unwrap().type_text, "BIGINT UNSIGNED");
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
    }

    #[test]
    fn unsigned_zerofill_suffix_extends_type_text() {
        let (catalog, diags, _) = MysqlParser.parse("f.sql", b"CREATE TABLE t (n INT UNSIGNED ZEROFILL);");
        assert!(diags.is_empty());
        assert_eq!(catalog.table("t").unwrap().column("n").unwrap().type_text, "INT UNSIGNED ZEROFILL");
    }

    #[test]
    fn auto_increment_synthesizes_pk() {
        let (catalog, _diags, _) = MysqlParser.parse("f.sql", b"CREATE TABLE t (id INT AUTO_INCREMENT, name VARCHAR(255));");
        let table = catalog.table("t").unwrap();
        assert_eq!(table.primary_key.as_ref().unwrap().columns, vec!["id".to_string()]);
    }

    #[test]
    fn table_level_index_decorator() {
        let (catalog, diags, _) = MysqlParser.parse("f.sql", b"CREATE TABLE t (id INT, name VARCHAR(255), INDEX name_idx (name));");
        assert!(diags.is_empty());
        let table = catalog.table("t").unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "name_idx");
    }

    #[test]
    fn standalone_fulltext_index_parses() {
        let sql = b"CREATE TABLE t (id INT, body TEXT);\nCREATE FULLTEXT INDEX body_ft ON t (body);";
        let (catalog, diags, _) = MysqlParser.parse("f.sql", sql);
        assert!(diags.is_empty());
        let table = catalog.table("t").unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "body_ft");
    }

    #[test]
    fn standalone_spatial_index_parses() {
        let sql = b"CREATE TABLE t (id INT, loc GEOMETRY);\nCREATE SPATIAL INDEX loc_idx ON t (loc);";
        let (catalog, diags, _) = MysqlParser.parse("f.sql", sql);
        assert!(diags.is_empty());
        let table = catalog.table("t").unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "loc_idx");
    }
}
