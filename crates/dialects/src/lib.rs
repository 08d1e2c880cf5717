//! Three sibling recursive-descent DDL parsers — SQLite, PostgreSQL, MySQL —
//! sharing one tokenizer and schema model but owning their own keyword
//! tables, column-type shapes, and constraint grammar.

mod common;
mod ddl;
pub mod keywords;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlParser;
pub use postgres::PostgresParser;
pub use sqlite::SqliteParser;

use sqlfix_core::{CancellationToken, Catalog, Diagnostics, TokenizeError};

/// The capability every dialect parser satisfies: parse a DDL file into a
/// catalog plus diagnostics, never panicking or throwing, and separately
/// offer a syntax-only check for lint-style use. Expressed as a trait with
/// three implementations so the tokenizer and diagnostic types are shared
/// through composition rather than inheritance.
pub trait DialectParser {
    fn parse(&self, path: &str, bytes: &[u8]) -> (Catalog, Diagnostics, Option<TokenizeError>);

    fn parse_cancellable(
        &self,
        path: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> (Catalog, Diagnostics, Option<TokenizeError>);

    fn validate_sql(&self, sql: &str) -> Diagnostics;
}

/// Merges `catalogs` emitted by successive file parses into one, detecting
/// duplicate tables/views/enums/domains across files. Diagnostics fire in
/// the order the catalogs are supplied, matching the cross-file ordering
/// guarantee.
pub fn merge_catalogs(parsed: Vec<(String, Catalog, Diagnostics)>) -> (Catalog, Diagnostics) {
    let mut merged = Catalog::new();
    let mut diagnostics = Vec::new();

    for (path, catalog, diags) in parsed {
        diagnostics.extend(diags);
        for (name, table) in catalog.tables {
            if merged.tables.contains_key(&name) {
                diagnostics.push(sqlfix_core::Diagnostic::error(
                    sqlfix_core::DiagnosticCode::DuplicateTableName,
                    &table.span,
                    format!("duplicate table \"{}\" also defined in {path}", table.name),
                ));
                continue;
            }
            merged.tables.insert(name, table);
        }
        for (name, view) in catalog.views {
            merged.views.entry(name).or_insert(view);
        }
        for (name, e) in catalog.enums {
            merged.enums.entry(name).or_insert(e);
        }
        for (name, d) in catalog.domains {
            merged.domains.entry(name).or_insert(d);
        }
    }

    (merged, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_detects_cross_file_duplicate_table() {
        let (cat_a, diags_a, _) = SqliteParser.parse("a.sql", b"CREATE TABLE users (id INTEGER);");
        let (cat_b, diags_b, _) = SqliteParser.parse("b.sql", b"CREATE TABLE users (id INTEGER);");
        let (merged, diags) = merge_catalogs(vec![
            ("a.sql".into(), cat_a, diags_a),
            ("b.sql".into(), cat_b, diags_b),
        ]);
        assert_eq!(merged.tables.len(), 1);
        assert!(diags.iter().any(|d| d.code == sqlfix_core::DiagnosticCode::DuplicateTableName));
    }
}
