//! Rewrites `-- name: X :verb` annotated query files in place: expands bare
//! and qualified `SELECT *` result columns against a schema catalog, then
//! inserts a deterministic alias on every result column that still lacks
//! one. Both transforms are applied as byte-offset [`Edit`]s so unrelated
//! source text (formatting, comments, other blocks) is left untouched.

mod alias;
mod edit;
mod relation;
mod report;
mod star;

pub use alias::{derive_base_alias, AliasGenerator};
pub use edit::{apply_edits, Edit, RewriteError};
pub use relation::{find_relations, resolve_star, RelationRef, StarResolution};
pub use report::{AliasAdded, AliasSkipped, Report};
pub use star::expand_stars;

use sqlfix_core::model::Catalog;
use sqlfix_core::{Cancelled, CancellationToken, Diagnostic, DiagnosticCode, Severity, Span};
use sqlfix_query::{is_simple_column_ref, parse_query, slice_blocks, QueryModel, StatementVerb};

/// Rewrites every query block in `text` and returns the rewritten file
/// alongside a [`Report`] of what changed. A block whose SQL has an
/// unrecoverable parse error, or whose star expansion re-parses badly, is
/// left untouched and noted in the report rather than aborting the whole
/// file.
pub fn rewrite_file(path: &str, text: &str, catalog: &Catalog, cancel: &CancellationToken) -> Result<(String, Report), Cancelled> {
    let blocks = slice_blocks(path, text);
    let mut report = Report::default();
    let mut file_edits = Vec::new();

    for block in &blocks {
        cancel.check()?;

        let Ok(model) = parse_query(path, &block.sql) else {
            continue;
        };
        if has_blocking_error(&model) {
            report_abandoned(&mut report, block, &model, "query has a parse error preventing rewrite");
            continue;
        }

        let mut current_sql = block.sql.clone();
        let mut current_model = model;

        if current_model.verb == StatementVerb::Select {
            let star_edits = expand_stars(path, &current_sql, &current_model, catalog, &mut report.warnings);
            if !star_edits.is_empty() {
                match apply_edits(&current_sql, star_edits) {
                    Ok(rewritten) => match parse_query(path, &rewritten) {
                        Ok(reparsed) if reparsed.verb == current_model.verb && !has_blocking_error(&reparsed) => {
                            report.expanded_stars += 1;
                            current_sql = rewritten;
                            current_model = reparsed;
                        }
                        _ => {
                            report_abandoned(&mut report, block, &current_model, "star expansion changed the statement's shape");
                            continue;
                        }
                    },
                    Err(_) => {
                        report_abandoned(&mut report, block, &current_model, "star expansion produced overlapping edits");
                        continue;
                    }
                }
            }
        }

        let existing: Vec<String> = current_model
            .result_columns
            .iter()
            .filter_map(|c| c.alias.as_ref().map(|a| a.to_string()))
            .collect();
        let mut generator = AliasGenerator::new(existing);

        let mut alias_edits = Vec::new();
        for (idx, col) in current_model.result_columns.iter().enumerate() {
            if col.alias.is_some() || col.expr == "*" || col.expr.ends_with(".*") || is_simple_column_ref(&col.expr) {
                continue;
            }
            let base = derive_base_alias(&col.expr);
            let alias = generator.generate(&base);
            alias_edits.push(Edit::insert(col.end_offset, format!(" AS {alias}")));
            report.added_aliases.push(AliasAdded {
                query_name: block.name.clone(),
                column_index: idx,
                alias,
            });
        }

        let final_sql = if alias_edits.is_empty() {
            current_sql
        } else {
            match apply_edits(&current_sql, alias_edits) {
                Ok(sql) => sql,
                Err(_) => current_sql,
            }
        };

        if final_sql != block.sql {
            file_edits.push(Edit::replace(block.start_offset, block.start_offset + block.sql.len(), final_sql));
        }
    }

    let rewritten = apply_edits(text, file_edits).unwrap_or_else(|_| text.to_string());
    log::debug!(
        "{path}: expanded {} star(s), added {} alias(es), skipped {}",
        report.expanded_stars,
        report.added_aliases.len(),
        report.skipped_aliases.len()
    );
    Ok((rewritten, report))
}

fn has_blocking_error(model: &QueryModel) -> bool {
    model
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error && d.code != DiagnosticCode::ResultColumnRequiresAlias)
}

fn report_abandoned(report: &mut Report, block: &sqlfix_query::Block, model: &QueryModel, reason: &str) {
    for (idx, col) in model.result_columns.iter().enumerate() {
        if col.alias.is_none() && col.expr != "*" && !col.expr.ends_with(".*") && !is_simple_column_ref(&col.expr) {
            report.skipped_aliases.push(AliasSkipped {
                query_name: block.name.clone(),
                column_index: idx,
                reason: reason.to_string(),
            });
        }
    }
    report.warnings.push(Diagnostic::new(
        Severity::Warning,
        DiagnosticCode::RewriteAbandoned,
        &Span::point(block.path.as_str(), block.line, block.column),
        format!("{}: {reason}", block.name),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfix_core::model::{Column, Table};

    fn catalog_with_users() -> Catalog {
        let mut catalog = Catalog::new();
        let mut table = Table::new("users", Span::point("schema.sql", 1, 1));
        table.columns.push(Column {
            name: "id".into(),
            type_text: "INTEGER".into(),
            not_null: true,
            default: None,
            references: None,
            span: Span::point("schema.sql", 1, 1),
        });
        table.columns.push(Column {
            name: "balance".into(),
            type_text: "INTEGER".into(),
            not_null: true,
            default: None,
            references: None,
            span: Span::point("schema.sql", 1, 1),
        });
        catalog.tables.insert(table.canonical(), table);
        catalog
    }

    #[test]
    fn expands_bare_star_in_a_query_block() {
        let catalog = catalog_with_users();
        let text = "-- name: ListUsers :many\nSELECT * FROM users;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        // Star expansion unfolds into bare column references; a bare column
        // already names itself, so no alias is inserted on top of it.
        assert_eq!(rewritten, "-- name: ListUsers :many\nSELECT id, balance FROM users;\n");
        assert_eq!(report.expanded_stars, 1);
        assert_eq!(report.added_aliases.len(), 0);
    }

    #[test]
    fn inserts_alias_on_unaliased_expression() {
        let catalog = catalog_with_users();
        let text = "-- name: Balances :many\nSELECT balance - 1 FROM users;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert!(rewritten.contains("AS balance_minus_1"));
        assert_eq!(report.added_aliases.len(), 1);
    }

    #[test]
    fn non_select_blocks_pass_through_unchanged() {
        let catalog = catalog_with_users();
        let text = "-- name: DeleteUser :exec\nDELETE FROM users WHERE id = ?;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert_eq!(rewritten, text);
        assert!(!report.changed());
    }

    #[test]
    fn unresolvable_star_leaves_block_untouched_and_warns() {
        let catalog = Catalog::new();
        let text = "-- name: ListGhosts :many\nSELECT * FROM ghosts;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert_eq!(rewritten, text);
        assert!(report.warnings.iter().any(|d| d.code == DiagnosticCode::UnresolvedStarQualifier));
    }

    #[test]
    fn multiple_blocks_rewritten_independently() {
        let catalog = catalog_with_users();
        let text = "-- name: A :many\nSELECT * FROM users;\n-- name: B :many\nSELECT balance - 1 FROM users;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert!(rewritten.contains("SELECT id, balance FROM users;"));
        assert!(rewritten.contains("AS balance_minus_1"));
        assert_eq!(report.expanded_stars, 1);
        assert_eq!(report.added_aliases.len(), 1);
    }

    #[test]
    fn qualified_star_expands_without_aliasing_the_expanded_columns() {
        let mut catalog = Catalog::new();
        let mut table = Table::new("users", Span::point("schema.sql", 1, 1));
        table.columns.push(Column {
            name: "id".into(),
            type_text: "INTEGER".into(),
            not_null: true,
            default: None,
            references: None,
            span: Span::point("schema.sql", 1, 1),
        });
        table.columns.push(Column {
            name: "email".into(),
            type_text: "TEXT".into(),
            not_null: true,
            default: None,
            references: None,
            span: Span::point("schema.sql", 1, 1),
        });
        catalog.tables.insert(table.canonical(), table);
        let text = "-- name: GetUser :one\nSELECT u.*\nFROM users AS u;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert_eq!(rewritten, "-- name: GetUser :one\nSELECT u.id, u.email\nFROM users AS u;\n");
        assert_eq!(report.added_aliases.len(), 0);
    }

    #[test]
    fn unresolved_qualifier_records_warning_naming_it() {
        let catalog = catalog_with_users();
        let text = "-- name: X :many\nSELECT x.* FROM users AS u;\n";
        let cancel = CancellationToken::new();
        let (rewritten, report) = rewrite_file("f.sql", text, &catalog, &cancel).unwrap();
        assert_eq!(rewritten, text);
        assert_eq!(report.warnings.iter().filter(|d| d.code == DiagnosticCode::UnresolvedStarQualifier).count(), 1);
        assert!(report.warnings.iter().any(|d| d.message.contains('x')));
    }

    #[test]
    fn cancellation_stops_before_processing_blocks() {
        let catalog = catalog_with_users();
        let text = "-- name: A :many\nSELECT * FROM users;\n";
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(rewrite_file("f.sql", text, &catalog, &cancel).is_err());
    }
}
