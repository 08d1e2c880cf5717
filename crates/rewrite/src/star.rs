use sqlfix_core::keywords::CommonKeywords;
use sqlfix_core::model::Catalog;
use sqlfix_core::{Diagnostic, DiagnosticCode, Diagnostics, Severity, Span, Tokenizer};
use sqlfix_query::QueryModel;

use crate::edit::Edit;
use crate::relation::{find_relations, resolve_star, StarResolution};

/// Finds every `*`/`qualifier.*` result column in `model`, resolves it
/// against `catalog`'s tables via the query's `FROM`/`JOIN` chain, and
/// returns one replacement `Edit` per star that resolved cleanly. A star
/// against a subquery or an unrecognized qualifier or table is left alone
/// and reported as a warning instead.
pub fn expand_stars(path: &str, sql: &str, model: &QueryModel, catalog: &Catalog, diagnostics: &mut Diagnostics) -> Vec<Edit> {
    let star_columns: Vec<_> = model
        .result_columns
        .iter()
        .filter(|c| c.expr == "*" || c.expr.ends_with(".*"))
        .collect();
    if star_columns.is_empty() {
        return Vec::new();
    }

    let tokens = match Tokenizer::tokenize(path, sql, false, &CommonKeywords) {
        Ok(tokens) => tokens,
        Err(_) => return Vec::new(),
    };
    let relations = find_relations(&tokens);

    let mut edits = Vec::new();
    for col in star_columns {
        let qualifier = col.expr.strip_suffix(".*");
        let span = Span::point(path, 1, 1);

        match resolve_star(&relations, qualifier) {
            StarResolution::Bare(rels) if !rels.is_empty() => {
                let mut names = Vec::new();
                let mut ok = true;
                for rel in &rels {
                    match catalog.table(&rel.table_canonical) {
                        Some(table) => names.extend(table.columns.iter().map(|c| c.name.to_string())),
                        None => {
                            ok = false;
                            diagnostics.push(Diagnostic::new(
                                Severity::Warning,
                                DiagnosticCode::UnresolvedStarQualifier,
                                &span,
                                format!("cannot expand `*`: table \"{}\" is not in the catalog", rel.table_normalized),
                            ));
                            break;
                        }
                    }
                }
                if ok && !names.is_empty() {
                    edits.push(Edit::replace(col.start_offset, col.end_offset, names.join(", ")));
                }
            }
            StarResolution::Bare(_) => {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticCode::UnresolvedStarQualifier,
                    &span,
                    "cannot expand `*`: no base-table relation in this query",
                ));
            }
            StarResolution::Qualified(rel) => match catalog.table(&rel.table_canonical) {
                Some(table) => {
                    let qualifier_text = rel.alias_normalized.as_deref().unwrap_or(rel.table_normalized.as_str());
                    let names: Vec<String> = table.columns.iter().map(|c| format!("{qualifier_text}.{}", c.name)).collect();
                    edits.push(Edit::replace(col.start_offset, col.end_offset, names.join(", ")));
                }
                None => {
                    diagnostics.push(Diagnostic::new(
                        Severity::Warning,
                        DiagnosticCode::UnresolvedStarQualifier,
                        &span,
                        format!("cannot expand `{}.*`: table \"{}\" is not in the catalog", qualifier.unwrap_or(""), rel.table_normalized),
                    ));
                }
            },
            StarResolution::SubqueryQualifier => {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticCode::UnresolvedStarQualifier,
                    &span,
                    format!("cannot expand `{}.*`: qualifier refers to a subquery", qualifier.unwrap_or("")),
                ));
            }
            StarResolution::Unresolved => {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticCode::UnresolvedStarQualifier,
                    &span,
                    format!("cannot expand `{}.*`: no matching relation in the query", qualifier.unwrap_or("")),
                ));
            }
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfix_core::model::{Column, Table};
    use sqlfix_core::Span as CoreSpan;
    use sqlfix_query::parse_query;

    fn catalog_with_users() -> Catalog {
        let mut catalog = Catalog::new();
        let mut table = Table::new("users", CoreSpan::point("schema.sql", 1, 1));
        table.columns.push(Column {
            name: "id".into(),
            type_text: "INTEGER".into(),
            not_null: true,
            default: None,
            references: None,
            span: CoreSpan::point("schema.sql", 1, 1),
        });
        table.columns.push(Column {
            name: "email".into(),
            type_text: "TEXT".into(),
            not_null: true,
            default: None,
            references: None,
            span: CoreSpan::point("schema.sql", 1, 1),
        });
        catalog.tables.insert(table.canonical(), table);
        catalog
    }

    #[test]
    fn bare_star_expands_to_column_list() {
        let catalog = catalog_with_users();
        let sql = "SELECT * FROM users";
        let model = parse_query("f.sql", sql).unwrap();
        let mut diags = Vec::new();
        let edits = expand_stars("f.sql", sql, &model, &catalog, &mut diags);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].text, "id, email");
        assert!(diags.is_empty());
    }

    #[test]
    fn qualified_star_uses_alias_as_prefix() {
        let catalog = catalog_with_users();
        let sql = "SELECT u.* FROM users AS u";
        let model = parse_query("f.sql", sql).unwrap();
        let mut diags = Vec::new();
        let edits = expand_stars("f.sql", sql, &model, &catalog, &mut diags);
        assert_eq!(edits[0].text, "u.id, u.email");
    }

    #[test]
    fn unknown_table_warns_without_editing() {
        let catalog = Catalog::new();
        let sql = "SELECT * FROM ghosts";
        let model = parse_query("f.sql", sql).unwrap();
        let mut diags = Vec::new();
        let edits = expand_stars("f.sql", sql, &model, &catalog, &mut diags);
        assert!(edits.is_empty());
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::UnresolvedStarQualifier));
    }

    #[test]
    fn subquery_qualifier_warns_without_editing() {
        let catalog = catalog_with_users();
        let sql = "SELECT sub.* FROM (SELECT 1) AS sub";
        let model = parse_query("f.sql", sql).unwrap();
        let mut diags = Vec::new();
        let edits = expand_stars("f.sql", sql, &model, &catalog, &mut diags);
        assert!(edits.is_empty());
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::UnresolvedStarQualifier));
    }

    #[test]
    fn no_star_columns_produces_no_edits() {
        let catalog = catalog_with_users();
        let sql = "SELECT id AS x FROM users";
        let model = parse_query("f.sql", sql).unwrap();
        let mut diags = Vec::new();
        let edits = expand_stars("f.sql", sql, &model, &catalog, &mut diags);
        assert!(edits.is_empty());
    }
}
