use smol_str::SmolStr;
use sqlfix_core::model::normalize_identifier;
use sqlfix_core::token::{Token, TokenKind};

/// A `FROM`/`JOIN` entry resolved to `(alias, table, base-table?)`, used by
/// star expansion. A parenthesized subquery is recorded as not-a-base-table
/// so a bare `*` never tries to expand it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    pub alias_canonical: Option<String>,
    pub alias_normalized: Option<SmolStr>,
    pub table_canonical: String,
    pub table_normalized: SmolStr,
    pub base_table: bool,
}

/// Walks the `FROM`/`JOIN` chain of a re-tokenized SELECT at paren-depth 0,
/// ignoring subqueries. Stops at the next top-level clause keyword (`WHERE`,
/// `GROUP`, `ORDER`, `HAVING`, `LIMIT`, `OFFSET`, `UNION`, `;`, EOF).
pub fn find_relations(tokens: &[Token]) -> Vec<RelationRef> {
    let Some(from_idx) = tokens.iter().position(|t| t.is_keyword("FROM")) else {
        return Vec::new();
    };
    let mut relations = Vec::new();
    let mut i = from_idx + 1;
    let mut expect_relation = true;

    while i < tokens.len() {
        let t = &tokens[i];
        if t.kind == TokenKind::Eof || t.is_symbol(";") {
            break;
        }
        if is_clause_boundary(t) {
            break;
        }
        if t.is_keyword("JOIN") {
            expect_relation = true;
            i += 1;
            continue;
        }
        if !expect_relation {
            if t.is_symbol(",") {
                expect_relation = true;
                i += 1;
                continue;
            }
            if matches!(t.kind, TokenKind::Keyword)
                && matches!(
                    t.text.as_str(),
                    "INNER" | "OUTER" | "LEFT" | "RIGHT" | "FULL" | "CROSS" | "ON" | "AND" | "OR"
                )
            {
                // Skip join-condition / join-kind keywords and the
                // expression that follows ON, one token at a time, until
                // the next JOIN/comma/clause boundary.
                i += 1;
                continue;
            }
            i += 1;
            continue;
        }

        if t.is_symbol("(") {
            // Subquery: find its matching close paren, record as
            // not-a-base-table if it carries an alias, and resume after it.
            let close = skip_balanced(tokens, i);
            let has_as = tokens.get(close).map(|t| t.is_keyword("AS")).unwrap_or(false);
            let alias_idx = if has_as { close + 1 } else { close };
            let alias = tokens.get(alias_idx).and_then(relation_name);
            i = if alias.is_some() { alias_idx + 1 } else { close };
            relations.push(RelationRef {
                alias_canonical: alias.as_ref().map(|a| normalize_identifier(&a.text)),
                alias_normalized: alias.map(|a| a.text),
                table_canonical: String::new(),
                table_normalized: "".into(),
                base_table: false,
            });
            expect_relation = false;
            continue;
        }

        if let Some(table_tok) = relation_name(t) {
            let mut j = i + 1;
            let alias = if tokens.get(j).map(|n| n.is_keyword("AS")).unwrap_or(false) {
                j += 1;
                tokens.get(j).and_then(relation_name)
            } else {
                tokens.get(j).and_then(|n| {
                    if is_alias_candidate(n) {
                        Some(n.clone())
                    } else {
                        None
                    }
                })
            };
            if alias.is_some() {
                j += 1;
            }
            relations.push(RelationRef {
                alias_canonical: alias.as_ref().map(|a| normalize_identifier(&a.text)),
                alias_normalized: alias.as_ref().map(|a| a.text.clone()),
                table_canonical: normalize_identifier(&table_tok.text),
                table_normalized: table_tok.text.clone(),
                base_table: true,
            });
            i = j;
            expect_relation = false;
            continue;
        }

        i += 1;
    }

    relations
}

fn relation_name(t: &Token) -> Option<Token> {
    match t.kind {
        TokenKind::Identifier => Some(t.clone()),
        _ => None,
    }
}

fn is_alias_candidate(t: &Token) -> bool {
    t.kind == TokenKind::Identifier
}

fn skip_balanced(tokens: &[Token], open_idx: usize) -> usize {
    let mut depth = 0i32;
    let mut i = open_idx;
    while i < tokens.len() {
        if tokens[i].is_symbol("(") {
            depth += 1;
        } else if tokens[i].is_symbol(")") {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        }
        i += 1;
    }
    i
}

fn is_clause_boundary(t: &Token) -> bool {
    t.kind == TokenKind::Keyword
        && matches!(
            t.text.as_str(),
            "WHERE" | "GROUP" | "ORDER" | "HAVING" | "LIMIT" | "OFFSET" | "UNION" | "EXCEPT" | "INTERSECT"
        )
}

/// Resolves a `*` or `qualifier.*` star expression against the relation
/// list, returning the relation whose alias or table canonical name matches
/// `qualifier` (or the first base-table relation for a bare `*`).
pub fn resolve_star<'a>(relations: &'a [RelationRef], qualifier: Option<&str>) -> StarResolution<'a> {
    match qualifier {
        None => StarResolution::Bare(relations.iter().filter(|r| r.base_table).collect()),
        Some(q) => {
            let canonical = normalize_identifier(q);
            match relations.iter().find(|r| {
                r.alias_canonical.as_deref() == Some(canonical.as_str())
                    || r.table_canonical == canonical
            }) {
                Some(r) if r.base_table => StarResolution::Qualified(r),
                Some(_) => StarResolution::SubqueryQualifier,
                None => StarResolution::Unresolved,
            }
        }
    }
}

pub enum StarResolution<'a> {
    Bare(Vec<&'a RelationRef>),
    Qualified(&'a RelationRef),
    SubqueryQualifier,
    Unresolved,
}
