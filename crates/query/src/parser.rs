use smol_str::SmolStr;
use sqlfix_core::keywords::CommonKeywords;
use sqlfix_core::rebuild::rebuild_sql;
use sqlfix_core::token::{Token, TokenKind};
use sqlfix_core::{Diagnostic, DiagnosticCode, Diagnostics, Severity, TokenizeError, Tokenizer};

use crate::offset::byte_offset;
use crate::verb::StatementVerb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamStyle {
    Positional,
    Named,
    Dollar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub style: ParamStyle,
    pub name: Option<SmolStr>,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub expr: String,
    pub alias: Option<SmolStr>,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryModel {
    pub verb: StatementVerb,
    pub parameters: Vec<Parameter>,
    pub result_columns: Vec<ResultColumn>,
    pub ctes: Vec<SmolStr>,
    pub diagnostics: Diagnostics,
}

/// Tokenizes a block's SQL (doc capture off) and extracts verb, parameters,
/// result columns, and CTE names.
pub fn parse_query(path: &str, sql: &str) -> Result<QueryModel, TokenizeError> {
    let keywords = CommonKeywords;
    let tokens = Tokenizer::tokenize(path, sql, false, &keywords)?;

    let verb = detect_verb(&tokens);
    let (parameters, mut diagnostics) = extract_parameters(&tokens);
    let ctes = extract_ctes(&tokens);
    let result_columns = if verb == StatementVerb::Select {
        extract_result_columns(sql, &tokens, &mut diagnostics)
    } else {
        Vec::new()
    };

    Ok(QueryModel {
        verb,
        parameters,
        result_columns,
        ctes,
        diagnostics,
    })
}

fn detect_verb(tokens: &[Token]) -> StatementVerb {
    let Some(first) = tokens.iter().find(|t| t.kind != TokenKind::Eof) else {
        return StatementVerb::Other;
    };
    if first.is_keyword("SELECT") || first.is_keyword("WITH") {
        return StatementVerb::Select;
    }
    if first.is_keyword("UPDATE") {
        return StatementVerb::Update;
    }
    if first.is_keyword("DELETE") {
        return StatementVerb::Delete;
    }
    if first.is_keyword("INSERT") {
        if is_upsert(tokens) {
            return StatementVerb::Upsert;
        }
        return StatementVerb::Insert;
    }
    StatementVerb::Other
}

fn is_upsert(tokens: &[Token]) -> bool {
    let Some(conflict_idx) = tokens
        .iter()
        .position(|t| t.is_keyword("ON"))
        .filter(|&i| tokens.get(i + 1).map(|t| t.is_keyword("CONFLICT")).unwrap_or(false))
    else {
        return false;
    };
    tokens[conflict_idx..]
        .iter()
        .skip_while(|t| !t.is_symbol(")"))
        .skip(1)
        .take(2)
        .any(|t| t.is_keyword("UPDATE"))
}

fn extract_parameters(tokens: &[Token]) -> (Vec<Parameter>, Diagnostics) {
    let mut out = Vec::new();
    let mut seen_named: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut seen_dollar: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    let mut styles_seen = std::collections::HashSet::new();
    let mut diagnostics = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_symbol("?") {
            let name = synthesize_positional_name(tokens, i);
            out.push(Parameter {
                style: ParamStyle::Positional,
                name,
                order: out.len() + 1,
            });
            styles_seen.insert(ParamStyle::Positional);
            i += 1;
            continue;
        }
        if tok.kind == TokenKind::Param {
            if let Ok(n) = tok.text.trim_start_matches('$').parse::<usize>() {
                if !seen_dollar.contains_key(&n) {
                    seen_dollar.insert(n, out.len());
                    out.push(Parameter {
                        style: ParamStyle::Dollar,
                        name: None,
                        order: n,
                    });
                }
            }
            styles_seen.insert(ParamStyle::Dollar);
            i += 1;
            continue;
        }
        if tok.is_symbol(":") {
            if let Some(next) = tokens.get(i + 1) {
                let adjacent = next.span.start_line == tok.span.end_line && next.span.start_col == tok.span.end_col;
                if adjacent && matches!(next.kind, TokenKind::Identifier | TokenKind::Keyword) {
                    let canonical = next.text.to_lowercase();
                    if !seen_named.contains_key(&canonical) {
                        seen_named.insert(canonical, out.len());
                        out.push(Parameter {
                            style: ParamStyle::Named,
                            name: Some(next.text.clone()),
                            order: out.len() + 1,
                        });
                    }
                    styles_seen.insert(ParamStyle::Named);
                    i += 2;
                    continue;
                }
            }
        }
        i += 1;
    }

    if styles_seen.len() > 1 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            DiagnosticCode::MixedParameterStyles,
            &tokens.first().map(|t| t.span.clone()).unwrap_or_else(|| sqlfix_core::Span::point("", 1, 1)),
            "query mixes more than one parameter style",
        ));
    }

    (out, diagnostics)
}

fn synthesize_positional_name(tokens: &[Token], idx: usize) -> Option<SmolStr> {
    if idx >= 2 && tokens[idx - 1].is_symbol("=") {
        if let TokenKind::Identifier | TokenKind::Keyword = tokens[idx - 2].kind {
            return Some(tokens[idx - 2].text.to_lowercase().into());
        }
    }
    None
}

fn extract_ctes(tokens: &[Token]) -> Vec<SmolStr> {
    let mut names = Vec::new();
    let Some(with_idx) = tokens.iter().position(|t| t.is_keyword("WITH")) else {
        return names;
    };
    if with_idx != 0 {
        return names;
    }
    let mut i = with_idx + 1;
    if tokens.get(i).map(|t| t.is_keyword("RECURSIVE")).unwrap_or(false) {
        i += 1;
    }
    loop {
        let Some(name_tok) = tokens.get(i) else { break };
        if !matches!(name_tok.kind, TokenKind::Identifier | TokenKind::Keyword) {
            break;
        }
        names.push(name_tok.text.clone());
        i += 1;
        if tokens.get(i).map(|t| t.is_keyword("AS")).unwrap_or(false) {
            i += 1;
        }
        if tokens.get(i).map(|t| t.is_symbol("(")).unwrap_or(false) {
            i = skip_balanced(tokens, i);
        }
        if tokens.get(i).map(|t| t.is_symbol(",")).unwrap_or(false) {
            i += 1;
            continue;
        }
        break;
    }
    names
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

fn extract_result_columns(sql: &str, tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<ResultColumn> {
    let Some(select_idx) = tokens.iter().position(|t| t.is_keyword("SELECT")) else {
        return Vec::new();
    };
    let mut i = select_idx + 1;
    if tokens.get(i).map(|t| t.is_keyword("DISTINCT")).unwrap_or(false) {
        i += 1;
    }
    if tokens.get(i).map(|t| t.is_keyword("ALL")).unwrap_or(false) {
        i += 1;
    }

    let mut end = i;
    let mut depth = 0i32;
    while end < tokens.len() {
        let t = &tokens[end];
        if t.kind == TokenKind::Eof {
            break;
        }
        if t.is_symbol("(") {
            depth += 1;
        } else if t.is_symbol(")") {
            depth -= 1;
        } else if depth == 0 && t.is_keyword("FROM") {
            break;
        }
        end += 1;
    }

    let mut columns = Vec::new();
    let mut seg_start = i;
    depth = 0;
    let mut j = i;
    while j <= end {
        let at_boundary = j == end;
        let is_comma = !at_boundary && depth == 0 && tokens[j].is_symbol(",");
        if !at_boundary {
            if tokens[j].is_symbol("(") {
                depth += 1;
            } else if tokens[j].is_symbol(")") {
                depth -= 1;
            }
        }
        if is_comma || at_boundary {
            if j > seg_start {
                columns.push(build_result_column(sql, &tokens[seg_start..j], diagnostics));
            }
            seg_start = j + 1;
        }
        j += 1;
    }
    columns
}

fn build_result_column(sql: &str, seg: &[Token], diagnostics: &mut Diagnostics) -> ResultColumn {
    let start_span = seg.first().unwrap().span.clone();
    let end_span = seg.last().unwrap().span.clone();
    let start_offset = byte_offset(sql, start_span.start_line, start_span.start_col);
    let end_offset = byte_offset(sql, end_span.end_line, end_span.end_col);

    let (expr_tokens, alias) = if seg.len() >= 2 && seg[seg.len() - 2].is_keyword("AS") {
        (&seg[..seg.len() - 2], Some(seg.last().unwrap().text.clone()))
    } else {
        (seg, None)
    };
    let expr = rebuild_sql(expr_tokens);

    if alias.is_none() && !is_star_expr(expr_tokens) && !is_simple_column_ref(&expr) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            DiagnosticCode::ResultColumnRequiresAlias,
            &start_span,
            format!("result column \"{expr}\" requires an alias"),
        ));
    }

    ResultColumn {
        expr,
        alias,
        start_offset,
        end_offset,
    }
}

fn is_star_expr(tokens: &[Token]) -> bool {
    matches!(tokens.last(), Some(t) if t.is_symbol("*"))
}

/// True for a bare column reference (`id`) or a dot-qualified one (`u.id`):
/// a projection that already carries its own name, so a downstream generator
/// can name it without an inserted alias. Anything with an operator, a call,
/// a literal, or more than one `.` needs a derived alias instead.
pub fn is_simple_column_ref(expr: &str) -> bool {
    if expr.eq_ignore_ascii_case("TRUE") || expr.eq_ignore_ascii_case("FALSE") || expr.eq_ignore_ascii_case("NULL") {
        return false;
    }
    let banned = ['(', ')', '+', '-', '*', '/', '%', '\'', ' '];
    if expr.chars().any(|c| banned.contains(&c)) {
        return false;
    }
    let parts: Vec<&str> = expr.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }
    parts.iter().all(|p| !p.is_empty() && !p.chars().next().unwrap().is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_select_verb() {
        let model = parse_query("f.sql", "SELECT 1").unwrap();
        assert_eq!(model.verb, StatementVerb::Select);
    }

    #[test]
    fn detects_upsert_verb() {
        let model = parse_query(
            "f.sql",
            "INSERT INTO t (a) VALUES (1) ON CONFLICT (a) DO UPDATE SET a = 1",
        )
        .unwrap();
        assert_eq!(model.verb, StatementVerb::Upsert);
    }

    #[test]
    fn plain_insert_is_not_upsert() {
        let model = parse_query("f.sql", "INSERT INTO t (a) VALUES (1)").unwrap();
        assert_eq!(model.verb, StatementVerb::Insert);
    }

    #[test]
    fn positional_parameters_recorded() {
        let model = parse_query("f.sql", "SELECT * FROM t WHERE id = ?").unwrap();
        assert_eq!(model.parameters.len(), 1);
        assert_eq!(model.parameters[0].style, ParamStyle::Positional);
        assert_eq!(model.parameters[0].name.as_deref(), Some("id"));
    }

    #[test]
    fn named_parameters_collapse_by_name() {
        let model = parse_query("f.sql", "SELECT * FROM t WHERE a = :x OR b = :x").unwrap();
        assert_eq!(model.parameters.len(), 1);
        assert_eq!(model.parameters[0].name.as_deref(), Some("x"));
    }

    #[test]
    fn dollar_parameters_recorded_with_order() {
        let model = parse_query("f.sql", "SELECT * FROM t WHERE a = $1 AND b = $2").unwrap();
        assert_eq!(model.parameters.len(), 2);
        assert_eq!(model.parameters[1].order, 2);
    }

    #[test]
    fn mixed_parameter_styles_warns() {
        let model = parse_query("f.sql", "SELECT * FROM t WHERE a = ? AND b = $1").unwrap();
        assert!(model.diagnostics.iter().any(|d| d.code == DiagnosticCode::MixedParameterStyles));
    }

    #[test]
    fn cte_names_extracted() {
        let model = parse_query("f.sql", "WITH recent AS (SELECT 1), old AS (SELECT 2) SELECT * FROM recent").unwrap();
        assert_eq!(model.ctes, vec!["recent".to_string(), "old".to_string()]);
    }

    #[test]
    fn result_column_without_alias_errors() {
        let model = parse_query("f.sql", "SELECT balance - tax FROM t").unwrap();
        assert!(model.diagnostics.iter().any(|d| d.code == DiagnosticCode::ResultColumnRequiresAlias));
    }

    #[test]
    fn star_expr_does_not_require_alias() {
        let model = parse_query("f.sql", "SELECT * FROM t").unwrap();
        assert!(model.diagnostics.is_empty());
        assert_eq!(model.result_columns[0].expr, "*");
    }

    #[test]
    fn bare_column_reference_does_not_require_alias() {
        let model = parse_query("f.sql", "SELECT id FROM t").unwrap();
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn qualified_column_reference_does_not_require_alias() {
        let model = parse_query("f.sql", "SELECT u.id FROM t u").unwrap();
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn numeric_literal_still_requires_alias() {
        let model = parse_query("f.sql", "SELECT 3.14 FROM t").unwrap();
        assert!(model.diagnostics.iter().any(|d| d.code == DiagnosticCode::ResultColumnRequiresAlias));
    }

    #[test]
    fn explicit_alias_recorded_with_offsets() {
        let model = parse_query("f.sql", "SELECT a AS b FROM t").unwrap();
        assert_eq!(model.result_columns[0].alias.as_deref(), Some("b"));
        let col = &model.result_columns[0];
        assert_eq!(&"SELECT a AS b FROM t"[col.start_offset..col.end_offset], "a AS b");
    }
}
