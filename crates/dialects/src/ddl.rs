use sqlfix_core::model::{
    normalize_identifier, Column, ForeignKey, Index, PrimaryKey, Table, UniqueKey, View,
};
use sqlfix_core::rebuild::rebuild_sql;
use sqlfix_core::{DiagnosticCode, Span};
use sqlfix_helpers::IndexSet;

use crate::common::ParserState;

/// The handful of places the three dialects genuinely diverge: which
/// keywords end a type-spec/default expression, and what dialect-specific
/// column- or table-level constraint forms to try before falling back to
/// "unrecognized, skip it". Shared grammar lives in `ParserState`; this
/// trait is the seam the shared `parse_create_table` dispatches through.
pub trait DialectHooks {
    fn type_boundary_keywords(&self) -> &'static [&'static str];

    /// Try to parse one dialect-specific column constraint starting at the
    /// current token. Returns `true` if something was consumed.
    fn try_column_constraint(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) -> bool;

    /// Try to parse one dialect-specific table-level constraint / decorator
    /// (MySQL `INDEX`/`KEY`/`FULLTEXT`/`SPATIAL`, PostgreSQL `EXCLUDE`).
    fn try_table_constraint(&self, state: &mut ParserState, table: &mut Table) -> bool {
        let _ = (state, table);
        false
    }

    /// Inspects a column's freshly-reconstructed type text for a
    /// dialect-specific quirk that needs a diagnostic or a rewrite (e.g.
    /// MySQL/SQLite's non-native `SERIAL`). Default: no-op.
    fn after_type_spec(&self, state: &mut ParserState, col: &mut Column, table: &mut Table) {
        let _ = (state, col, table);
    }
}

/// `identifier type-spec column-constraint*`, consumed up to the next `,`
/// or the closing `)`.
fn parse_column_def(state: &mut ParserState, table: &mut Table, hooks: &dyn DialectHooks) {
    let name_tok = match state.parse_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected column name");
            return;
        }
    };
    let span = name_tok.span.clone();
    let type_text = state.parse_type_spec(hooks.type_boundary_keywords());
    let mut col = Column {
        name: name_tok.text,
        type_text: type_text.into(),
        not_null: false,
        default: None,
        references: None,
        span,
    };
    hooks.after_type_spec(state, &mut col, table);

    loop {
        if state.check_symbol(",") || state.check_symbol(")") || state.is_eof() {
            break;
        }
        if state.eat_keyword("PRIMARY") {
            state.eat_keyword("KEY");
            col.not_null = true;
            if table.primary_key.is_some() {
                state.warning(DiagnosticCode::DuplicatePrimaryKey, format!(
                    "table \"{}\" already has a primary key; column \"{}\"'s PRIMARY KEY is ignored",
                    table.name, col.name
                ));
            } else {
                table.primary_key = Some(PrimaryKey {
                    name: None,
                    columns: vec![col.name.clone()],
                    span: col.span.clone(),
                });
            }
            continue;
        }
        if state.eat_keyword("NOT") {
            state.eat_keyword("NULL");
            col.not_null = true;
            continue;
        }
        if state.eat_keyword("NULL") {
            continue;
        }
        if state.eat_keyword("DEFAULT") {
            col.default = Some(state.parse_default_value(hooks.type_boundary_keywords()));
            continue;
        }
        if state.eat_keyword("REFERENCES") {
            col.references = state.parse_foreign_key_ref();
            if let Some(reference) = &col.references {
                table.foreign_keys.push(ForeignKey {
                    name: None,
                    columns: vec![col.name.clone()],
                    reference: reference.clone(),
                    span: col.span.clone(),
                });
            }
            continue;
        }
        if state.eat_keyword("UNIQUE") {
            table.unique_keys.push(UniqueKey {
                name: None,
                columns: vec![col.name.clone()],
                span: col.span.clone(),
            });
            continue;
        }
        if state.eat_keyword("CHECK") {
            state.skip_check_expr();
            continue;
        }
        if hooks.try_column_constraint(state, &mut col, table) {
            continue;
        }
        // Unrecognized column attribute: consume one token and keep going
        // rather than looping forever or aborting the whole statement.
        state.warning(DiagnosticCode::UnrecognizedTypeDecorator, format!(
            "unrecognized column attribute near \"{}\"",
            state.peek().text
        ));
        state.advance();
    }

    table.columns.push(col);
}

/// `CONSTRAINT name`? followed by `PRIMARY KEY(cols)`, `UNIQUE(cols)`,
/// `FOREIGN KEY(cols) REFERENCES t(cols) [...]`, `CHECK(...)`, or a
/// dialect-specific form.
fn parse_table_constraint(state: &mut ParserState, table: &mut Table, hooks: &dyn DialectHooks) -> bool {
    let mut constraint_name = None;
    if state.eat_keyword("CONSTRAINT") {
        constraint_name = state.parse_name().map(|t| t.text);
    }

    if state.eat_keyword("PRIMARY") {
        state.eat_keyword("KEY");
        let span = state.peek().span.clone();
        let columns = state.parse_column_name_list();
        if table.primary_key.is_some() {
            state.warning(DiagnosticCode::DuplicatePrimaryKey, format!(
                "table \"{}\" already has a primary key; this PRIMARY KEY constraint is ignored",
                table.name
            ));
        } else {
            table.primary_key = Some(PrimaryKey {
                name: constraint_name.map(Into::into),
                columns: columns.into_iter().map(Into::into).collect(),
                span,
            });
        }
        return true;
    }
    if state.eat_keyword("UNIQUE") {
        state.eat_keyword("KEY");
        if constraint_name.is_none() && !state.check_symbol("(") {
            constraint_name = state.parse_name().map(|t| t.text);
        }
        let span = state.peek().span.clone();
        let columns = state.parse_column_name_list();
        table.unique_keys.push(UniqueKey {
            name: constraint_name.map(Into::into),
            columns: columns.into_iter().map(Into::into).collect(),
            span,
        });
        return true;
    }
    if state.eat_keyword("FOREIGN") {
        state.eat_keyword("KEY");
        if constraint_name.is_none() && !state.check_symbol("(") {
            constraint_name = state.parse_name().map(|t| t.text);
        }
        let span = state.peek().span.clone();
        let columns = state.parse_column_name_list();
        if state.eat_keyword("REFERENCES") {
            if let Some(reference) = state.parse_foreign_key_ref() {
                table.foreign_keys.push(ForeignKey {
                    name: constraint_name.map(Into::into),
                    columns: columns.into_iter().map(Into::into).collect(),
                    reference,
                    span,
                });
            }
        }
        return true;
    }
    if state.eat_keyword("CHECK") {
        state.skip_check_expr();
        return true;
    }
    if constraint_name.is_some() {
        // A `CONSTRAINT name` with a form we don't otherwise recognize.
        return true;
    }
    hooks.try_table_constraint(state, table)
}

/// `CREATE TABLE [IF NOT EXISTS] name (col-or-constraint, ...) [table-opts]`.
/// Caller has already consumed `CREATE` [`TEMP`/`TEMPORARY`] `TABLE`.
pub fn parse_create_table(state: &mut ParserState, doc: Option<String>, hooks: &dyn DialectHooks) {
    if state.eat_keyword("IF") {
        state.eat_keyword("NOT");
        state.eat_keyword("EXISTS");
    }
    let name_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected table name after CREATE TABLE");
            state.sync();
            return;
        }
    };
    let mut table = Table::new(name_tok.text.clone(), name_tok.span.clone());
    table.doc = doc;

    if !state.eat_symbol("(") {
        state.error(DiagnosticCode::UnknownTopLevelStatement, "expected '(' after table name");
        state.sync();
        return;
    }
    loop {
        if state.check_symbol(")") || state.is_eof() {
            break;
        }
        let is_constraint_lead = state.check_keyword("CONSTRAINT")
            || state.check_keyword("PRIMARY")
            || state.check_keyword("UNIQUE")
            || state.check_keyword("FOREIGN")
            || state.check_keyword("CHECK")
            || state.check_keyword("INDEX")
            || state.check_keyword("KEY")
            || state.check_keyword("FULLTEXT")
            || state.check_keyword("SPATIAL")
            || state.check_keyword("EXCLUDE");
        if is_constraint_lead {
            parse_table_constraint(state, &mut table, hooks);
        } else {
            parse_column_def(state, &mut table, hooks);
        }
        if !state.eat_symbol(",") {
            break;
        }
    }
    state.eat_symbol(")");

    // SQLite table options; harmless no-ops on other dialects since these
    // keywords never appear there.
    loop {
        if state.eat_keyword("WITHOUT") {
            state.eat_keyword("ROWID");
            table.without_rowid = true;
            continue;
        }
        if state.eat_keyword("STRICT") {
            table.strict = true;
            continue;
        }
        if state.eat_symbol(",") {
            continue;
        }
        break;
    }
    state.eat_symbol(";");

    table.sort_constraints();
    let canonical = table.canonical();
    if state.catalog.tables.contains_key(&canonical) {
        state.error(DiagnosticCode::DuplicateTableName, format!("duplicate table \"{}\"", table.name));
        return;
    }
    if has_duplicate_columns(&table) {
        state.error(DiagnosticCode::DuplicateColumnName, format!("duplicate column name in table \"{}\"", table.name));
    }
    state.catalog.tables.insert(canonical, table);
}

fn has_duplicate_columns(table: &Table) -> bool {
    let mut seen: IndexSet<String> = IndexSet::default();
    for col in &table.columns {
        if !seen.insert(col.canonical()) {
            return true;
        }
    }
    false
}

/// `ALTER TABLE name ADD [COLUMN] coldef`. Other forms surface a warning.
pub fn parse_alter_table(state: &mut ParserState, hooks: &dyn DialectHooks) {
    let name_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected table name after ALTER TABLE");
            state.sync();
            return;
        }
    };
    let canonical = normalize_identifier(&name_tok.text);

    if !state.eat_keyword("ADD") {
        state.warning(DiagnosticCode::UnsupportedAlterForm, "unsupported ALTER TABLE form");
        state.sync();
        return;
    }
    state.eat_keyword("COLUMN");

    if !state.catalog.tables.contains_key(&canonical) {
        state.error(
            DiagnosticCode::AlterUnknownTable,
            format!("cannot alter unknown table \"{}\"", name_tok.text),
        );
        // Parse and discard the column def so position tracking stays sane.
        let mut scratch = Table::new(name_tok.text.clone(), name_tok.span.clone());
        parse_column_def(state, &mut scratch, hooks);
        state.eat_symbol(";");
        return;
    }

    let mut table = state.catalog.tables.remove(&canonical).unwrap();
    parse_column_def(state, &mut table, hooks);
    table.sort_constraints();
    state.catalog.tables.insert(canonical, table);
    state.eat_symbol(";");
}

/// `CREATE [UNIQUE] INDEX [dialect-decorators] name ON table (cols) [WHERE predicate]`.
/// Caller has already consumed `CREATE`.
pub fn parse_create_index(state: &mut ParserState) {
    let unique = state.eat_keyword("UNIQUE");
    state.eat_keyword("FULLTEXT");
    state.eat_keyword("SPATIAL");
    state.eat_keyword("INDEX");
    state.eat_keyword("CONCURRENTLY");
    let mut using_method = None;
    if state.eat_keyword("IF") {
        state.eat_keyword("NOT");
        state.eat_keyword("EXISTS");
    }
    let name_tok = match state.parse_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected index name");
            state.sync();
            return;
        }
    };
    state.eat_keyword("ON");
    let table_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected table name in CREATE INDEX");
            state.sync();
            return;
        }
    };
    if state.eat_keyword("USING") {
        using_method = state.parse_name().map(|t| t.text);
    }
    let _ = using_method;
    let columns = state.parse_column_name_list();

    if state.eat_keyword("WHERE") {
        // Partial-index predicate: consumed and discarded up to the
        // statement terminator.
        while !state.check_symbol(";") && !state.is_eof() {
            state.advance();
        }
    }
    state.eat_symbol(";");

    let table_canonical = normalize_identifier(&table_tok.text);
    let Some(table) = state.catalog.tables.get_mut(&table_canonical) else {
        state.error(
            DiagnosticCode::UnknownIndexTable,
            format!("index \"{}\" references unknown table \"{}\"", name_tok.text, table_tok.text),
        );
        return;
    };
    table.indexes.push(Index {
        name: name_tok.text,
        table: table_tok.text,
        columns: columns.into_iter().map(Into::into).collect(),
        unique,
        span: name_tok.span,
    });
    table.sort_constraints();
}

/// `CREATE [OR REPLACE] [TEMP|TEMPORARY] VIEW name [(cols)] AS <body>;`.
/// Caller has already consumed `CREATE`.
pub fn parse_create_view(state: &mut ParserState, doc: Option<String>) {
    state.eat_keyword("OR");
    let _ = state.eat_keyword("REPLACE");
    let _ = state.eat_keyword("TEMP") || state.eat_keyword("TEMPORARY");
    state.eat_keyword("VIEW");
    if state.eat_keyword("IF") {
        state.eat_keyword("NOT");
        state.eat_keyword("EXISTS");
    }
    let name_tok = match state.parse_qualified_name() {
        Some(t) => t,
        None => {
            state.error(DiagnosticCode::UnknownTopLevelStatement, "expected view name");
            state.sync();
            return;
        }
    };
    if state.check_symbol("(") {
        state.parse_column_name_list();
    }
    if !state.eat_keyword("AS") {
        state.error(DiagnosticCode::UnknownTopLevelStatement, "expected AS in CREATE VIEW");
        state.sync();
        return;
    }
    let mut body = Vec::new();
    let mut depth = 0i32;
    loop {
        if state.is_eof() {
            break;
        }
        if depth == 0 && state.check_symbol(";") {
            break;
        }
        let tok = state.peek().clone();
        if tok.is_symbol("(") {
            depth += 1;
        } else if tok.is_symbol(")") {
            depth -= 1;
        }
        body.push(state.advance());
    }
    state.eat_symbol(";");

    let span = name_tok.span.clone();
    let view = View {
        name: name_tok.text.clone(),
        doc,
        sql: rebuild_sql(&body),
        span,
    };
    state.catalog.views.insert(normalize_identifier(&view.name), view);
}

/// The validation pass run after all statements in a file have been parsed:
/// every PK/UK/FK/Index column must resolve within its owning table; every
/// FK target table and (if named) target column must exist. Tables are
/// visited in sorted canonical order (the `BTreeMap`'s natural iteration
/// order) so diagnostics are deterministic across runs.
pub fn validate(state: &mut ParserState) {
    let names: Vec<String> = state.catalog.tables.keys().cloned().collect();
    for canonical in names {
        let table = state.catalog.tables.get(&canonical).unwrap().clone();
        check_columns(state, &table, table.primary_key.as_ref().map(|pk| &pk.columns), &table.span);
        for uk in &table.unique_keys {
            check_columns(state, &table, Some(&uk.columns), &uk.span);
        }
        for fk in &table.foreign_keys {
            check_columns(state, &table, Some(&fk.columns), &fk.span);
            check_foreign_key(state, &table, fk);
        }
        for idx in &table.indexes {
            check_index_columns(state, &table, idx);
        }
    }
}

fn check_columns(state: &mut ParserState, table: &Table, columns: Option<&Vec<smol_str::SmolStr>>, span: &Span) {
    let Some(columns) = columns else { return };
    for col in columns {
        if table.column(&normalize_identifier(col)).is_none() {
            state.diagnostics.push(sqlfix_core::Diagnostic::error(
                DiagnosticCode::UnresolvedConstraintColumn,
                span,
                format!("column \"{col}\" does not exist on table \"{}\"", table.name),
            ));
        }
    }
}

fn check_foreign_key(state: &mut ParserState, table: &Table, fk: &ForeignKey) {
    let Some(target) = state.catalog.tables.get(fk.reference.table_canonical.as_str()) else {
        state.diagnostics.push(sqlfix_core::Diagnostic::error(
            DiagnosticCode::UnresolvedForeignKeyTable,
            &fk.span,
            format!(
                "foreign key on table \"{}\" references unknown table \"{}\"",
                table.name, fk.reference.table
            ),
        ));
        return;
    };
    for col in &fk.reference.columns {
        if target.column(&normalize_identifier(col)).is_none() {
            state.diagnostics.push(sqlfix_core::Diagnostic::error(
                DiagnosticCode::UnresolvedForeignKeyColumn,
                &fk.span,
                format!(
                    "foreign key references unknown column \"{col}\" on table {}",
                    target.name
                ),
            ));
        }
    }
}

fn check_index_columns(state: &mut ParserState, table: &Table, idx: &Index) {
    for col in &idx.columns {
        if table.column(&normalize_identifier(col)).is_none() {
            state.diagnostics.push(sqlfix_core::Diagnostic::error(
                DiagnosticCode::UnresolvedIndexColumn,
                &idx.span,
                format!("index \"{}\" references unknown column \"{col}\"", idx.name),
            ));
        }
    }
}
