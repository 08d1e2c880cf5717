use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::span::Span;

use super::name::normalize_identifier;
use super::value::Value;

/// A foreign-key target: `table`, plus the referenced columns if named
/// explicitly. Stored by canonical string, never by pointer, so the catalog
/// has no ownership cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: SmolStr,
    pub table_canonical: SmolStr,
    pub columns: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: SmolStr,
    pub type_text: SmolStr,
    pub not_null: bool,
    pub default: Option<Value>,
    pub references: Option<ForeignKeyRef>,
    pub span: Span,
}

impl Column {
    pub fn canonical(&self) -> String {
        normalize_identifier(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub name: Option<SmolStr>,
    pub columns: Vec<SmolStr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: Option<SmolStr>,
    pub columns: Vec<SmolStr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: Option<SmolStr>,
    pub columns: Vec<SmolStr>,
    pub reference: ForeignKeyRef,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: SmolStr,
    pub table: SmolStr,
    pub columns: Vec<SmolStr>,
    pub unique: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: SmolStr,
    pub doc: Option<String>,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub unique_keys: Vec<UniqueKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub without_rowid: bool,
    pub strict: bool,
    pub span: Span,
}

impl Table {
    pub fn new(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            doc: None,
            columns: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            without_rowid: false,
            strict: false,
            span,
        }
    }

    pub fn canonical(&self) -> String {
        normalize_identifier(&self.name)
    }

    pub fn column(&self, canonical_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.canonical() == canonical_name)
    }

    /// Reorder all constraint/index collections using the deterministic sort
    /// keys so that diagnostics and rendered output are byte-identical
    /// across runs. Columns keep declaration order; they are not sorted.
    pub fn sort_constraints(&mut self) {
        self.unique_keys.sort_by(|a, b| sort_key_cols(&a.name, &a.columns).cmp(&sort_key_cols(&b.name, &b.columns)));
        self.foreign_keys.sort_by(|a, b| {
            sort_key_fk(&a.name, &a.columns, &a.reference.table)
                .cmp(&sort_key_fk(&b.name, &b.columns, &b.reference.table))
        });
        self.indexes.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

fn sort_key_cols(name: &Option<SmolStr>, columns: &[SmolStr]) -> String {
    let name = name.as_deref().unwrap_or("");
    format!("{name}\0{}", columns.join("\0"))
}

fn sort_key_fk(name: &Option<SmolStr>, columns: &[SmolStr], ref_table: &str) -> String {
    let name = name.as_deref().unwrap_or("");
    format!("{name}\0{}\0{ref_table}", columns.join("\0"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub name: SmolStr,
    pub doc: Option<String>,
    pub sql: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: SmolStr,
    pub values: Vec<SmolStr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: SmolStr,
    pub base_type: SmolStr,
    pub span: Span,
}

/// Pure data: the merged, normalized schema. Exclusively owned by its
/// creator until handed to a consumer, at which point it is treated as
/// immutable. `BTreeMap` is used deliberately here (not the ambient
/// `ahash`-backed `IndexMap`) because validation and rendering require
/// sorted-by-canonical-name iteration for byte-identical diagnostics across
/// runs — a correctness requirement, not a performance choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub tables: BTreeMap<String, Table>,
    pub views: BTreeMap<String, View>,
    pub enums: BTreeMap<String, Enum>,
    pub domains: BTreeMap<String, Domain>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, canonical_name: &str) -> Option<&Table> {
        self.tables.get(canonical_name)
    }

    pub fn table_mut(&mut self, canonical_name: &str) -> Option<&mut Table> {
        self.tables.get_mut(canonical_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new("f.sql", 1, 1, 1, 1)
    }

    #[test]
    fn sort_constraints_orders_by_name_then_columns() {
        let mut t = Table::new("t", span());
        t.unique_keys.push(UniqueKey {
            name: Some("zk".into()),
            columns: vec!["a".into()],
            span: span(),
        });
        t.unique_keys.push(UniqueKey {
            name: Some("ak".into()),
            columns: vec!["b".into()],
            span: span(),
        });
        t.sort_constraints();
        assert_eq!(t.unique_keys[0].name.as_deref(), Some("ak"));
        assert_eq!(t.unique_keys[1].name.as_deref(), Some("zk"));
    }

    #[test]
    fn indexes_sort_by_name() {
        let mut t = Table::new("t", span());
        t.indexes.push(Index {
            name: "z_idx".into(),
            table: "t".into(),
            columns: vec!["a".into()],
            unique: false,
            span: span(),
        });
        t.indexes.push(Index {
            name: "a_idx".into(),
            table: "t".into(),
            columns: vec!["a".into()],
            unique: false,
            span: span(),
        });
        t.sort_constraints();
        assert_eq!(t.indexes[0].name, "a_idx");
    }
}
