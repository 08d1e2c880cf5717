mod catalog;
mod name;
mod value;

pub use catalog::{
    Catalog, Column, Domain, Enum, ForeignKey, ForeignKeyRef, Index, PrimaryKey, Table, UniqueKey,
    View,
};
pub use name::{normalize_identifier, split_qualified};
pub use value::{Value, ValueKind};
