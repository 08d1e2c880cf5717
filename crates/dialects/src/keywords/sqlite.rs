use sqlfix_core::keywords::{KeywordTable, COMMON_KEYWORDS};

pub static SQLITE_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "CREATE", "TABLE", "VIEW", "INDEX", "TEMP", "TEMPORARY", "IF", "ALTER",
    "ADD", "COLUMN", "DROP", "PRIMARY", "KEY", "UNIQUE", "CHECK", "DEFAULT",
    "REFERENCES", "CONSTRAINT", "FOREIGN", "AUTOINCREMENT", "WITHOUT",
    "ROWID", "STRICT", "COLLATE", "ASC", "DESC", "NULLS", "FIRST", "LAST",
    "USING",
};

pub struct SqliteKeywords;

impl KeywordTable for SqliteKeywords {
    fn is_keyword(&self, upper: &str) -> bool {
        COMMON_KEYWORDS.contains(upper) || SQLITE_KEYWORDS.contains(upper)
    }
}
