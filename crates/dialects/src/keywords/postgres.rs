use sqlfix_core::keywords::{KeywordTable, COMMON_KEYWORDS};

pub static POSTGRES_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "CREATE", "TABLE", "VIEW", "INDEX", "TEMP", "TEMPORARY", "IF", "ALTER",
    "ADD", "COLUMN", "DROP", "PRIMARY", "KEY", "UNIQUE", "CHECK", "DEFAULT",
    "REFERENCES", "CONSTRAINT", "FOREIGN", "GENERATED", "ALWAYS", "BY",
    "IDENTITY", "COLLATE", "ASC", "DESC", "NULLS", "FIRST", "LAST", "USING",
    "CONCURRENTLY", "TYPE", "DOMAIN", "ENUM", "EXCLUDE", "SERIAL",
    "BIGSERIAL", "SMALLSERIAL", "CASCADE", "RESTRICT", "NO", "ACTION",
    "NULL",
};

pub struct PostgresKeywords;

impl KeywordTable for PostgresKeywords {
    fn is_keyword(&self, upper: &str) -> bool {
        COMMON_KEYWORDS.contains(upper) || POSTGRES_KEYWORDS.contains(upper)
    }
}
