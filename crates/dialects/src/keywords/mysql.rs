use sqlfix_core::keywords::{KeywordTable, COMMON_KEYWORDS};

pub static MYSQL_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "CREATE", "TABLE", "VIEW", "INDEX", "TEMPORARY", "IF", "ALTER", "ADD",
    "COLUMN", "DROP", "PRIMARY", "KEY", "UNIQUE", "CHECK", "DEFAULT",
    "REFERENCES", "CONSTRAINT", "FOREIGN", "AUTO_INCREMENT", "UNSIGNED",
    "ZEROFILL", "COMMENT", "CHARACTER", "SET", "COLLATE", "FULLTEXT",
    "SPATIAL", "SERIAL", "CASCADE", "RESTRICT", "NO", "ACTION", "NULL",
};

pub struct MysqlKeywords;

impl KeywordTable for MysqlKeywords {
    fn is_keyword(&self, upper: &str) -> bool {
        COMMON_KEYWORDS.contains(upper) || MYSQL_KEYWORDS.contains(upper)
    }
}
