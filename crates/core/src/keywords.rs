/// A read-only keyword table: does an uppercased bare identifier count as a
/// keyword for the active dialect? Built once (typically as a `phf::Set`)
/// and shared by reference rather than cloned per parse.
pub trait KeywordTable {
    fn is_keyword(&self, upper: &str) -> bool;
}

impl<T: KeywordTable + ?Sized> KeywordTable for &T {
    fn is_keyword(&self, upper: &str) -> bool {
        (**self).is_keyword(upper)
    }
}

/// Clause-level keywords every dialect shares, used by the query parser
/// (which has no dialect context of its own) to recognize verbs and
/// result-column/CTE syntax without pulling in a full DDL grammar.
pub static COMMON_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "OUTER", "LEFT", "RIGHT", "FULL",
    "CROSS", "ON", "AS", "WITH", "RECURSIVE", "INSERT", "INTO", "VALUES",
    "UPDATE", "SET", "DELETE", "CONFLICT", "DO", "NOTHING", "RETURNING",
    "DISTINCT", "GROUP", "BY", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION",
    "ALL", "EXCEPT", "INTERSECT", "CASE", "WHEN", "THEN", "ELSE", "END",
    "AND", "OR", "NOT", "NULL", "TRUE", "FALSE", "IN", "EXISTS", "BETWEEN",
    "LIKE", "IS", "ASC", "DESC",
};

pub struct CommonKeywords;

impl KeywordTable for CommonKeywords {
    fn is_keyword(&self, upper: &str) -> bool {
        COMMON_KEYWORDS.contains(upper)
    }
}
