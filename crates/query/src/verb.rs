/// The `:verb` annotation on a query-block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockVerb {
    One,
    Many,
    Exec,
    ExecResult,
    ExecRows,
}

impl BlockVerb {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one" => Some(Self::One),
            "many" => Some(Self::Many),
            "exec" => Some(Self::Exec),
            "execresult" => Some(Self::ExecResult),
            "execrows" => Some(Self::ExecRows),
            _ => None,
        }
    }
}

/// The SQL statement kind, determined from the leading keyword of a block's
/// SQL body (not from its `:verb` annotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementVerb {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
    Other,
}
