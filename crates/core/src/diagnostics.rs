use smol_str::SmolStr;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A stable identifier for a diagnostic's condition, independent of its
/// human-readable message. Callers that need to branch on a particular
/// condition (the rewriter re-parsing after a recoverable error, say) match
/// on a code such as [`DiagnosticCode::ResultColumnRequiresAlias`] rather
/// than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    UnknownTopLevelStatement,
    UnsupportedAlterForm,
    AlterUnknownTable,
    UnknownIndexTable,
    DuplicateTableName,
    DuplicateColumnName,
    DuplicatePrimaryKey,
    UnresolvedConstraintColumn,
    UnresolvedForeignKeyTable,
    UnresolvedForeignKeyColumn,
    UnresolvedIndexColumn,
    DeprecatedConstruct,
    UnrecognizedTypeDecorator,
    ResultColumnRequiresAlias,
    MixedParameterStyles,
    UnresolvedStarQualifier,
    RewriteAbandoned,
}

/// A positional message surfaced to the caller. Path/line/column are
/// 1-based. Callers render this as `path:line:column: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: SmolStr,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, span: &Span, message: impl Into<String>) -> Self {
        Self {
            path: span.file.clone(),
            line: span.start_line,
            column: span.start_col,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: DiagnosticCode, span: &Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, span, message)
    }

    pub fn warning(code: DiagnosticCode, span: &Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, span, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: {}", self.path, self.line, self.column, self.message)
    }
}

pub type Diagnostics = Vec<Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_shape() {
        let span = Span::new("schema.sql", 4, 7, 4, 10);
        let diag = Diagnostic::error(DiagnosticCode::DuplicateTableName, &span, "duplicate table \"t\"");
        assert_eq!(diag.to_string(), "schema.sql:4:7: duplicate table \"t\"");
    }
}
