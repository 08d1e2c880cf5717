use thiserror::Error;

use crate::span::Span;

/// A tokenizer failure. Fatal to the file being scanned: no partial token
/// sequence or catalog is produced when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("{path}: invalid UTF-8")]
    InvalidUtf8 { path: String },
    #[error("{span}: unterminated block comment")]
    UnterminatedBlockComment { span: Span },
    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("{span}: unterminated quoted identifier")]
    UnterminatedQuotedIdentifier { span: Span },
    #[error("{span}: unterminated blob literal")]
    UnterminatedBlob { span: Span },
    #[error("{span}: blob literal must have an even number of hex digits")]
    OddBlobLength { span: Span },
    #[error("{span}: invalid hex digit in blob literal")]
    InvalidBlobHex { span: Span },
}

/// Returned by any operation that observed a cancellation request. No
/// diagnostics are produced for the unit of work in progress.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;
