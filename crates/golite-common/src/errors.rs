use thiserror::Error;

use crate::span::Span;

/// Which analysis pass rejected the program.
///
/// Lexing and parsing failures belong to the external collaborators and
/// never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Static well-formedness violation (weeding).
    Weed,
    /// Redeclaration in the same scope, or an unresolved type reference.
    Symbol,
    /// Type incompatibility, arity mismatch, unknown member, bad operand.
    Type,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Weed => write!(f, "weed error"),
            ErrorKind::Symbol => write!(f, "symbol error"),
            ErrorKind::Type => write!(f, "type error"),
        }
    }
}

/// A fatal analysis error.
///
/// Every pass is fail-fast: the first violation is raised at the point of
/// detection with the offending node's position and unwinds the run. There
/// is no aggregation and no partial result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("weed error: [{span}] {message}")]
    Weed { message: String, span: Span },

    #[error("symbol error: [{span}] {message}")]
    Symbol { message: String, span: Span },

    #[error("type error: [{span}] {message}")]
    Type { message: String, span: Span },
}

impl AnalysisError {
    pub fn weed(message: impl Into<String>, span: Span) -> Self {
        Self::Weed {
            message: message.into(),
            span,
        }
    }

    pub fn symbol(message: impl Into<String>, span: Span) -> Self {
        Self::Symbol {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Weed { .. } => ErrorKind::Weed,
            Self::Symbol { .. } => ErrorKind::Symbol,
            Self::Type { .. } => ErrorKind::Type,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Weed { span, .. } | Self::Symbol { span, .. } | Self::Type { span, .. } => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Weed { message, .. }
            | Self::Symbol { message, .. }
            | Self::Type { message, .. } => message,
        }
    }
}
