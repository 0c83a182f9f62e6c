//! Fatal analysis errors
//!
//! None of these are recovered inside the analyzer; the caller reports them
//! against the file and skips its declaration.

use requel_core::{Diagnostic, DiagnosticCode, Location, Severity};

use crate::parser::ParseError;

/// Analysis errors
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unsupported statement `{kind}` `{sql}`")]
    UnsupportedStatementKind { kind: String, sql: String },

    #[error("Unknown relation `{relation}`")]
    UnknownRelation { relation: String },

    #[error("No statement to analyze")]
    UnknownStatement,
}

impl AnalysisError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::Parse(_) => DiagnosticCode::SqlParseError,
            Self::UnsupportedStatementKind { .. } => DiagnosticCode::SqlUnsupportedStatement,
            Self::UnknownRelation { .. } => DiagnosticCode::SqlUnknownRelation,
            Self::UnknownStatement => DiagnosticCode::SqlNoStatement,
        }
    }

    /// Convert to an error diagnostic, located at `file` when given
    pub fn to_diagnostic(&self, file: Option<&str>) -> Diagnostic {
        let diag = match self {
            Self::Parse(e) => e.to_diagnostic(),
            _ => Diagnostic::new(self.code(), Severity::Error, self.to_string()),
        };

        match file {
            Some(file) => diag.with_location(Location::new(file)),
            None => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = AnalysisError::UnsupportedStatementKind {
            kind: "truncate".to_string(),
            sql: "truncate table products".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported statement `truncate` `truncate table products`");

        let err = AnalysisError::UnknownRelation { relation: "products".to_string() };
        assert_eq!(err.to_string(), "Unknown relation `products`");
    }

    #[test]
    fn diagnostic_carries_code_and_file() {
        let err = AnalysisError::UnknownStatement;
        let diag = err.to_diagnostic(Some("db/empty.sql"));

        assert_eq!(diag.code, DiagnosticCode::SqlNoStatement);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.location.unwrap().file, "db/empty.sql");
    }
}
