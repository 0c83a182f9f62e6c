//! Analysis pipeline for one SQL file
//!
//! source text -> front matter split -> parameters (from the raw body) and
//! parse -> normalize -> resolve -> `AnalyzedStatement`.

use indexmap::IndexMap;
use requel_core::{AnalyzedStatement, Diagnostic, DiagnosticCode, InputParameter, Schema};
use sqlparser::ast::Statement;
use std::path::Path;

use crate::error::AnalysisError;
use crate::front_matter::split_front_matter;
use crate::normalize::StatementNormalizer;
use crate::params::ParameterExtractor;
use crate::parser::SqlParser;
use crate::resolver::SchemaResolver;

/// Analyzer bound to a parser dialect and a schema snapshot
///
/// Holds no mutable state; one analyzer can serve any number of files.
pub struct Analyzer<'a> {
    parser: SqlParser,
    schema: &'a Schema,
}

impl<'a> Analyzer<'a> {
    pub fn new(parser: SqlParser, schema: &'a Schema) -> Self {
        Self { parser, schema }
    }

    /// Analyze the first statement of a SQL file
    ///
    /// Further statements are neither normalized nor resolved; they only add
    /// a warning diagnostic.
    pub fn analyze(
        &self,
        source: &str,
        file_path: Option<&Path>,
    ) -> Result<AnalyzedStatement, AnalysisError> {
        let split = split_front_matter(source);
        let parsed = self.parser.parse(split.body, file_path)?;

        let Some((first, rest)) = parsed.statements.split_first() else {
            return Err(AnalysisError::UnknownStatement);
        };

        let mut analyzed = self.analyze_statement(first, split.body.trim())?;
        analyzed.inputs = self.extract_inputs(split.body, &split.metadata);

        if !rest.is_empty() {
            tracing::warn!(
                file = ?file_path,
                extra = rest.len(),
                "only the first statement is analyzed"
            );
            analyzed.diagnostics.push(Diagnostic::warn(
                DiagnosticCode::SqlMultipleStatements,
                format!("Ignored {} statement(s) after the first", rest.len()),
            ));
        }

        Ok(analyzed)
    }

    /// Analyze every statement of a SQL file
    ///
    /// All statements share the inputs extracted from the whole body. Never
    /// returns an empty list.
    pub fn analyze_all(
        &self,
        source: &str,
        file_path: Option<&Path>,
    ) -> Result<Vec<AnalyzedStatement>, AnalysisError> {
        let split = split_front_matter(source);
        let parsed = self.parser.parse(split.body, file_path)?;
        if parsed.statements.is_empty() {
            return Err(AnalysisError::UnknownStatement);
        }

        let inputs = self.extract_inputs(split.body, &split.metadata);
        let sql = split.body.trim();
        parsed
            .statements
            .iter()
            .map(|statement| {
                let mut analyzed = self.analyze_statement(statement, sql)?;
                analyzed.inputs = inputs.clone();
                Ok(analyzed)
            })
            .collect()
    }

    fn extract_inputs(
        &self,
        body: &str,
        metadata: &IndexMap<String, String>,
    ) -> Vec<InputParameter> {
        ParameterExtractor::new(self.parser.dialect()).extract(body, metadata)
    }

    fn analyze_statement(
        &self,
        statement: &Statement,
        sql: &str,
    ) -> Result<AnalyzedStatement, AnalysisError> {
        let mut normalizer = StatementNormalizer::new();
        let normalized = normalizer.normalize(statement, sql)?;

        let mut resolver = SchemaResolver::new(self.schema);
        let outputs = resolver.resolve(&normalized)?;

        let mut diagnostics = normalizer.into_diagnostics();
        diagnostics.extend(resolver.into_diagnostics());

        Ok(AnalyzedStatement {
            kind: normalized.kind,
            inputs: Vec::new(),
            outputs,
            diagnostics,
        })
    }
}
