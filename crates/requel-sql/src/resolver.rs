//! Schema resolution for normalized statements
//!
//! Validates that every referenced relation is declared and types the
//! returned fields from the schema.
//!
//! Known limitation: a bare column always resolves against the statement's
//! first relation, even in a join where another relation owns the column.

use requel_core::{
    Diagnostic, DiagnosticCode, FieldKind, NormalizedStatement, OutputField, Schema,
};

use crate::error::AnalysisError;

/// Type reported for columns the schema does not declare
pub const UNKNOWN_TYPE: &str = "unknown";

/// Resolver over an immutable schema
pub struct SchemaResolver<'a> {
    schema: &'a Schema,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SchemaResolver<'a> {
    /// Create a new resolver
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            diagnostics: Vec::new(),
        }
    }

    /// Resolve the returned fields of a statement
    ///
    /// Fails on the first relation missing from the schema, before any field
    /// is looked at.
    pub fn resolve(
        &mut self,
        normalized: &NormalizedStatement,
    ) -> Result<Vec<OutputField>, AnalysisError> {
        let schema = self.schema;
        let mut tables = Vec::with_capacity(normalized.relations.len());
        for relation in &normalized.relations {
            let table = schema
                .table(&relation.name)
                .ok_or_else(|| AnalysisError::UnknownRelation {
                    relation: relation.name.clone(),
                })?;
            tables.push((relation.name.as_str(), table));
        }

        let mut outputs = Vec::new();

        for field in &normalized.fields {
            match field.kind {
                FieldKind::Wildcard => {
                    for (relation, table) in &tables {
                        outputs.extend(table.iter().map(|(column, declared)| OutputField {
                            name: column.clone(),
                            relation: relation.to_string(),
                            type_name: declared.type_name.clone(),
                            alias: None,
                            nullable: declared.nullable,
                            array: declared.array,
                        }));
                    }
                }
                FieldKind::Column => {
                    let (relation, declared) = match tables.first() {
                        Some((relation, table)) => (*relation, table.get(&field.name)),
                        None => ("", None),
                    };

                    let mut output = match declared {
                        Some(declared) => OutputField {
                            name: field.name.clone(),
                            relation: relation.to_string(),
                            type_name: declared.type_name.clone(),
                            alias: None,
                            nullable: declared.nullable,
                            array: declared.array,
                        },
                        None => {
                            self.unknown_column(&field.name, relation);
                            OutputField::new(&field.name, relation, UNKNOWN_TYPE)
                        }
                    };
                    output.alias = field.alias.clone();
                    outputs.push(output);
                }
            }
        }

        Ok(outputs)
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn unknown_column(&mut self, column: &str, relation: &str) {
        let message = if relation.is_empty() {
            format!("Column `{}` has no relation to resolve against", column)
        } else {
            format!("Unknown column `{}` on relation `{}`", column, relation)
        };

        tracing::debug!(column, relation, "column not declared in schema");
        self.diagnostics
            .push(Diagnostic::warn(DiagnosticCode::SqlUnknownColumn, message));
    }
}
