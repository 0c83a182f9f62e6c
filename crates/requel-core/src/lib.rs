//! Requel Core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod model;
pub mod schema;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use model::{
    AnalyzedStatement, Field, FieldKind, InputParameter, NormalizedStatement, OutputField,
    Relation, StatementKind,
};
pub use schema::{Schema, SchemaError, SchemaField, TableSchema};
pub use report::{Report, ReportSummary, REPORT_VERSION};
pub use config::{BindingsConfig, Config, ConfigError, DialectConfig};
