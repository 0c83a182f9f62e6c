//! SQL analysis
//!
//! This crate handles:
//! - Parsing SQL using datafusion-sqlparser-rs
//! - Splitting the metadata front matter off SQL files
//! - Normalizing statements into relations and returned fields
//! - Extracting named `:placeholder` parameters and their declared types
//! - Resolving relations and output columns against a declared schema

pub mod parser;
pub mod error;
pub mod front_matter;
pub mod normalize;
pub mod params;
pub mod resolver;
pub mod analyze;

pub use parser::{SqlParser, ParsedSql, ParseError};
pub use error::AnalysisError;
pub use front_matter::{split_front_matter, SqlSource};
pub use normalize::StatementNormalizer;
pub use params::{ParameterExtractor, PlaceholderStyle, RewrittenSql};
pub use resolver::SchemaResolver;
pub use analyze::Analyzer;
