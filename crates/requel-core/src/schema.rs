//! Declared relation schema
//!
//! The schema is the ground truth for relation existence and output column
//! types. Relation and column names are case-sensitive and keep declaration
//! order, which drives wildcard expansion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};

/// Declared type of a single column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaField {
    /// Type name as emitted into bindings (e.g. `number`, `string`)
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub array: bool,
}

impl SchemaField {
    /// Create a non-null, scalar column type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            nullable: false,
            array: false,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set array-ness
    pub fn with_array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }
}

/// Ordered columns of one relation
pub type TableSchema = IndexMap<String, SchemaField>;

/// Column entry of the list form of a relation
#[derive(Debug, Deserialize)]
struct NamedSchemaField {
    name: String,
    #[serde(flatten)]
    field: SchemaField,
}

/// A relation is written either as `column -> field` or as a list of named fields
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableDefinition {
    Columns(TableSchema),
    List(Vec<NamedSchemaField>),
}

impl From<TableDefinition> for TableSchema {
    fn from(definition: TableDefinition) -> Self {
        match definition {
            TableDefinition::Columns(columns) => columns,
            TableDefinition::List(fields) => fields
                .into_iter()
                .map(|named| (named.name, named.field))
                .collect(),
        }
    }
}

/// Mapping from relation name to its ordered columns
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "IndexMap<String, TableDefinition>")]
pub struct Schema {
    relations: IndexMap<String, TableSchema>,
}

impl From<IndexMap<String, TableDefinition>> for Schema {
    fn from(raw: IndexMap<String, TableDefinition>) -> Self {
        Self {
            relations: raw
                .into_iter()
                .map(|(name, definition)| (name, definition.into()))
                .collect(),
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.relations.serialize(serializer)
    }
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relation, replacing any previous definition with the same name
    pub fn with_table<I, K>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaField)>,
        K: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(column, field)| (column.into(), field))
            .collect();
        self.relations.insert(name.into(), columns);
        self
    }

    /// Columns of a relation, if declared
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.relations.get(name)
    }

    /// Relation names in declaration order
    pub fn table_names(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Load schema from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::ParseError(e.to_string()))
    }

    /// Load schema from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, SchemaError> {
        toml::from_str(toml).map_err(|e| SchemaError::ParseError(e.to_string()))
    }

    /// Load schema from a file, picking the format from its extension
    ///
    /// `.toml` files are read as TOML, everything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::IoError(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_json(&contents),
        }
    }
}

/// Schema loading errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SchemaError {
    /// Convert to an error diagnostic located at the schema file
    pub fn to_diagnostic(&self, path: &Path) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::SchemaLoadError, Severity::Error, self.to_string())
            .with_location(Location::new(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_keeps_declaration_order() {
        let schema = Schema::from_json(
            r#"{
                "products": {
                    "name": {"type": "string"},
                    "id": {"type": "number"},
                    "tags": {"type": "string", "array": true, "nullable": true}
                },
                "categories": {"id": {"type": "number"}}
            }"#,
        )
        .unwrap();

        assert_eq!(schema.table_names(), vec!["products", "categories"]);

        let products = schema.table("products").unwrap();
        let columns: Vec<&str> = products.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["name", "id", "tags"]);
        assert_eq!(
            products["tags"],
            SchemaField::new("string").with_array(true).with_nullable(true)
        );
    }

    #[test]
    fn list_form_is_accepted() {
        let schema = Schema::from_json(
            r#"{"products": [
                {"name": "id", "type": "number"},
                {"name": "name", "type": "string", "nullable": true}
            ]}"#,
        )
        .unwrap();

        let products = schema.table("products").unwrap();
        assert_eq!(products["id"], SchemaField::new("number"));
        assert!(products["name"].nullable);
    }

    #[test]
    fn toml_schema() {
        let schema = Schema::from_toml(
            r#"
            [products]
            id = { type = "number" }
            name = { type = "string" }
            "#,
        )
        .unwrap();

        assert!(schema.table("products").is_some());
        assert!(schema.table("Products").is_none());
    }

    #[test]
    fn invalid_schema_is_a_parse_error() {
        let result = Schema::from_json(r#"{"products": 42}"#);
        assert!(matches!(result, Err(SchemaError::ParseError(_))));
    }

    #[test]
    fn load_error_diagnostic() {
        let err = Schema::from_file(Path::new("/nonexistent/schema.json")).unwrap_err();
        let diag = err.to_diagnostic(Path::new("/nonexistent/schema.json"));

        assert_eq!(diag.code, DiagnosticCode::SchemaLoadError);
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.to_string().starts_with("/nonexistent/schema.json: error [SCHEMA_LOAD_ERROR]"));
    }

    #[test]
    fn builder_and_serialization() {
        let schema = Schema::new().with_table(
            "products",
            [("id", SchemaField::new("number"))],
        );

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            json,
            r#"{"products":{"id":{"type":"number","nullable":false,"array":false}}}"#
        );
    }
}
