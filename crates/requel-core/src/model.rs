//! Analysis records produced for a single SQL statement
//!
//! Everything here is built fresh per analysis and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;

/// Normalized statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    /// INSERT carrying an on-conflict clause
    Upsert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Upsert => "upsert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// The `*` projection
    Wildcard,
    Column,
}

/// One item of a statement's returned projection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub kind: FieldKind,

    /// Referenced column, `*` for wildcards
    pub name: String,

    /// Renaming alias; always `None` for wildcards
    pub alias: Option<String>,
}

impl Field {
    pub fn wildcard() -> Self {
        Self {
            kind: FieldKind::Wildcard,
            name: "*".to_string(),
            alias: None,
        }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Column,
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Column,
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A table reference with its optional alias
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub alias: Option<String>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

/// Dialect-independent shape of a statement
///
/// `fields` is the returned projection: the select list for `select`, the
/// `RETURNING` list for mutations (empty when absent). Both lists keep
/// source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedStatement {
    pub kind: StatementKind,
    pub fields: Vec<Field>,
    pub relations: Vec<Relation>,
}

impl NormalizedStatement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }
}

/// A named placeholder of the SQL body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputParameter {
    pub name: String,

    /// Declared type with any array marker stripped, `any` when undeclared
    #[serde(rename = "type")]
    pub type_name: String,

    pub array: bool,
    pub nullable: bool,
}

impl InputParameter {
    /// Parameter with no metadata annotation
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "any".to_string(),
            array: false,
            nullable: false,
        }
    }
}

/// A resolved output column, tagged with its owning relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputField {
    pub name: String,

    pub relation: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub array: bool,
}

impl OutputField {
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relation: relation.into(),
            type_name: type_name.into(),
            alias: None,
            nullable: false,
            array: false,
        }
    }

    /// Name the column is returned under
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Final typed contract of one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedStatement {
    pub kind: StatementKind,
    pub inputs: Vec<InputParameter>,
    pub outputs: Vec<OutputField>,

    /// Non-fatal findings (skipped shapes, unknown columns)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}
