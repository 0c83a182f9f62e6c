//! Statement normalization
//!
//! Maps a dialect-specific sqlparser statement onto the single
//! `{kind, relations, fields}` shape the resolver works with.
//!
//! Only bare or aliased table names and bare or aliased column identifiers
//! are understood. Any other table reference or projection item is skipped
//! (with an info diagnostic), never an error.

use sqlparser::ast::{
    Delete, Expr, FromTable, Insert, ObjectName, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins,
};
use requel_core::{
    Diagnostic, DiagnosticCode, Field, NormalizedStatement, Relation, StatementKind,
};

use crate::error::AnalysisError;

/// Normalizer for parsed statements
///
/// Collects a diagnostic for every shape it had to skip.
pub struct StatementNormalizer {
    diagnostics: Vec<Diagnostic>,
}

impl StatementNormalizer {
    /// Create a new normalizer
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Normalize one statement
    ///
    /// `sql` is the original text, reported back for unsupported statements.
    pub fn normalize(
        &mut self,
        statement: &Statement,
        sql: &str,
    ) -> Result<NormalizedStatement, AnalysisError> {
        match statement {
            Statement::Query(query) => Ok(self.normalize_query(query)),
            Statement::Insert(insert) => Ok(self.normalize_insert(insert)),
            Statement::Update { table, returning, .. } => {
                let mut normalized = NormalizedStatement::new(StatementKind::Update);
                self.push_tables(std::slice::from_ref(table), &mut normalized.relations);
                self.push_fields(returning.as_deref().unwrap_or_default(), &mut normalized.fields);
                Ok(normalized)
            }
            Statement::Delete(delete) => Ok(self.normalize_delete(delete)),
            other => Err(AnalysisError::UnsupportedStatementKind {
                kind: statement_kind(other),
                sql: sql.to_string(),
            }),
        }
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn normalize_query(&mut self, query: &Query) -> NormalizedStatement {
        let mut normalized = NormalizedStatement::new(StatementKind::Select);

        match leading_select(&query.body) {
            Some(select) => {
                self.push_tables(&select.from, &mut normalized.relations);
                self.push_fields(&select.projection, &mut normalized.fields);
            }
            None => self.skip("query body", &query.body),
        }

        normalized
    }

    fn normalize_insert(&mut self, insert: &Insert) -> NormalizedStatement {
        let kind = if insert.on.is_some() {
            StatementKind::Upsert
        } else {
            StatementKind::Insert
        };

        let mut normalized = NormalizedStatement::new(kind);
        normalized.relations.push(Relation {
            name: object_name(&insert.table_name),
            alias: insert.table_alias.as_ref().map(|alias| alias.value.clone()),
        });
        self.push_fields(
            insert.returning.as_deref().unwrap_or_default(),
            &mut normalized.fields,
        );

        normalized
    }

    fn normalize_delete(&mut self, delete: &Delete) -> NormalizedStatement {
        let targets = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };

        let mut normalized = NormalizedStatement::new(StatementKind::Delete);
        self.push_tables(targets, &mut normalized.relations);
        self.push_fields(
            delete.returning.as_deref().unwrap_or_default(),
            &mut normalized.fields,
        );

        normalized
    }

    /// Every table of a FROM/target list, joins included, in source order
    fn push_tables(&mut self, tables: &[TableWithJoins], relations: &mut Vec<Relation>) {
        for table in tables {
            self.push_table_factor(&table.relation, relations);

            for join in &table.joins {
                self.push_table_factor(&join.relation, relations);
            }
        }
    }

    fn push_table_factor(&mut self, factor: &TableFactor, relations: &mut Vec<Relation>) {
        match factor {
            TableFactor::Table { name, alias, .. } => relations.push(Relation {
                name: object_name(name),
                alias: alias.as_ref().map(|alias| alias.name.value.clone()),
            }),
            other => self.skip("table reference", other),
        }
    }

    fn push_fields(&mut self, items: &[SelectItem], fields: &mut Vec<Field>) {
        for item in items {
            match item {
                SelectItem::Wildcard(_) => fields.push(Field::wildcard()),
                SelectItem::UnnamedExpr(Expr::Identifier(ident)) => {
                    fields.push(Field::column(&ident.value))
                }
                SelectItem::ExprWithAlias { expr: Expr::Identifier(ident), alias } => {
                    fields.push(Field::aliased(&ident.value, &alias.value))
                }
                other => self.skip("projection", other),
            }
        }
    }

    fn skip(&mut self, what: &str, node: &dyn std::fmt::Display) {
        tracing::debug!(shape = %node, "skipping unsupported {}", what);
        self.diagnostics.push(Diagnostic::info(
            DiagnosticCode::SqlUnsupportedShape,
            format!("Skipped unsupported {} `{}`", what, node),
        ));
    }
}

impl Default for StatementNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// First SELECT of a query body; set operations use their left side
fn leading_select(body: &SetExpr) -> Option<&Select> {
    match body {
        SetExpr::Select(select) => Some(select.as_ref()),
        SetExpr::Query(query) => leading_select(&query.body),
        SetExpr::SetOperation { left, .. } => leading_select(left),
        _ => None,
    }
}

/// `schema.table` style name as written, without quotes
fn object_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// snake_case name of the statement variant, e.g. `create_table`
fn statement_kind(statement: &Statement) -> String {
    let debug = format!("{:?}", statement);
    let mut kind = String::new();

    for (i, c) in debug.chars().take_while(|c| c.is_ascii_alphanumeric()).enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                kind.push('_');
            }
            kind.push(c.to_ascii_lowercase());
        } else {
            kind.push(c);
        }
    }

    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;
    use pretty_assertions::assert_eq;

    fn normalize(sql: &str) -> Result<NormalizedStatement, AnalysisError> {
        let parsed = SqlParser::default().parse(sql, None).unwrap();
        StatementNormalizer::new().normalize(parsed.first_statement().unwrap(), sql)
    }

    #[test]
    fn unsupported_statement() {
        let err = normalize("truncate table products").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unsupported statement `truncate` `truncate table products`"
        );
    }

    #[test]
    fn unsupported_statement_kind_is_snake_case() {
        match normalize("create table products (id int)").unwrap_err() {
            AnalysisError::UnsupportedStatementKind { kind, .. } => assert_eq!(kind, "create_table"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn star_query() {
        let normalized = normalize("select * from products").unwrap();

        assert_eq!(
            normalized,
            NormalizedStatement {
                kind: StatementKind::Select,
                fields: vec![Field::wildcard()],
                relations: vec![Relation::new("products")],
            }
        );
    }

    #[test]
    fn multiple_from() {
        let normalized = normalize("select * from products, categories").unwrap();

        assert_eq!(
            normalized.relations,
            vec![Relation::new("products"), Relation::new("categories")]
        );
    }

    #[test]
    fn from_aliases() {
        let normalized = normalize("select * from products as prod, categories as cat").unwrap();

        assert_eq!(
            normalized.relations,
            vec![
                Relation::aliased("products", "prod"),
                Relation::aliased("categories", "cat"),
            ]
        );
    }

    #[test]
    fn join_keeps_left_then_right() {
        let normalized = normalize(
            "select id from products p join categories c on p.category_id = c.id",
        )
        .unwrap();

        assert_eq!(
            normalized.relations,
            vec![Relation::aliased("products", "p"), Relation::aliased("categories", "c")]
        );
    }

    #[test]
    fn column_names_and_aliases() {
        let normalized = normalize("select id, name, price as amount from products").unwrap();

        assert_eq!(
            normalized.fields,
            vec![Field::column("id"), Field::column("name"), Field::aliased("price", "amount")]
        );
    }

    #[test]
    fn unsupported_shapes_are_skipped() {
        let sql = "select id, count(*) as total, p.name from (select 1) as sub, products p";
        let parsed = SqlParser::default().parse(sql, None).unwrap();
        let mut normalizer = StatementNormalizer::new();

        let normalized = normalizer.normalize(parsed.first_statement().unwrap(), sql).unwrap();

        assert_eq!(normalized.fields, vec![Field::column("id")]);
        assert_eq!(normalized.relations, vec![Relation::aliased("products", "p")]);
        assert_eq!(normalizer.diagnostics().len(), 3);
        assert!(normalizer
            .diagnostics()
            .iter()
            .all(|d| d.code == DiagnosticCode::SqlUnsupportedShape));
    }

    #[test]
    fn insert_without_returning() {
        let normalized = normalize("insert into products (id, name) values (1, 'Desk')").unwrap();

        assert_eq!(normalized.kind, StatementKind::Insert);
        assert_eq!(normalized.relations, vec![Relation::new("products")]);
        assert!(normalized.fields.is_empty());
    }

    #[test]
    fn aliased_insert_target() {
        let normalized = normalize("insert into products as p (id) values (1) returning id").unwrap();

        assert_eq!(normalized.relations, vec![Relation::aliased("products", "p")]);
        assert_eq!(normalized.fields, vec![Field::column("id")]);
    }

    #[test]
    fn upsert_with_returning() {
        let normalized = normalize(
            "insert into products (id, name) values (1, 'Desk') on conflict do nothing returning id, name",
        )
        .unwrap();

        assert_eq!(normalized.kind, StatementKind::Upsert);
        assert_eq!(normalized.fields, vec![Field::column("id"), Field::column("name")]);
        assert_eq!(normalized.relations, vec![Relation::new("products")]);
    }

    #[test]
    fn update_with_returning() {
        let normalized = normalize(
            "update products set price = :price where id = :id returning id, price as amount",
        )
        .unwrap();

        assert_eq!(normalized.kind, StatementKind::Update);
        assert_eq!(normalized.relations, vec![Relation::new("products")]);
        assert_eq!(normalized.fields, vec![Field::column("id"), Field::aliased("price", "amount")]);
    }

    #[test]
    fn delete_with_wildcard_returning() {
        let normalized = normalize("delete from products where id = :id returning *").unwrap();

        assert_eq!(normalized.kind, StatementKind::Delete);
        assert_eq!(normalized.relations, vec![Relation::new("products")]);
        assert_eq!(normalized.fields, vec![Field::wildcard()]);
    }

    #[test]
    fn qualified_relation_name() {
        let normalized = normalize("select * from public.products").unwrap();
        assert_eq!(normalized.relations, vec![Relation::new("public.products")]);
    }

    #[test]
    fn union_uses_left_select() {
        let normalized =
            normalize("select id from products union select id from categories").unwrap();

        assert_eq!(normalized.relations, vec![Relation::new("products")]);
        assert_eq!(normalized.fields, vec![Field::column("id")]);
    }
}
