//! TypeScript bindings for analyzed statements

use requel_core::{
    AnalyzedStatement, BindingsConfig, Diagnostic, DiagnosticCode, InputParameter, OutputField,
};
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::declaration::{emit, FieldDecl, FunctionDecl, InterfaceDecl};

/// Builds the `declare module` block of one SQL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScriptBindings {
    input_interface: String,
    result_interface: String,
}

impl TypeScriptBindings {
    /// Bindings with the default `Input` / `Result` interface names
    pub fn new() -> Self {
        Self::from_config(&BindingsConfig::default())
    }

    pub fn from_config(config: &BindingsConfig) -> Self {
        Self {
            input_interface: config.input_interface.clone(),
            result_interface: config.result_interface.clone(),
        }
    }

    /// Interfaces and functions describing the statement
    ///
    /// `Input` is only declared when the statement takes parameters and
    /// `Result` only when it returns columns. Outputs whose key is already
    /// taken by an earlier output are left out of `Result`.
    pub fn declarations(&self, analyzed: &AnalyzedStatement) -> (Vec<InterfaceDecl>, Vec<FunctionDecl>) {
        let mut interfaces = Vec::new();
        let mut params = Vec::new();

        if !analyzed.inputs.is_empty() {
            interfaces.push(InterfaceDecl::new(
                &self.input_interface,
                analyzed.inputs.iter().map(input_field).collect(),
            ));
            params.push(FieldDecl::new("input", &self.input_interface));
        }

        let functions = if analyzed.outputs.is_empty() {
            vec![FunctionDecl::new("query", params, "Promise<void>")]
        } else {
            interfaces.push(InterfaceDecl::new(
                &self.result_interface,
                distinct_outputs(&analyzed.outputs).map(output_field).collect(),
            ));
            vec![
                FunctionDecl::new(
                    "query",
                    params.clone(),
                    format!("Promise<{}[]>", self.result_interface),
                ),
                FunctionDecl::new("one", params, format!("Promise<{}>", self.result_interface)),
            ]
        };

        (interfaces, functions)
    }

    /// Warnings for outputs dropped from `Result` because of a key clash
    pub fn diagnostics(&self, analyzed: &AnalyzedStatement) -> Vec<Diagnostic> {
        let kept: Vec<&OutputField> = distinct_outputs(&analyzed.outputs).collect();

        analyzed
            .outputs
            .iter()
            .filter(|output| !kept.iter().any(|k| std::ptr::eq(*k, *output)))
            .map(|output| {
                Diagnostic::warn(
                    DiagnosticCode::SqlDuplicateOutput,
                    format!(
                        "Output `{}` of relation `{}` clashes with an earlier output and is left out of `{}`",
                        output.key(),
                        output.relation,
                        self.result_interface
                    ),
                )
            })
            .collect()
    }

    /// Render the full declaration for `module`
    pub fn render(&self, module: &str, analyzed: &AnalyzedStatement) -> String {
        let (interfaces, functions) = self.declarations(analyzed);
        emit(module, &interfaces, &functions)
    }
}

impl Default for TypeScriptBindings {
    fn default() -> Self {
        Self::new()
    }
}

/// Module specifier of a SQL file: its path below `root`, `/`-separated
///
/// Only plain path segments are kept, so the name never starts with `/` and
/// never contains `..`, even for files outside `root`.
pub fn module_name(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// First output for every binding key, in order
fn distinct_outputs(outputs: &[OutputField]) -> impl Iterator<Item = &OutputField> {
    let mut seen = HashSet::new();
    outputs.iter().filter(move |&output| seen.insert(output.key()))
}

/// `T`, `T[]`, `T | null`, `(A | B)[]`
pub fn render_type(type_name: &str, array: bool, nullable: bool) -> String {
    let mut rendered = type_name.to_string();

    if array {
        rendered = if rendered.contains(' ') {
            format!("({})[]", rendered)
        } else {
            format!("{}[]", rendered)
        };
    }

    if nullable {
        rendered.push_str(" | null");
    }

    rendered
}

fn input_field(input: &InputParameter) -> FieldDecl {
    FieldDecl::new(&input.name, render_type(&input.type_name, input.array, input.nullable))
}

fn output_field(output: &OutputField) -> FieldDecl {
    FieldDecl::new(output.key(), render_type(&output.type_name, output.array, output.nullable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use requel_core::StatementKind;

    fn analyzed(inputs: Vec<InputParameter>, outputs: Vec<OutputField>) -> AnalyzedStatement {
        AnalyzedStatement {
            kind: StatementKind::Select,
            inputs,
            outputs,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn type_rendering() {
        assert_eq!(render_type("number", false, false), "number");
        assert_eq!(render_type("number", true, false), "number[]");
        assert_eq!(render_type("string", false, true), "string | null");
        assert_eq!(render_type("string", true, true), "string[] | null");
        assert_eq!(render_type("'a' | 'b'", true, false), "('a' | 'b')[]");
    }

    #[test]
    fn module_names_are_slash_separated() {
        let root = Path::new("/project");
        assert_eq!(
            module_name(Path::new("/project/db/products.sql"), root),
            "db/products.sql"
        );
        assert_eq!(module_name(Path::new("other/q.sql"), root), "other/q.sql");
    }

    #[test]
    fn module_names_stay_relative_outside_root() {
        let root = Path::new("/project");

        assert_eq!(module_name(Path::new("/elsewhere/q.sql"), root), "elsewhere/q.sql");
        assert_eq!(
            module_name(Path::new("/project/../elsewhere/q.sql"), root),
            "elsewhere/q.sql"
        );
        assert_eq!(module_name(Path::new("./db/../q.sql"), root), "db/q.sql");
    }

    #[test]
    fn clashing_output_keys_keep_first() {
        let mut label = OutputField::new("title", "categories", "string");
        label.alias = Some("name".to_string());

        let statement = analyzed(
            Vec::new(),
            vec![
                OutputField::new("id", "products", "number"),
                OutputField::new("name", "products", "string"),
                OutputField::new("id", "categories", "number"),
                label,
            ],
        );
        let bindings = TypeScriptBindings::new();

        let (interfaces, _) = bindings.declarations(&statement);
        assert_eq!(
            interfaces[0].fields,
            vec![FieldDecl::new("id", "number"), FieldDecl::new("name", "string")]
        );

        let diagnostics = bindings.diagnostics(&statement);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::SqlDuplicateOutput));
        assert!(diagnostics[0].message.contains("`categories`"));
    }

    #[test]
    fn select_with_inputs() {
        let mut price = InputParameter::untyped("max_price");
        price.type_name = "number".to_string();
        price.nullable = true;

        let mut name = OutputField::new("name", "products", "string");
        name.alias = Some("label".to_string());

        let output = TypeScriptBindings::new().render(
            "db/products.sql",
            &analyzed(vec![price], vec![OutputField::new("id", "products", "number"), name]),
        );

        assert_eq!(
            output,
            "declare module \"db/products.sql\" {

  export interface Input {
    max_price: number | null
  }

  export interface Result {
    id: number
    label: string
  }



  export function query(input: Input): Promise<Result[]>
  export function one(input: Input): Promise<Result>
}"
        );
    }

    #[test]
    fn mutation_without_outputs() {
        let (interfaces, functions) = TypeScriptBindings::new()
            .declarations(&analyzed(vec![InputParameter::untyped("id")], Vec::new()));

        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].fields, vec![FieldDecl::new("id", "any")]);
        assert_eq!(
            functions,
            vec![FunctionDecl::new(
                "query",
                vec![FieldDecl::new("input", "Input")],
                "Promise<void>"
            )]
        );
    }

    #[test]
    fn configured_names_without_inputs() {
        let bindings = TypeScriptBindings::from_config(&BindingsConfig {
            input_interface: "Params".to_string(),
            result_interface: "Row".to_string(),
        });

        let (interfaces, functions) = bindings
            .declarations(&analyzed(Vec::new(), vec![OutputField::new("id", "products", "number")]));

        assert_eq!(interfaces[0].name, "Row");
        assert!(functions[0].params.is_empty());
        assert_eq!(functions[0].returns, "Promise<Row[]>");
        assert_eq!(functions[1].returns, "Promise<Row>");
    }
}
