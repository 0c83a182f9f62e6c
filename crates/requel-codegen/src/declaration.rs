//! Declaration emitter
//!
//! Renders a `declare module` block. Output is a pure function of the
//! arguments and keeps their order exactly.

/// A `name: type` pair of an interface or a function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<FieldDecl>,
    pub returns: String,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, params: Vec<FieldDecl>, returns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params,
            returns: returns.into(),
        }
    }
}

/// Render a module declaration
///
/// With no interfaces and no functions this is `declare module "<name>" {}`.
pub fn emit(module: &str, interfaces: &[InterfaceDecl], functions: &[FunctionDecl]) -> String {
    let mut out = format!("declare module \"{}\" {{", module);

    if !interfaces.is_empty() {
        out.push_str("\n\n");
        let blocks: Vec<String> = interfaces.iter().map(interface_block).collect();
        out.push_str(&blocks.join("\n"));
        out.push('\n');
    }

    if !functions.is_empty() {
        out.push_str("\n\n");
        let lines: Vec<String> = functions.iter().map(function_line).collect();
        out.push_str(&lines.join("\n"));
        out.push('\n');
    }

    out.push('}');
    out
}

fn interface_block(interface: &InterfaceDecl) -> String {
    let fields: Vec<String> = interface
        .fields
        .iter()
        .map(|field| format!("    {}: {}", field.name, field.type_name))
        .collect();

    format!(
        "  export interface {} {{\n{}\n  }}\n",
        interface.name,
        fields.join("\n")
    )
}

fn function_line(function: &FunctionDecl) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|param| format!("{}: {}", param.name, param.type_name))
        .collect();

    format!(
        "  export function {}({}): {}",
        function.name,
        params.join(", "),
        function.returns
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_module() {
        assert_eq!(emit("db/products.sql", &[], &[]), "declare module \"db/products.sql\" {}");
    }

    #[test]
    fn interfaces() {
        let output = emit(
            "db/products.sql",
            &[
                InterfaceDecl::new(
                    "Result",
                    vec![FieldDecl::new("id", "number"), FieldDecl::new("name", "string")],
                ),
                InterfaceDecl::new("Input", vec![FieldDecl::new("price", "number")]),
            ],
            &[],
        );

        assert_eq!(
            output,
            "declare module \"db/products.sql\" {

  export interface Result {
    id: number
    name: string
  }

  export interface Input {
    price: number
  }

}"
        );
    }

    #[test]
    fn functions() {
        let input = vec![FieldDecl::new("input", "Input")];
        let output = emit(
            "db/products.sql",
            &[],
            &[
                FunctionDecl::new("query", input.clone(), "Promise<Result[]>"),
                FunctionDecl::new("one", input, "Promise<Result>"),
            ],
        );

        assert_eq!(
            output,
            "declare module \"db/products.sql\" {

  export function query(input: Input): Promise<Result[]>
  export function one(input: Input): Promise<Result>
}"
        );
    }

    #[test]
    fn interfaces_then_functions() {
        let output = emit(
            "m",
            &[InterfaceDecl::new("Input", vec![FieldDecl::new("id", "number")])],
            &[FunctionDecl::new(
                "query",
                vec![FieldDecl::new("input", "Input"), FieldDecl::new("limit", "number")],
                "Promise<void>",
            )],
        );

        assert_eq!(
            output,
            "declare module \"m\" {\n\n  export interface Input {\n    id: number\n  }\n\n\n\n  export function query(input: Input, limit: number): Promise<void>\n}"
        );
    }

    #[test]
    fn same_arguments_same_output() {
        let build = || {
            (
                vec![InterfaceDecl::new("Result", vec![FieldDecl::new("id", "number")])],
                vec![FunctionDecl::new("one", Vec::new(), "Promise<Result>")],
            )
        };
        let (interfaces_a, functions_a) = build();
        let (interfaces_b, functions_b) = build();

        assert_eq!(
            emit("db/a.sql", &interfaces_a, &functions_a),
            emit("db/a.sql", &interfaces_b, &functions_b)
        );
    }
}
