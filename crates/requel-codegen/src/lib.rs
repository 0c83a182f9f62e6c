//! Typed binding generation
//!
//! Turns analyzed statements into TypeScript module declarations.

pub mod declaration;
pub mod typescript;

pub use declaration::{emit, FieldDecl, FunctionDecl, InterfaceDecl};
pub use typescript::{module_name, render_type, TypeScriptBindings};
