//! Named parameter extraction
//!
//! Placeholders are written `:name` in the SQL body. Their types come from
//! the front matter: `name: type` declares a type, `name?: type` also marks
//! the parameter nullable and a trailing `[]` marks it as an array.
//! Undeclared parameters are typed `any`.

use indexmap::IndexMap;
use regex::Regex;
use requel_core::InputParameter;
use sqlparser::dialect::Dialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::sync::OnceLock;

const ARRAY_MARKER: &str = "[]";
const NULLABLE_MARKER: char = '?';

/// How named placeholders are rewritten for a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ...; a repeated name reuses its number
    Numbered,

    /// `?` for every occurrence
    QuestionMark,
}

/// SQL with positional placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSql {
    pub sql: String,

    /// Parameter name bound to each position
    pub parameters: Vec<String>,
}

/// Extracts `:name` placeholders using the dialect's tokenizer
///
/// Working on tokens keeps string literals, comments and `::` casts from
/// being mistaken for placeholders.
pub struct ParameterExtractor<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> ParameterExtractor<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Typed inputs for every distinct placeholder, in first-occurrence order
    pub fn extract(&self, body: &str, metadata: &IndexMap<String, String>) -> Vec<InputParameter> {
        let mut names: Vec<String> = Vec::new();

        for name in self.occurrences(body) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        names
            .into_iter()
            .map(|name| describe(name, metadata))
            .collect()
    }

    /// Placeholder names in order of appearance, repeats included
    pub fn occurrences(&self, body: &str) -> Vec<String> {
        match Tokenizer::new(self.dialect, body).tokenize() {
            Ok(tokens) => {
                let mut names = Vec::new();
                let mut i = 0;
                while i < tokens.len() {
                    if let Some((name, width)) = placeholder_at(&tokens, i) {
                        names.push(name);
                        i += width;
                    } else {
                        i += 1;
                    }
                }
                names
            }
            Err(e) => {
                tracing::debug!(error = %e, "tokenizer rejected SQL body, scanning text instead");
                placeholder_regex()
                    .captures_iter(body)
                    .map(|caps| caps[2].to_string())
                    .collect()
            }
        }
    }

    /// Rewrite named placeholders into positional ones
    ///
    /// Text that is not a placeholder is re-rendered from its tokens, so
    /// whitespace and comments survive. If the body cannot be tokenized it is
    /// rewritten with a plain text scan.
    pub fn rewrite(&self, body: &str, style: PlaceholderStyle) -> RewrittenSql {
        let mut parameters: Vec<String> = Vec::new();
        let mut position_of = |name: String| -> String {
            match style {
                PlaceholderStyle::Numbered => {
                    let index = match parameters.iter().position(|p| *p == name) {
                        Some(index) => index,
                        None => {
                            parameters.push(name);
                            parameters.len() - 1
                        }
                    };
                    format!("${}", index + 1)
                }
                PlaceholderStyle::QuestionMark => {
                    parameters.push(name);
                    "?".to_string()
                }
            }
        };

        let sql = match Tokenizer::new(self.dialect, body).tokenize() {
            Ok(tokens) => {
                let mut sql = String::with_capacity(body.len());
                let mut i = 0;
                while i < tokens.len() {
                    if let Some((name, width)) = placeholder_at(&tokens, i) {
                        sql.push_str(&position_of(name));
                        i += width;
                    } else {
                        sql.push_str(&tokens[i].to_string());
                        i += 1;
                    }
                }
                sql
            }
            Err(e) => {
                tracing::debug!(error = %e, "tokenizer rejected SQL body, rewriting text instead");
                placeholder_regex()
                    .replace_all(body, |caps: &regex::Captures| {
                        format!("{}{}", &caps[1], position_of(caps[2].to_string()))
                    })
                    .into_owned()
            }
        };

        RewrittenSql { sql, parameters }
    }
}

/// Placeholder name starting at token `i`, with the number of tokens it spans
///
/// Either `:` immediately followed by a word or number, or a single
/// `:name` placeholder token.
fn placeholder_at(tokens: &[Token], i: usize) -> Option<(String, usize)> {
    let found = match (&tokens[i], tokens.get(i + 1)) {
        (Token::Colon, Some(Token::Word(word))) => Some((word.value.clone(), 2)),
        (Token::Colon, Some(Token::Number(number, false))) => Some((number.clone(), 2)),
        (Token::Placeholder(placeholder), _) => placeholder
            .strip_prefix(':')
            .map(|name| (name.to_string(), 1)),
        _ => None,
    };
    found.filter(|(name, _)| !name.is_empty())
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"(^|[^:]):(\w+)").expect("placeholder pattern is valid")
    })
}

/// Look the name up in the metadata, falling back to its nullable form
fn describe(name: String, metadata: &IndexMap<String, String>) -> InputParameter {
    let nullable_key = format!("{}{}", name, NULLABLE_MARKER);

    let (declared, nullable) = match metadata.get(&name) {
        Some(declared) => (declared, false),
        None => match metadata.get(&nullable_key) {
            Some(declared) => (declared, true),
            None => return InputParameter::untyped(name),
        },
    };

    let declared = declared.trim();
    let (type_name, array) = match declared.strip_suffix(ARRAY_MARKER) {
        Some(element) => (element.trim_end(), true),
        None => (declared, false),
    };

    InputParameter {
        name,
        type_name: type_name.to_string(),
        array,
        nullable,
    }
}
