//! Metadata front matter of SQL files
//!
//! ```text
//! ---
//! min_price: number
//! tags?: string[]
//! ---
//! select * from products where price > :min_price
//! ```

use indexmap::IndexMap;

const DELIMITER: &str = "---";

/// A SQL file split into its metadata and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSource<'a> {
    /// `key: value` pairs in declaration order
    pub metadata: IndexMap<String, String>,

    /// SQL text after the closing delimiter
    pub body: &'a str,
}

/// Split optional front matter off a SQL file
///
/// Front matter is only recognized when the first line is `---` and a later
/// line closes it with `---`; otherwise the whole text is the body.
pub fn split_front_matter(source: &str) -> SqlSource<'_> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some((first, mut rest)) = next_line(text) else {
        return SqlSource { metadata: IndexMap::new(), body: text };
    };
    if first.trim_end() != DELIMITER {
        return SqlSource { metadata: IndexMap::new(), body: text };
    }

    let mut metadata = IndexMap::new();
    while let Some((line, remainder)) = next_line(rest) {
        rest = remainder;

        if line.trim_end() == DELIMITER {
            return SqlSource { metadata, body: rest };
        }

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) => {
                metadata.insert(key.trim().to_string(), unquote(value.trim()).to_string());
            }
            None => tracing::debug!(line, "ignoring front matter line without `:`"),
        }
    }

    // Never closed: not front matter
    SqlSource { metadata: IndexMap::new(), body: text }
}

/// Split off the first line, without its line terminator
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }

    let (line, rest) = match text.find('\n') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}
