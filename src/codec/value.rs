//! Literal text <-> [`Value`] conversion.
//!
//! Parsing is total: anything that is not a recognised literal form comes
//! back as [`Literal::RawExpr`] holding the original text, so formatting a
//! parsed value reproduces what was read.

use std::fmt;

use crate::types::{ListEntry, Literal, Value};

/// Parse one literal token.
///
/// - `null` → [`Literal::Null`]
/// - `"text"` → [`Literal::Str`], with `\"` unescaped
/// - `'path'` → [`Literal::FileRef`]
/// - a decimal number → [`Literal::Number`]
/// - anything else → [`Literal::RawExpr`]
pub fn parse_literal(text: &str) -> Value {
    let text = text.trim();

    if text == "null" {
        return Value::null();
    }
    if let Some(inner) = strip_quotes(text, '"') {
        return Value::string(inner.replace("\\\"", "\""));
    }
    if let Some(inner) = strip_quotes(text, '\'') {
        return Value::file(inner);
    }
    if looks_numeric(text) {
        if let Ok(n) = text.parse::<f64>() {
            return Value::new(Literal::Number {
                text: text.to_string(),
                value: Some(n),
            });
        }
    }
    Value::raw(text)
}

fn strip_quotes(text: &str, quote: char) -> Option<&str> {
    if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

// `f64::from_str` also accepts "inf" and "NaN", which are identifiers in DM.
fn looks_numeric(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}

/// Render a value back to DM literal syntax.
pub fn format_value(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, &value.literal);
    out
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Null => out.push_str("null"),
        Literal::Number { text, .. } => out.push_str(text),
        Literal::Str(text) => {
            out.push('"');
            out.push_str(&text.replace('"', "\\\""));
            out.push('"');
        }
        Literal::FileRef(text) => {
            out.push('\'');
            out.push_str(text);
            out.push('\'');
        }
        Literal::RawExpr(text) => out.push_str(text),
        Literal::List(entries) => write_list(out, entries),
    }
}

fn write_list(out: &mut String, entries: &[ListEntry]) {
    out.push_str("list(");
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(key) = &entry.key {
            write_literal(out, &key.literal);
            out.push_str(" = ");
        }
        write_literal(out, &entry.value.literal);
    }
    out.push(')');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}
