//! Property values as they appear on the right-hand side of a DM assignment.
//!
//! A [`Value`] is a tagged literal plus provenance. Provenance never takes
//! part in equality: two values are equal when their literals are, no matter
//! which file or line they were read from.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Storage qualifier attached to a `var` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Special {
    /// `var/global/...`
    Global,
    /// `var/const/...`
    Const,
    /// `var/static/...`
    Static,
    /// `var/tmp/...`
    Tmp,
}

/// A var qualifier keyword that is not one of `global`, `const`, `static`, `tmp`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown var qualifier: {0}")]
pub struct UnknownSpecial(pub String);

impl FromStr for Special {
    type Err = UnknownSpecial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "const" => Ok(Self::Const),
            "static" => Ok(Self::Static),
            "tmp" => Ok(Self::Tmp),
            other => Err(UnknownSpecial(other.to_string())),
        }
    }
}

/// Where a value was defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Source file the value was read from, if known.
    pub filename: Option<String>,
    /// 1-based line number within `filename`.
    pub line: Option<u32>,
    /// `true` for a `var` declaration, `false` for a plain assignment.
    pub declaration: bool,
    /// `true` when the value was copied down from a parent type.
    pub inherited: bool,
    /// Storage qualifier, if any.
    pub special: Option<Special>,
    /// Declared size for list-typed vars (`var/list/x[5]`).
    pub size: Option<usize>,
}

impl Origin {
    /// Provenance for a value read from `filename` at `line`.
    pub fn at(filename: Option<&str>, line: u32) -> Self {
        Self {
            filename: filename.map(str::to_string),
            line: Some(line),
            ..Self::default()
        }
    }
}

/// One entry of a `list(...)` literal. `key` is set for associative entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    /// Association key (`"a" = 1` has key `"a"`).
    pub key: Option<Value>,
    /// Entry value.
    pub value: Value,
}

/// The literal part of a value.
#[derive(Debug, Clone)]
pub enum Literal {
    /// `null`
    Null,
    /// A numeric literal, kept as written plus its evaluated form.
    Number {
        /// Text exactly as written.
        text: String,
        /// Parsed value, when the text is a plain decimal number.
        value: Option<f64>,
    },
    /// Double-quoted string, stored unescaped.
    Str(String),
    /// Single-quoted file/icon reference.
    FileRef(String),
    /// Anything else (expressions, `list(...)` read from a map, paths), verbatim.
    RawExpr(String),
    /// A list built in code rather than read from text.
    List(Vec<ListEntry>),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (
                Self::Number { text: a, value: va },
                Self::Number { text: b, value: vb },
            ) => match (va, vb) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::FileRef(a), Self::FileRef(b)) => a == b,
            (Self::RawExpr(a), Self::RawExpr(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

/// A property value with provenance.
#[derive(Debug, Clone)]
pub struct Value {
    /// The literal.
    pub literal: Literal,
    /// Where it came from.
    pub origin: Origin,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.literal == other.literal
    }
}

impl Value {
    /// Wrap a literal with empty provenance.
    pub fn new(literal: Literal) -> Self {
        Self {
            literal,
            origin: Origin::default(),
        }
    }

    /// `null`
    pub fn null() -> Self {
        Self::new(Literal::Null)
    }

    /// A string value (unescaped text).
    pub fn string(text: impl Into<String>) -> Self {
        Self::new(Literal::Str(text.into()))
    }

    /// A file reference (`'icons/obj.dmi'`).
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(Literal::FileRef(path.into()))
    }

    /// A number from an integer.
    pub fn int(n: i64) -> Self {
        Self::new(Literal::Number {
            text: n.to_string(),
            value: Some(n as f64),
        })
    }

    /// A verbatim expression.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(Literal::RawExpr(text.into()))
    }

    /// A plain (non-associative) list.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Literal::List(
            items
                .into_iter()
                .map(|value| ListEntry { key: None, value })
                .collect(),
        ))
    }

    /// Replace the provenance.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Whether this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self.literal, Literal::Null)
    }
}
