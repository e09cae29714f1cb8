//! Atom types (registry entries) and atom instances (placements on a map).

use indexmap::IndexMap;
use std::fmt;

use super::value::Value;
use crate::codec::value::format_value;

/// Index of an [`AtomInstance`] inside a map document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A base object type, e.g. `/obj/structure/window`.
///
/// `properties` is expected to be flattened: inherited vars are already
/// copied down from the parent chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    /// Absolute slash-delimited type path.
    pub path: String,
    /// Parent type path, informational only.
    pub parent: Option<String>,
    /// Every var visible on this type, in declaration order.
    pub properties: IndexMap<String, Value>,
}

impl AtomType {
    /// Create a type with no vars.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parent: None,
            properties: IndexMap::new(),
        }
    }

    /// Builder-style var definition.
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Builder-style parent.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// A concrete placement of an [`AtomType`] with possibly overridden vars.
///
/// Equality is structural over `path` and the full property map;
/// `map_specified` only controls what gets written back out.
#[derive(Debug, Clone)]
pub struct AtomInstance {
    /// Type path. Empty for a placeholder that serializes to nothing.
    pub path: String,
    /// Full property map (base defaults plus overrides).
    pub properties: IndexMap<String, Value>,
    /// Vars that must be written explicitly, in first-seen order.
    pub map_specified: Vec<String>,
}

impl PartialEq for AtomInstance {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.properties == other.properties
    }
}

impl AtomInstance {
    /// The unmodified instance of a type.
    pub fn from_type(atom: &AtomType) -> Self {
        Self {
            path: atom.path.clone(),
            properties: atom.properties.clone(),
            map_specified: Vec::new(),
        }
    }

    /// An empty-path instance; skipped during serialization.
    pub fn placeholder() -> Self {
        Self {
            path: String::new(),
            properties: IndexMap::new(),
            map_specified: Vec::new(),
        }
    }

    /// Whether this is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.path.is_empty()
    }

    /// Render as `path` or `path{k = v; k2 = v2}`.
    ///
    /// With `inherited` set every property is written, not only the
    /// map-specified ones.
    pub fn to_dmm(&self, inherited: bool) -> String {
        let mut out = self.path.clone();
        let assignments: Vec<String> = if inherited {
            self.properties
                .iter()
                .map(|(k, v)| format!("{} = {}", k, format_value(v)))
                .collect()
        } else {
            self.map_specified
                .iter()
                .filter_map(|k| {
                    self.properties
                        .get(k)
                        .map(|v| format!("{} = {}", k, format_value(v)))
                })
                .collect()
        };
        if !assignments.is_empty() {
            out.push('{');
            out.push_str(&assignments.join("; "));
            out.push('}');
        }
        out
    }
}
