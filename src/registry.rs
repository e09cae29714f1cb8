//! Atom type registries.
//!
//! The codec never walks inheritance itself. A registry hands out
//! already-flattened [`AtomType`]s keyed by absolute path.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::codec::parse_literal;
use crate::types::{AtomInstance, AtomType, Origin};

/// Lookup of flattened atom types by path.
pub trait AtomRegistry {
    /// Fetch a type by absolute path.
    fn get_atom(&self, path: &str) -> Option<&AtomType>;

    /// The shared, unmodified instance of a type.
    ///
    /// Bare path references on a map resolve to this instance without
    /// copying. The default builds a fresh one per call.
    fn canonical_instance(&self, path: &str) -> Option<Arc<AtomInstance>> {
        self.get_atom(path)
            .map(|atom| Arc::new(AtomInstance::from_type(atom)))
    }
}

/// Error loading a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Malformed JSON.
    #[error("registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Could not read the registry file.
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Paths must be absolute.
    #[error("atom path must start with '/': {0:?}")]
    InvalidPath(String),
    /// The same path was defined twice.
    #[error("duplicate atom path: {0}")]
    Duplicate(String),
}

/// JSON form of one registry entry.
///
/// `vars` values are DM literals: `"2"`, `"\"window\""`, `"'icon.dmi'"`.
#[derive(Debug, Clone, Deserialize)]
pub struct AtomTypeRecord {
    /// Absolute type path.
    pub path: String,
    /// Parent type path.
    #[serde(default)]
    pub parent: Option<String>,
    /// Flattened vars in declaration order.
    #[serde(default)]
    pub vars: IndexMap<String, String>,
}

/// In-memory registry with cached canonical instances.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAtomRegistry {
    atoms: BTreeMap<String, AtomType>,
    canonical: BTreeMap<String, Arc<AtomInstance>>,
}

impl InMemoryAtomRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a type.
    pub fn insert(&mut self, atom: AtomType) {
        let instance = Arc::new(AtomInstance::from_type(&atom));
        self.canonical.insert(atom.path.clone(), instance);
        self.atoms.insert(atom.path.clone(), atom);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, atom: AtomType) -> Self {
        self.insert(atom);
        self
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.atoms.keys().map(String::as_str)
    }

    /// Load from a JSON array of [`AtomTypeRecord`]s.
    ///
    /// `source` becomes the provenance filename of every var.
    pub fn from_json_str(json: &str, source: &str) -> Result<Self, RegistryError> {
        let records: Vec<AtomTypeRecord> = serde_json::from_str(json)?;
        let mut registry = Self::new();

        for record in records {
            if !record.path.starts_with('/') {
                return Err(RegistryError::InvalidPath(record.path));
            }
            if registry.atoms.contains_key(&record.path) {
                return Err(RegistryError::Duplicate(record.path));
            }

            let mut atom = AtomType::new(record.path);
            atom.parent = record.parent;
            for (name, literal) in record.vars {
                let origin = Origin {
                    filename: Some(source.to_string()),
                    declaration: true,
                    ..Origin::default()
                };
                atom.properties
                    .insert(name, parse_literal(&literal).with_origin(origin));
            }
            registry.insert(atom);
        }

        tracing::debug!(source = source, atoms = registry.len(), "atom registry loaded");
        Ok(registry)
    }

    /// Load from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, &path.display().to_string())
    }
}

impl AtomRegistry for InMemoryAtomRegistry {
    fn get_atom(&self, path: &str) -> Option<&AtomType> {
        self.atoms.get(path)
    }

    fn canonical_instance(&self, path: &str) -> Option<Arc<AtomInstance>> {
        self.canonical.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Literal, Value};

    #[test]
    fn test_canonical_instance_is_shared() {
        let registry = InMemoryAtomRegistry::new().with(AtomType::new("/turf/space"));
        let a = registry.canonical_instance("/turf/space").unwrap();
        let b = registry.canonical_instance("/turf/space").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.canonical_instance("/turf/wall").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"path": "/obj", "vars": {"name": "\"obj\"", "dir": "2"}},
            {"path": "/obj/window", "parent": "/obj",
             "vars": {"name": "\"window\"", "dir": "2", "icon": "'window.dmi'"}}
        ]"#;
        let registry = InMemoryAtomRegistry::from_json_str(json, "types.json").unwrap();
        assert_eq!(registry.len(), 2);

        let window = registry.get_atom("/obj/window").unwrap();
        assert_eq!(window.parent.as_deref(), Some("/obj"));
        assert_eq!(window.properties["name"], Value::string("window"));
        assert_eq!(window.properties["icon"].literal, Literal::FileRef("window.dmi".into()));
        assert_eq!(window.properties["dir"].origin.filename.as_deref(), Some("types.json"));
        assert!(window.properties["dir"].origin.declaration);

        let keys: Vec<_> = window.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "dir", "icon"]);
    }

    #[test]
    fn test_from_json_rejects_relative_and_duplicate_paths() {
        assert!(matches!(
            InMemoryAtomRegistry::from_json_str(r#"[{"path": "obj"}]"#, "t.json"),
            Err(RegistryError::InvalidPath(_))
        ));
        assert!(matches!(
            InMemoryAtomRegistry::from_json_str(r#"[{"path": "/a"}, {"path": "/a"}]"#, "t.json"),
            Err(RegistryError::Duplicate(_))
        ));
    }
}
