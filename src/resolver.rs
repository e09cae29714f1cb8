//! Atom chunk resolution.
//!
//! Turns `path` or `path{key = value; ...}` into an [`AtomInstance`] and
//! works out which vars must be written back explicitly.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::codec::{parse_literal, split_properties};
use crate::registry::AtomRegistry;
use crate::types::{AtomInstance, Origin, Value};

/// Error resolving one atom chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The base type is not in the registry.
    #[error("unknown atom type: {0}")]
    UnknownAtom(String),
    /// Nothing but whitespace.
    #[error("empty atom chunk")]
    EmptyChunk,
}

/// Resolve an atom chunk with no provenance for its values.
pub fn resolve_atom<R>(chunk: &str, registry: &R) -> Result<Arc<AtomInstance>, ResolveError>
where
    R: AtomRegistry + ?Sized,
{
    resolve_atom_at(chunk, registry, &Origin::default())
}

/// Resolve an atom chunk, stamping override values with `origin`.
///
/// A bare path returns the registry's shared canonical instance. A chunk
/// with overrides returns a fresh instance whose `map_specified` lists the
/// overridden vars that differ from the base type.
pub fn resolve_atom_at<R>(
    chunk: &str,
    registry: &R,
    origin: &Origin,
) -> Result<Arc<AtomInstance>, ResolveError>
where
    R: AtomRegistry + ?Sized,
{
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return Err(ResolveError::EmptyChunk);
    }

    let Some(brace) = chunk.find('{') else {
        let path = normalize_path(chunk);
        return registry
            .canonical_instance(path)
            .ok_or_else(|| ResolveError::UnknownAtom(path.to_string()));
    };

    let path = normalize_path(&chunk[..brace]);
    let body = match chunk[brace + 1..].strip_suffix('}') {
        Some(body) => body,
        None => {
            tracing::warn!(chunk = chunk, "atom override block is not closed");
            &chunk[brace + 1..]
        }
    };

    let base = registry
        .get_atom(path)
        .ok_or_else(|| ResolveError::UnknownAtom(path.to_string()))?;
    let mut instance = AtomInstance::from_type(base);
    let mut supplied: Vec<String> = Vec::new();

    for prop in split_properties(body) {
        let Some((key, value)) = prop.split_once('=') else {
            tracing::warn!(path = path, property = %prop, "property without '=' skipped");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            tracing::warn!(path = path, property = %prop, "property with empty name skipped");
            continue;
        }

        let value = parse_literal(value.trim()).with_origin(origin.clone());
        instance.properties.insert(key.to_string(), value);
        if !supplied.iter().any(|k| k == key) {
            supplied.push(key.to_string());
        }
    }

    // Overrides equal to the base default need not be written back.
    supplied.retain(|key| match base.properties.get(key) {
        Some(default) => instance.properties.get(key) != Some(default),
        None => true,
    });
    instance.map_specified = supplied;

    Ok(Arc::new(instance))
}

/// Build an instance from a live object's full property map.
///
/// Vars that differ from (or are missing on) the base type become
/// map-specified; the rest is taken from the base.
pub fn instance_from_properties<R>(
    path: &str,
    properties: IndexMap<String, Value>,
    registry: &R,
) -> Result<AtomInstance, ResolveError>
where
    R: AtomRegistry + ?Sized,
{
    let path = normalize_path(path);
    let base = registry
        .get_atom(path)
        .ok_or_else(|| ResolveError::UnknownAtom(path.to_string()))?;

    let mut instance = AtomInstance::from_type(base);
    for (key, value) in properties {
        if base.properties.get(&key) != Some(&value) {
            instance.map_specified.push(key.clone());
        }
        instance.properties.insert(key, value);
    }
    Ok(instance)
}

fn normalize_path(raw: &str) -> &str {
    let path = raw.trim();
    if path.len() > 1 && path.ends_with('/') {
        tracing::warn!(path = path, "atom path has a trailing slash");
        return path.trim_end_matches('/');
    }
    path
}
