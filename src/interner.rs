//! Tile interning.
//!
//! Structurally identical tiles are stored once and referenced by id.
//! [`ReadInterner`] collapses duplicate legend entries while reading;
//! [`WriteInterner`] assigns one output legend id per distinct serialized
//! tile while writing. Both are per-invocation state.

use std::collections::{BTreeMap, HashMap};

use crate::canonical::TileHash;
use crate::codec::Alphabet;
use crate::document::{InstanceLookup, MapDocument};
use crate::types::{InstanceId, Tile, TileId};

/// A tile references an instance the document does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tile {tile} references missing instance {instance}")]
pub struct MissingInstance {
    /// The tile being serialized.
    pub tile: TileId,
    /// The dangling instance id.
    pub instance: InstanceId,
}

/// Canonical text of a tile: `(path{k = v},path,...)`.
///
/// Placeholder instances (empty path) are skipped. This string is the
/// deduplication key and is exactly what the legend line carries.
pub fn serialize_tile<L>(tile: &Tile, lookup: &L, inherited: bool) -> Result<String, MissingInstance>
where
    L: InstanceLookup + ?Sized,
{
    let mut parts = Vec::with_capacity(tile.instances.len());
    for &id in &tile.instances {
        let instance = lookup.instance(id).ok_or(MissingInstance {
            tile: tile.id,
            instance: id,
        })?;
        if instance.is_placeholder() {
            continue;
        }
        parts.push(instance.to_dmm(inherited));
    }
    Ok(format!("({})", parts.join(",")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Read side
// ─────────────────────────────────────────────────────────────────────────────

/// Legend deduplication while reading.
#[derive(Debug, Default)]
pub struct ReadInterner {
    by_text: HashMap<String, TileId>,
    by_key: HashMap<u64, TileId>,
    duplicates: usize,
}

impl ReadInterner {
    /// Create a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a legend entry.
    ///
    /// If `tile_text` was already seen, `key` becomes an alias of the
    /// existing tile. Otherwise a new tile is stored in `doc`.
    pub fn intern(
        &mut self,
        doc: &mut MapDocument,
        tile_text: &str,
        orig_id: &str,
        key: u64,
        instances: Vec<InstanceId>,
    ) -> TileId {
        if let Some(&existing) = self.by_text.get(tile_text) {
            self.duplicates += 1;
            self.by_key.insert(key, existing);
            tracing::debug!(key = orig_id, tile = %existing, "duplicate legend entry aliased");
            return existing;
        }

        let tile = doc.create_tile().with_orig_id(orig_id);
        let tile = Tile { instances, ..tile };
        let id = doc.update_tile(tile);
        self.by_text.insert(tile_text.to_string(), id);
        self.by_key.insert(key, id);
        id
    }

    /// Tile for a decoded legend key.
    pub fn lookup(&self, key: u64) -> Option<TileId> {
        self.by_key.get(&key).copied()
    }

    /// Number of legend entries folded into an earlier one.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of distinct legend keys seen.
    pub fn keys(&self) -> usize {
        self.by_key.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Write side
// ─────────────────────────────────────────────────────────────────────────────

/// One output legend entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    /// Digest of `text`.
    pub hash: TileHash,
    /// Serialized tile.
    pub text: String,
}

/// Output id assignment while writing.
#[derive(Debug, Default)]
pub struct WriteInterner {
    typemap: BTreeMap<u64, LegendEntry>,
    by_hash: HashMap<TileHash, u64>,
    max_id: Option<u64>,
    reused: usize,
    reassigned: usize,
}

impl WriteInterner {
    /// Create a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output id for `tile`, whose serialized form is `text`.
    ///
    /// Identical content always gets the same id. With `clean` set, the
    /// tile's original legend key is kept when it is free; a key already
    /// owned by different content is cleared from the tile and a fresh id
    /// is assigned instead.
    pub fn intern(&mut self, tile: &mut Tile, text: &str, clean: bool, alphabet: &Alphabet) -> u64 {
        let hash = TileHash::of(text);
        if let Some(&id) = self.by_hash.get(&hash) {
            if self.typemap.get(&id).is_some_and(|entry| entry.text == text) {
                return id;
            }
        }

        let mut candidate = None;
        if clean && !tile.orig_id.is_empty() {
            match alphabet.decode(&tile.orig_id) {
                Ok(id) if !self.typemap.contains_key(&id) => {
                    self.reused += 1;
                    candidate = Some(id);
                }
                Ok(id) => {
                    tracing::debug!(key = %tile.orig_id, id, "original key taken, reassigning");
                    tile.orig_id.clear();
                    self.reassigned += 1;
                }
                Err(e) => {
                    tracing::debug!(key = %tile.orig_id, error = %e, "original key unusable, reassigning");
                    tile.orig_id.clear();
                    self.reassigned += 1;
                }
            }
        }

        let id = candidate.unwrap_or_else(|| self.next_free());
        self.typemap.insert(
            id,
            LegendEntry {
                hash,
                text: text.to_string(),
            },
        );
        self.by_hash.insert(hash, id);
        self.max_id = Some(self.max_id.map_or(id, |m| m.max(id)));
        id
    }

    fn next_free(&self) -> u64 {
        let mut id = self.typemap.len() as u64;
        while self.typemap.contains_key(&id) {
            id += 1;
        }
        id
    }

    /// Largest id assigned so far.
    pub fn max_id(&self) -> Option<u64> {
        self.max_id
    }

    /// Legend entries in ascending id order.
    pub fn legend(&self) -> &BTreeMap<u64, LegendEntry> {
        &self.typemap
    }

    /// How many original keys were kept.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// How many original keys had to be dropped.
    pub fn reassigned(&self) -> usize {
        self.reassigned
    }
}
