//! Tiles: the ordered stack of atom instances occupying one grid cell.

use std::fmt;

use super::atom::InstanceId;

/// Document-local tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tile definition, bottom layer first (area, turf, objects, mobs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Current identity inside the document.
    pub id: TileId,
    /// Legend key this tile was read under; empty when unknown.
    pub orig_id: String,
    /// Stacked instances.
    pub instances: Vec<InstanceId>,
}

impl Tile {
    /// Create a tile with no legend key.
    pub fn new(id: TileId, instances: Vec<InstanceId>) -> Self {
        Self {
            id,
            orig_id: String::new(),
            instances,
        }
    }

    /// Builder-style legend key.
    pub fn with_orig_id(mut self, orig_id: impl Into<String>) -> Self {
        self.orig_id = orig_id.into();
        self
    }
}
