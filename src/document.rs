//! In-memory map document: instances, tiles and the grid.
//!
//! The document owns everything a read produces and a write consumes.
//! Readers and writers borrow it for one call and keep their own caches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::canonical::canonical_hash_hex;
use crate::interner::serialize_tile;
use crate::types::{AtomInstance, Grid, GridError, InstanceId, Location, Tile, TileId, ZLevel};

/// Resolves instance ids to instances.
pub trait InstanceLookup {
    /// Fetch an instance.
    fn instance(&self, id: InstanceId) -> Option<&AtomInstance>;
}

/// A loaded or constructed map.
#[derive(Debug, Clone, Default)]
pub struct MapDocument {
    /// Tile ids by (x, y, z).
    pub grid: Grid,
    tiles: Vec<Tile>,
    instances: Vec<Arc<AtomInstance>>,
    key_width: usize,
}

impl MapDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.tiles.clear();
        self.instances.clear();
        self.key_width = 0;
    }

    /// Legend key width of the file this document was read from (0 if none).
    pub fn key_width(&self) -> usize {
        self.key_width
    }

    /// Record the legend key width of the source file.
    pub fn set_key_width(&mut self, width: usize) {
        self.key_width = width;
    }

    // ── Instances ───────────────────────────────────────────────────────

    /// Store an instance and return its id.
    pub fn add_instance(&mut self, instance: Arc<AtomInstance>) -> InstanceId {
        self.instances.push(instance);
        InstanceId((self.instances.len() - 1) as u32)
    }

    /// Number of stored instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ── Tiles ───────────────────────────────────────────────────────────

    /// A new, empty tile carrying the next free id. Not stored until
    /// passed to [`update_tile`](Self::update_tile).
    pub fn create_tile(&self) -> Tile {
        Tile::new(TileId(self.tiles.len() as u32), Vec::new())
    }

    /// Store `tile` under its id, replacing any tile already there.
    ///
    /// A tile whose id is past the end is appended and renumbered.
    pub fn update_tile(&mut self, mut tile: Tile) -> TileId {
        let index = tile.id.0 as usize;
        if index < self.tiles.len() {
            self.tiles[index] = tile;
            TileId(index as u32)
        } else {
            let id = TileId(self.tiles.len() as u32);
            tile.id = id;
            self.tiles.push(tile);
            id
        }
    }

    /// Fetch a tile.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0 as usize)
    }

    /// Fetch a tile mutably.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.0 as usize)
    }

    /// All tiles by id.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    // ── Grid ────────────────────────────────────────────────────────────

    /// Append a `width` x `height` z-level filled with tile 0; returns its index.
    pub fn create_z_level(&mut self, height: usize, width: usize) -> usize {
        self.grid.push_level(ZLevel::new(width, height, TileId(0)))
    }

    /// Resize z-level `z`, filling new cells with tile 0.
    pub fn resize(&mut self, z: usize, width: usize, height: usize) -> bool {
        match self.grid.level_mut(z) {
            Some(level) => {
                level.resize(width, height, TileId(0));
                true
            }
            None => false,
        }
    }

    /// Point cell `(x, y, z)` at tile `id`.
    pub fn set_tile_id(&mut self, x: usize, y: usize, z: usize, id: TileId) -> Result<(), GridError> {
        self.grid.set(x, y, z, id)
    }

    /// The tile at `(x, y, z)`.
    pub fn tile_at(&self, x: usize, y: usize, z: usize) -> Option<&Tile> {
        self.grid.get(x, y, z).and_then(|id| self.tile(id))
    }

    /// Every cell, by increasing z then row-major.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.grid.locations()
    }

    /// Hash of the serialized tile content of every cell.
    ///
    /// Two documents with the same fingerprint place identical content at
    /// identical coordinates, whatever their legend ids.
    pub fn topology_fingerprint(&self) -> String {
        let mut rendered: HashMap<TileId, String> = HashMap::new();
        let levels: Vec<(usize, usize, Vec<String>)> = self
            .grid
            .levels()
            .iter()
            .map(|level| {
                let mut cells = Vec::with_capacity(level.width() * level.height());
                for y in 0..level.height() {
                    for &id in level.row(y) {
                        let text = rendered.entry(id).or_insert_with(|| {
                            self.tile(id)
                                .and_then(|tile| serialize_tile(tile, self, false).ok())
                                .unwrap_or_default()
                        });
                        cells.push(text.clone());
                    }
                }
                (level.width(), level.height(), cells)
            })
            .collect();
        canonical_hash_hex(&levels)
    }
}

impl InstanceLookup for MapDocument {
    fn instance(&self, id: InstanceId) -> Option<&AtomInstance> {
        self.instances.get(id.0 as usize).map(Arc::as_ref)
    }
}
