//! The 3D tile-id grid.
//!
//! Each z-level owns its own width and height. Cells are stored row-major,
//! `y` counting rows in file order (the first data row of a z-level is
//! `y = 0`).

use super::tile::TileId;

/// Grid addressing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Coordinates fall outside the addressed z-level.
    #[error("({x}, {y}, {z}) is out of bounds")]
    OutOfBounds {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Level.
        z: usize,
    },
}

/// One depth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZLevel {
    width: usize,
    height: usize,
    cells: Vec<TileId>,
}

impl ZLevel {
    /// A `width` x `height` level with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: TileId) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Build a level from decoded rows. All rows must share one width.
    pub(crate) fn from_rows(rows: Vec<Vec<TileId>>) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let cells = rows.into_iter().flatten().collect();
        Self { width, height, cells }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<TileId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    fn set(&mut self, x: usize, y: usize, id: TileId) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x] = id;
        true
    }

    /// One row, left to right.
    pub fn row(&self, y: usize) -> &[TileId] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Change dimensions, keeping overlapping cells and filling new ones.
    pub fn resize(&mut self, width: usize, height: usize, fill: TileId) {
        let mut cells = vec![fill; width * height];
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                cells[y * width + x] = self.cells[y * self.width + x];
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }
}

/// One cell visit produced by [`Grid::locations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Level.
    pub z: usize,
    /// Tile occupying the cell.
    pub tile: TileId,
}

/// All z-levels of a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    levels: Vec<ZLevel>,
}

impl Grid {
    /// Empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a level and return its index.
    pub fn push_level(&mut self, level: ZLevel) -> usize {
        self.levels.push(level);
        self.levels.len() - 1
    }

    /// Number of z-levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Level `z`.
    pub fn level(&self, z: usize) -> Option<&ZLevel> {
        self.levels.get(z)
    }

    /// Mutable level `z`.
    pub fn level_mut(&mut self, z: usize) -> Option<&mut ZLevel> {
        self.levels.get_mut(z)
    }

    /// All levels in z order.
    pub fn levels(&self) -> &[ZLevel] {
        &self.levels
    }

    /// Tile id at `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<TileId> {
        self.levels.get(z).and_then(|level| level.get(x, y))
    }

    /// Set the tile id at `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: TileId) -> Result<(), GridError> {
        let placed = match self.levels.get_mut(z) {
            Some(level) => level.set(x, y, id),
            None => false,
        };
        if placed {
            Ok(())
        } else {
            Err(GridError::OutOfBounds { x, y, z })
        }
    }

    /// Every cell, by increasing z, then row-major within each level.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.levels.iter().enumerate().flat_map(|(z, level)| {
            (0..level.height).flat_map(move |y| {
                (0..level.width).map(move |x| Location {
                    x,
                    y,
                    z,
                    tile: level.cells[y * level.width + x],
                })
            })
        })
    }

    /// Drop every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
