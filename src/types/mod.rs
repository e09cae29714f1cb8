//! Core types for the map codec.

pub mod value;
pub mod atom;
pub mod tile;
pub mod grid;

pub use value::{Value, Literal, ListEntry, Origin, Special, UnknownSpecial};
pub use atom::{AtomType, AtomInstance, InstanceId};
pub use tile::{Tile, TileId};
pub use grid::{Grid, ZLevel, Location, GridError};
