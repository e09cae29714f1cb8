//! # dmm-codec
//!
//! Reader and writer for BYOND DMM map files.
//!
//! A DMM file is a legend mapping short base-52 keys to tile definitions
//! (stacks of atoms with optional property overrides), followed by one grid
//! of keys per z-level.
//!
//! ## Architecture
//!
//! ```text
//! file ──DmmReader──► MapDocument ──DmmWriter──► file.tmp ──rename──► file
//!          │             │   ▲                      │
//!          ▼             ▼   │                      ▼
//!    AtomRegistry   Tiles / Grid / Instances   WriteInterner
//! ```
//!
//! ## Guarantees
//!
//! - Identical tile content appears once in the legend, in memory and on disk
//! - Only map-specified vars are written unless `inherited` is set
//! - A failed or cancelled write never touches the target file
//! - With `clean` set, untouched tiles keep their original legend keys

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod codec;
pub mod canonical;
pub mod registry;
pub mod resolver;
pub mod document;
pub mod interner;
pub mod config;
pub mod atomic;
pub mod reader;
pub mod writer;

// Re-exports
pub use types::{
    AtomInstance, AtomType, Grid, GridError, InstanceId, ListEntry, Literal, Location, Origin,
    Special, Tile, TileId, UnknownSpecial, Value, ZLevel,
};
pub use codec::{
    format_value, parse_literal, split_atoms, split_properties, Alphabet, AlphabetError, IdError,
    SplitError, DEFAULT_ALPHABET,
};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes, TileHash};
pub use registry::{AtomRegistry, AtomTypeRecord, InMemoryAtomRegistry, RegistryError};
pub use resolver::{instance_from_properties, resolve_atom, resolve_atom_at, ResolveError};
pub use document::{InstanceLookup, MapDocument};
pub use interner::{serialize_tile, LegendEntry, MissingInstance, ReadInterner, WriteInterner};
pub use config::{CancelFlag, CodecConfig, ConfigError, ReaderOptions, WriterOptions};
pub use atomic::{temp_path_for, write_atomically};
pub use reader::{DmmReader, ReadError, ReadReport};
pub use writer::{DmmWriter, WriteError, WriteReport};
