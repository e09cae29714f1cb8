//! DMM writer.
//!
//! Output is the legend (ascending id order) followed by one grid block per
//! z-level. Every distinct tile content gets exactly one legend line; with
//! `clean` set the original keys are kept wherever they do not collide.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::Path;

use crate::atomic::write_atomically;
use crate::config::WriterOptions;
use crate::document::MapDocument;
use crate::interner::{serialize_tile, MissingInstance, WriteInterner};
use crate::types::TileId;

/// Error that aborts a write. The target file is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// A grid cell points at a tile the document does not have.
    #[error("cell ({x}, {y}, {z}) references unknown tile {tile}")]
    UnknownTile {
        /// The dangling tile id.
        tile: TileId,
        /// Cell x.
        x: usize,
        /// Cell y.
        y: usize,
        /// Cell z.
        z: usize,
    },
    /// A tile references an instance the document does not have.
    #[error(transparent)]
    UnknownInstance(#[from] MissingInstance),
    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The cancellation flag was raised.
    #[error("write cancelled")]
    Cancelled,
}

/// Summary of a completed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Legend lines written.
    pub legend_entries: usize,
    /// Legend key width.
    pub key_width: usize,
    /// Z-levels written.
    pub z_levels: usize,
    /// Tiles that kept their original key.
    pub reused_keys: usize,
    /// Tiles whose original key was dropped for a fresh one.
    pub reassigned_keys: usize,
}

/// Legend assignment for one write.
struct LegendPlan {
    interner: WriteInterner,
    keys: HashMap<TileId, String>,
    key_width: usize,
}

/// DMM writer.
#[derive(Debug, Clone, Default)]
pub struct DmmWriter {
    options: WriterOptions,
}

impl DmmWriter {
    /// Create a writer.
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Writer options.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write `doc` to `path`, replacing it only once the output is complete.
    ///
    /// Takes the document mutably: in clean mode, tiles whose original key
    /// had to be dropped get their `orig_id` cleared.
    pub fn write_path(&self, doc: &mut MapDocument, path: &Path) -> Result<WriteReport, WriteError> {
        let report = write_atomically(path, &self.options.temp_suffix, |out| self.write_to(doc, out))?;
        tracing::info!(
            path = %path.display(),
            legend_entries = report.legend_entries,
            key_width = report.key_width,
            z_levels = report.z_levels,
            "map written"
        );
        Ok(report)
    }

    /// Render `doc` to a string.
    pub fn write_string(&self, doc: &mut MapDocument) -> Result<String, WriteError> {
        let mut buf = Vec::new();
        self.write_to(doc, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Write `doc` to any sink.
    pub fn write_to<W: Write>(&self, doc: &mut MapDocument, out: &mut W) -> Result<WriteReport, WriteError> {
        self.check_cancelled()?;
        let plan = self.plan(doc)?;
        self.emit(doc, &plan, out)?;

        let report = WriteReport {
            legend_entries: plan.interner.legend().len(),
            key_width: plan.key_width,
            z_levels: doc.grid.depth(),
            reused_keys: plan.interner.reused(),
            reassigned_keys: plan.interner.reassigned(),
        };
        tracing::debug!(
            legend_entries = report.legend_entries,
            reused = report.reused_keys,
            reassigned = report.reassigned_keys,
            "legend assigned"
        );
        Ok(report)
    }

    fn check_cancelled(&self) -> Result<(), WriteError> {
        match &self.options.cancel {
            Some(flag) if flag.is_cancelled() => Err(WriteError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Assign an output id to every tile the grid uses, in traversal order.
    fn plan(&self, doc: &mut MapDocument) -> Result<LegendPlan, WriteError> {
        let alphabet = &self.options.alphabet;

        // Distinct tiles in first-use order, with the first cell using each.
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut last = None;
        for loc in doc.locations() {
            if last == Some(loc.tile) {
                continue;
            }
            last = Some(loc.tile);
            if seen.insert(loc.tile) {
                order.push(loc);
            }
        }

        let mut interner = WriteInterner::new();
        let mut ids: Vec<(TileId, u64)> = Vec::with_capacity(order.len());
        for loc in order {
            let mut tile = doc
                .tile(loc.tile)
                .ok_or(WriteError::UnknownTile {
                    tile: loc.tile,
                    x: loc.x,
                    y: loc.y,
                    z: loc.z,
                })?
                .clone();
            let text = serialize_tile(&tile, &*doc, self.options.inherited)?;
            let before = tile.orig_id.len();
            let id = interner.intern(&mut tile, &text, self.options.clean, alphabet);
            if tile.orig_id.len() != before {
                doc.update_tile(tile);
            }
            ids.push((loc.tile, id));
        }

        let mut key_width = interner.max_id().map_or(1, |max| alphabet.encoded_len(max));
        if self.options.clean {
            key_width = key_width.max(doc.key_width());
        }

        let keys = ids
            .into_iter()
            .map(|(tile, id)| (tile, alphabet.encode(id, key_width)))
            .collect();
        Ok(LegendPlan {
            interner,
            keys,
            key_width,
        })
    }

    fn emit<W: Write>(&self, doc: &MapDocument, plan: &LegendPlan, out: &mut W) -> Result<(), WriteError> {
        let alphabet = &self.options.alphabet;

        for (id, entry) in plan.interner.legend() {
            writeln!(out, "\"{}\" = {}", alphabet.encode(*id, plan.key_width), entry.text)?;
        }

        for (z, level) in doc.grid.levels().iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "(1,1,{}) = {{\"", z + 1)?;
            let mut row = String::with_capacity(level.width() * plan.key_width);
            for y in 0..level.height() {
                self.check_cancelled()?;
                row.clear();
                for (x, tile) in level.row(y).iter().enumerate() {
                    let key = plan.keys.get(tile).ok_or(WriteError::UnknownTile {
                        tile: *tile,
                        x,
                        y,
                        z,
                    })?;
                    row.push_str(key);
                }
                writeln!(out, "{}", row)?;
            }
            writeln!(out, "\"}}")?;
        }
        out.flush()?;
        Ok(())
    }
}
