//! DMM reader.
//!
//! A DMM file is a legend followed by one grid block per z-level:
//!
//! ```text
//! "aaa" = (/turf/space,/area)
//! "aab" = (/turf/simulated/floor{dir = 4},/area)
//!
//! (1,1,1) = {"
//! aaaaab
//! "}
//! ```
//!
//! The reader is a line-driven state machine
//! (`Start → Legend → Grid(z) → AfterGrid → Grid(z+1) ...`). All caches live
//! in a per-call context, so one reader may be shared across documents.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::codec::{split_atoms, Alphabet, IdError, SplitError};
use crate::config::ReaderOptions;
use crate::document::MapDocument;
use crate::interner::ReadInterner;
use crate::registry::AtomRegistry;
use crate::resolver::{resolve_atom_at, ResolveError};
use crate::types::{InstanceId, Origin, TileId, ZLevel};

/// Error that aborts reading a document.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A legend line could not be parsed at all.
    #[error("line {line}: malformed tile definition {key:?}: {reason}")]
    MalformedTile {
        /// 1-based line number.
        line: usize,
        /// Legend key, if one could be extracted.
        key: String,
        /// What was wrong.
        reason: String,
    },
    /// A grid cell names a key that is not in the legend.
    #[error("line {line}: grid references unknown legend key {key:?}")]
    UnknownLegendReference {
        /// 1-based line number.
        line: usize,
        /// The key.
        key: String,
    },
    /// A grid block is structurally broken.
    #[error("line {line}: malformed grid: {reason}")]
    MalformedGrid {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
    /// A key is not valid in the configured alphabet.
    #[error("line {line}: {source}")]
    InvalidKey {
        /// 1-based line number.
        line: usize,
        /// Decoding failure.
        #[source]
        source: IdError,
    },
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The cancellation flag was raised.
    #[error("read cancelled at line {line}")]
    Cancelled {
        /// Line about to be processed.
        line: usize,
    },
}

/// Summary of a completed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Legend lines read.
    pub legend_entries: usize,
    /// Distinct tiles stored.
    pub tiles: usize,
    /// Legend lines folded into an identical earlier one.
    pub duplicate_tiles: usize,
    /// Type paths that were not in the registry.
    pub unknown_atoms: BTreeSet<String>,
    /// Keys of tiles that lost at least one atom.
    pub incomplete_tiles: Vec<String>,
    /// Z-levels read.
    pub z_levels: usize,
    /// Legend key width.
    pub key_width: usize,
}

/// DMM reader bound to an atom registry.
pub struct DmmReader<'r, R: AtomRegistry + ?Sized> {
    registry: &'r R,
    options: ReaderOptions,
}

impl<'r, R: AtomRegistry + ?Sized> DmmReader<'r, R> {
    /// Create a reader.
    pub fn new(registry: &'r R, options: ReaderOptions) -> Self {
        Self { registry, options }
    }

    /// Create a reader with default options.
    pub fn with_defaults(registry: &'r R) -> Self {
        Self::new(registry, ReaderOptions::default())
    }

    /// Read a map from a string into `doc`, replacing its content.
    pub fn read_str(&self, text: &str, doc: &mut MapDocument) -> Result<ReadReport, ReadError> {
        self.read_from(text.as_bytes(), None, doc)
    }

    /// Read a map file into `doc`.
    ///
    /// A missing file is not an error: it is logged and leaves `doc` empty.
    pub fn read_path(&self, path: &Path, doc: &mut MapDocument) -> Result<ReadReport, ReadError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "map file not found, treating as empty");
                doc.clear();
                return Ok(ReadReport::default());
            }
            Err(e) => return Err(e.into()),
        };
        let source = path.display().to_string();
        self.read_from(BufReader::new(file), Some(&source), doc)
    }

    /// Read a map from any buffered source. `source` names the input in
    /// value provenance and logs.
    pub fn read_from<B: BufRead>(
        &self,
        input: B,
        source: Option<&str>,
        doc: &mut MapDocument,
    ) -> Result<ReadReport, ReadError> {
        doc.clear();
        let mut ctx = ReadContext::new(self.registry, &self.options, source);

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            ctx.feed(index + 1, &line, doc)?;
        }
        ctx.finish(doc)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-call state
// ─────────────────────────────────────────────────────────────────────────────

struct PendingLevel {
    header_line: usize,
    width: Option<usize>,
    rows: Vec<Vec<TileId>>,
}

enum ReadState {
    Start,
    Legend,
    Grid(PendingLevel),
    AfterGrid,
}

struct ReadContext<'a, R: ?Sized> {
    registry: &'a R,
    options: &'a ReaderOptions,
    source: Option<&'a str>,
    interner: ReadInterner,
    // Raw chunk text → resolved instance; `None` marks an unknown atom.
    atoms: HashMap<String, Option<InstanceId>>,
    key_width: usize,
    state: ReadState,
    report: ReadReport,
}

impl<'a, R: AtomRegistry + ?Sized> ReadContext<'a, R> {
    fn new(registry: &'a R, options: &'a ReaderOptions, source: Option<&'a str>) -> Self {
        Self {
            registry,
            options,
            source,
            interner: ReadInterner::new(),
            atoms: HashMap::new(),
            key_width: 0,
            state: ReadState::Start,
            report: ReadReport::default(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &str, doc: &mut MapDocument) -> Result<(), ReadError> {
        let line = match line_no {
            1 => line.strip_prefix('\u{feff}').unwrap_or(line),
            _ => line,
        };
        let trimmed = line.trim();

        if let ReadState::Grid(_) = self.state {
            return self.grid_line(line_no, trimmed, doc);
        }

        if trimmed.is_empty() || trimmed.starts_with("//") {
            return Ok(());
        }

        if trimmed.starts_with('"') {
            if let ReadState::AfterGrid = self.state {
                tracing::warn!(line = line_no, "legend entry after grid section skipped");
                return Ok(());
            }
            self.state = ReadState::Legend;
            return self.legend_line(line_no, trimmed, doc);
        }

        if let Some(header) = parse_grid_header(trimmed) {
            if header.z != doc.grid.depth() + 1 {
                tracing::debug!(line = line_no, z = header.z, "z-level header out of sequence");
            }
            self.state = ReadState::Grid(PendingLevel {
                header_line: line_no,
                width: None,
                rows: Vec::new(),
            });
            if !header.rest.is_empty() {
                return self.grid_line(line_no, header.rest, doc);
            }
            return Ok(());
        }

        tracing::warn!(line = line_no, text = trimmed, "unrecognised line skipped");
        Ok(())
    }

    fn legend_line(&mut self, line_no: usize, line: &str, doc: &mut MapDocument) -> Result<(), ReadError> {
        let (key, body) = split_legend_line(line).map_err(|reason| ReadError::MalformedTile {
            line: line_no,
            key: String::new(),
            reason: reason.to_string(),
        })?;
        let malformed = |reason: String| ReadError::MalformedTile {
            line: line_no,
            key: key.to_string(),
            reason,
        };

        if key.is_empty() {
            return Err(malformed("empty legend key".into()));
        }
        let decoded = self
            .options
            .alphabet
            .decode(key)
            .map_err(|source| ReadError::InvalidKey { line: line_no, source })?;

        let chunks = match split_atoms(body) {
            Ok(chunks) => chunks,
            // An override block left open at end of line is closed for it.
            Err(SplitError::MalformedLine { unclosed }) if unclosed == "{" => {
                tracing::warn!(line = line_no, key = key, "unclosed override block at end of line");
                split_atoms(&format!("{}}}", body)).map_err(|e| malformed(e.to_string()))?
            }
            Err(e) => return Err(malformed(e.to_string())),
        };
        if chunks.is_empty() {
            tracing::debug!(line = line_no, key = key, "empty tile");
        }

        let mut instances = Vec::with_capacity(chunks.len());
        let mut incomplete = false;
        for chunk in &chunks {
            match self.instance_for(chunk, line_no, doc) {
                Some(id) => instances.push(id),
                None => incomplete = true,
            }
        }
        if incomplete {
            self.report.incomplete_tiles.push(key.to_string());
        }
        if self.interner.lookup(decoded).is_some() {
            tracing::warn!(line = line_no, key = key, "legend key redefined");
        }

        self.key_width = self.key_width.max(key.chars().count());
        self.interner.intern(doc, body, key, decoded, instances);
        self.report.legend_entries += 1;
        Ok(())
    }

    fn instance_for(&mut self, chunk: &str, line_no: usize, doc: &mut MapDocument) -> Option<InstanceId> {
        if let Some(&cached) = self.atoms.get(chunk) {
            return cached;
        }

        let origin = Origin::at(self.source, line_no as u32);
        let resolved = match resolve_atom_at(chunk, self.registry, &origin) {
            Ok(instance) => Some(doc.add_instance(instance)),
            Err(ResolveError::UnknownAtom(path)) => {
                tracing::warn!(line = line_no, path = %path, "unknown atom skipped");
                self.report.unknown_atoms.insert(path);
                None
            }
            Err(ResolveError::EmptyChunk) => None,
        };
        self.atoms.insert(chunk.to_string(), resolved);
        resolved
    }

    fn grid_line(&mut self, line_no: usize, line: &str, doc: &mut MapDocument) -> Result<(), ReadError> {
        let (row, closing) = match line.strip_suffix("\"}") {
            Some(row) => (row.trim(), true),
            None => (line, false),
        };

        if !row.is_empty() {
            if self.options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                return Err(ReadError::Cancelled { line: line_no });
            }
            let mut cells = decode_row(
                row,
                line_no,
                self.key_width,
                &self.options.alphabet,
                &self.interner,
            )?;

            if let ReadState::Grid(level) = &mut self.state {
                let width = *level.width.get_or_insert(cells.len());
                if cells.len() != width {
                    let reason = format!("row has {} cells, expected {}", cells.len(), width);
                    if self.options.strict_row_width {
                        return Err(ReadError::MalformedGrid { line: line_no, reason });
                    }
                    tracing::warn!(line = line_no, "{}; row padded/truncated", reason);
                    let fill = cells.last().copied().unwrap_or_default();
                    cells.resize(width, fill);
                }
                level.rows.push(cells);
            }
        }

        if closing {
            if let ReadState::Grid(level) = std::mem::replace(&mut self.state, ReadState::AfterGrid) {
                doc.grid.push_level(ZLevel::from_rows(level.rows));
            }
        }
        Ok(())
    }

    fn finish(self, doc: &mut MapDocument) -> Result<ReadReport, ReadError> {
        if let ReadState::Grid(level) = &self.state {
            return Err(ReadError::MalformedGrid {
                line: level.header_line,
                reason: "z-level is never closed".into(),
            });
        }

        doc.set_key_width(self.key_width);
        let mut report = self.report;
        report.tiles = doc.tiles().len();
        report.duplicate_tiles = self.interner.duplicates();
        report.z_levels = doc.grid.depth();
        report.key_width = self.key_width;

        tracing::info!(
            source = self.source.unwrap_or("<memory>"),
            tiles = report.tiles,
            duplicates = report.duplicate_tiles,
            unknown_atoms = report.unknown_atoms.len(),
            z_levels = report.z_levels,
            "map read"
        );
        Ok(report)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `"key" = (body)` → `(key, body)`. A missing closing paren is tolerated.
fn split_legend_line(line: &str) -> Result<(&str, &str), &'static str> {
    let rest = line.strip_prefix('"').ok_or("missing opening quote")?;
    let close = rest.find('"').ok_or("unterminated key")?;
    let key = &rest[..close];
    let after = rest[close + 1..]
        .trim_start()
        .strip_prefix('=')
        .ok_or("missing '='")?;
    let open = after.find('(').ok_or("missing '('")?;
    let body = after[open + 1..].trim_end();
    Ok((key, body.strip_suffix(')').unwrap_or(body)))
}

struct GridHeader<'a> {
    z: usize,
    rest: &'a str,
}

/// `(x,y,z) = {"` plus anything following the opening quote.
fn parse_grid_header(line: &str) -> Option<GridHeader<'_>> {
    let inner = line.strip_prefix('(')?;
    let close = inner.find(')')?;
    let coords: Vec<usize> = inner[..close]
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<_>>()?;
    if coords.len() != 3 {
        return None;
    }
    let rest = inner[close + 1..]
        .trim_start()
        .strip_prefix('=')?
        .trim_start()
        .strip_prefix("{\"")?;
    Some(GridHeader {
        z: coords[2],
        rest: rest.trim(),
    })
}

fn decode_row(
    row: &str,
    line: usize,
    key_width: usize,
    alphabet: &Alphabet,
    interner: &ReadInterner,
) -> Result<Vec<TileId>, ReadError> {
    if key_width == 0 {
        return Err(ReadError::MalformedGrid {
            line,
            reason: "grid row before any legend entry".into(),
        });
    }
    let chars: Vec<char> = row.chars().collect();
    if chars.len() % key_width != 0 {
        return Err(ReadError::MalformedGrid {
            line,
            reason: format!("row length {} is not a multiple of key width {}", chars.len(), key_width),
        });
    }

    chars
        .chunks(key_width)
        .map(|token| {
            let key: String = token.iter().collect();
            let n = alphabet
                .decode(&key)
                .map_err(|source| ReadError::InvalidKey { line, source })?;
            interner
                .lookup(n)
                .ok_or(ReadError::UnknownLegendReference { line, key })
        })
        .collect()
}
