//! Reader and writer configuration.
//!
//! Options are plain serde structs with defaults, so a JSON config file may
//! set only the fields it cares about:
//!
//! ```json
//! { "writer": { "clean": false, "inherited": true } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::codec::Alphabet;

/// Default suffix for the temporary file a write goes through.
pub const DEFAULT_TEMP_SUFFIX: &str = ".tmp";

/// Cooperative cancellation flag, checked between grid rows.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not yet raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for [`DmmReader`](crate::reader::DmmReader).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Legend key alphabet.
    pub alphabet: Alphabet,
    /// Reject z-levels whose rows differ in width.
    pub strict_row_width: bool,
    /// Optional cancellation flag.
    #[serde(skip)]
    pub cancel: Option<CancelFlag>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::default(),
            strict_row_width: true,
            cancel: None,
        }
    }
}

/// Options for [`DmmWriter`](crate::writer::DmmWriter).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Prefer reusing original legend keys when unambiguous.
    pub clean: bool,
    /// Write every var of every instance, not only map-specified ones.
    pub inherited: bool,
    /// Legend key alphabet.
    pub alphabet: Alphabet,
    /// Suffix appended to the target file name for the temporary file.
    pub temp_suffix: String,
    /// Optional cancellation flag.
    #[serde(skip)]
    pub cancel: Option<CancelFlag>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            clean: true,
            inherited: false,
            alphabet: Alphabet::default(),
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
            cancel: None,
        }
    }
}

/// Error loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON or an invalid value (e.g. a bad alphabet).
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Could not read the config file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The temp suffix must be non-empty, or the target would be its own temp file.
    #[error("writer.temp_suffix must not be empty")]
    EmptyTempSuffix,
}

/// Combined reader/writer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reader options.
    pub reader: ReaderOptions,
    /// Writer options.
    pub writer: WriterOptions,
}

impl CodecConfig {
    /// Parse from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.writer.temp_suffix.is_empty() {
            return Err(ConfigError::EmptyTempSuffix);
        }
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
