//! Write-to-temp-then-rename file replacement.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `path` with `suffix` appended to its file name (`map.dmm` → `map.dmm.tmp`).
pub fn temp_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Replace `path` with whatever `write` produces, or leave it untouched.
///
/// Output goes to a temporary sibling file which is flushed, synced and
/// closed before being renamed over `path`. If `write` fails the temporary
/// file is removed and `path` is never touched.
pub fn write_atomically<T, E, F>(path: &Path, suffix: &str, write: F) -> Result<T, E>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T, E>,
    E: From<io::Error>,
{
    let tmp_path = temp_path_for(path, suffix);

    let result = (|| -> Result<T, E> {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let value = write(&mut writer)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(value)
    })();

    match result {
        Ok(value) => {
            // rename replaces an existing target on every supported platform.
            if let Err(e) = fs::rename(&tmp_path, path) {
                remove_temp(&tmp_path);
                return Err(e.into());
            }
            Ok(value)
        }
        Err(e) => {
            remove_temp(&tmp_path);
            Err(e)
        }
    }
}

fn remove_temp(tmp_path: &Path) {
    if let Err(cleanup) = fs::remove_file(tmp_path) {
        if cleanup.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %tmp_path.display(), error = %cleanup, "could not remove temporary file");
        }
    }
}
