//! Atomic file primitives. Every persisted file in the store goes through
//! [`write_atomic`], so a reader never observes partial contents: the
//! bytes land in a temp file in the target directory, then a rename moves
//! it into place.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, StoreError};

const TMP_PREFIX: &str = ".ppx-";

/// Write `data` to `path` via temp-file-then-rename. Creates parent
/// directories as needed. The temp file lives in the same directory as
/// the target so the rename stays on one filesystem.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        StoreError::Store(format!("no parent directory for {}", path.display()))
    })?;
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let mut tmp = tempfile::Builder::new().prefix(TMP_PREFIX).tempfile_in(dir)?;
    tmp.write_all(data.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Read a whole file, mapping "does not exist" to `None`.
pub fn read_opt(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
