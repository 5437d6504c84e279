//! Write-then-rename file replacement

use std::fs;
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DocxError;

/// Produce `target` through a temporary file in the same directory.
///
/// `target` is only replaced once `write` succeeded and the data is on disk;
/// on any error the temporary file is removed and `target` is untouched. An
/// existing `target` keeps its permissions.
pub fn atomic_write<F>(target: &Path, write: F) -> Result<(), DocxError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), DocxError>,
{
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;

    match fs::metadata(target) {
        Ok(existing) => fs::set_permissions(file.path(), existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    debug!(temp = %file.path().display(), target = %target.display(), "Replacing file");
    file.persist(target).map_err(|e| DocxError::Io(e.error))?;
    Ok(())
}
