//! Verbatim file and directory copies used when staging and restoring.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy `src` to `dst`, creating `dst`'s parent directories.
pub(crate) fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Recursively copy the tree at `src` into `dst`. Returns the number of files.
pub(crate) fn copy_dir(src: &Path, dst: &Path) -> io::Result<usize> {
    let mut files = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            copy_file(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}

/// Empty paths stand for "not configured".
pub(crate) fn is_unset(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
