//! tar.gz → directory tree, with traversal and size guards.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult};
use crate::{DIR_MODE, FILE_MODE_MASK, MAX_ENTRY_BYTES};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    pub directories: usize,
    pub files: usize,
    /// Entries of unsupported types (symlinks, devices, ...) that were ignored.
    pub skipped: usize,
    pub bytes: u64,
}

/// Extract the tarball at `archive_path` into `dest_dir`.
///
/// Aborts on the first entry that would land outside `dest_dir` or that
/// declares more than [`MAX_ENTRY_BYTES`]. Entries processed before the
/// offending one stay on disk.
pub fn unpack(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<UnpackSummary> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    create_dir(dest_dir)?;
    let root = fs::canonicalize(dest_dir).map_err(|source| ArchiveError::Read {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let mut summary = UnpackSummary::default();

    for entry in archive.entries().map_err(ArchiveError::Entry)? {
        let mut entry = entry.map_err(ArchiveError::Entry)?;
        let name = entry.path().map_err(ArchiveError::Entry)?.into_owned();
        let target = resolve_within(&root, &name)
            .ok_or_else(|| ArchiveError::PathTraversal(name.display().to_string()))?;

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            create_dir(&target)?;
            summary.directories += 1;
        } else if entry_type.is_file() {
            let size = entry.header().size().map_err(ArchiveError::Entry)?;
            if size > MAX_ENTRY_BYTES {
                return Err(ArchiveError::EntryTooLarge {
                    name: name.display().to_string(),
                    size,
                    limit: MAX_ENTRY_BYTES,
                });
            }
            if let Some(parent) = target.parent() {
                create_dir(parent)?;
            }
            let mode = entry.header().mode().map_err(ArchiveError::Entry)?;
            summary.bytes += extract_file(&mut entry, &target, mode)?;
            summary.files += 1;
        } else {
            debug!(entry = %name.display(), ?entry_type, "ignoring unsupported tar entry");
            summary.skipped += 1;
        }
    }

    info!(
        archive = %archive_path.display(),
        dest = %root.display(),
        files = summary.files,
        directories = summary.directories,
        "unpacked archive"
    );
    Ok(summary)
}

/// Join `name` onto `root` and normalise it lexically. Returns `None` when
/// the result is not `root` or a descendant of it.
fn resolve_within(root: &Path, name: &Path) -> Option<PathBuf> {
    let candidate = normalize(&root.join(name));
    candidate.starts_with(root).then_some(candidate)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn create_dir(path: &Path) -> ArchiveResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path).map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn extract_file<R: Read>(entry: &mut R, target: &Path, mode: u32) -> ArchiveResult<u64> {
    let write_err = |source: io::Error| ArchiveError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut out = File::create(target).map_err(write_err)?;
    let mut limited = (&mut *entry).take(MAX_ENTRY_BYTES);
    let written = io::copy(&mut limited, &mut out).map_err(write_err)?;
    out.sync_all().map_err(write_err)?;
    drop(out);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, fs::Permissions::from_mode(mode & FILE_MODE_MASK))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(written)
}
