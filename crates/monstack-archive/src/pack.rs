//! Directory tree → tar.gz.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{ArchiveError, ArchiveResult};

#[derive(Debug, Clone)]
pub struct PackResult {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub sha256: String,
    /// Directories and files written, excluding the root itself.
    pub entries: usize,
}

/// Pack `source_dir` into a gzip-compressed tarball at `output_path`.
///
/// Entries are written in file-name order with paths relative to
/// `source_dir`. Only directories and regular files are packed. If
/// anything fails the partially written output is removed, so an existing
/// file at `output_path` after an error is never a valid archive.
pub fn pack(source_dir: &Path, output_path: &Path) -> ArchiveResult<PackResult> {
    let entries = match write_archive(source_dir, output_path) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(output_path);
            return Err(e);
        }
    };

    let (size_bytes, sha256) = digest_file(output_path)?;
    info!(
        archive = %output_path.display(),
        entries,
        size_bytes,
        "packed archive"
    );

    Ok(PackResult {
        output_path: output_path.to_path_buf(),
        size_bytes,
        sha256,
        entries,
    })
}

fn write_archive(source_dir: &Path, output_path: &Path) -> ArchiveResult<usize> {
    let out_err = |source: io::Error| ArchiveError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    let file = File::create(output_path).map_err(|source| ArchiveError::Create {
        path: output_path.to_path_buf(),
        source,
    })?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut entries = 0;

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: source_dir.to_path_buf(),
            source,
        })?;
        let Ok(rel) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            builder.append_dir(rel, entry.path()).map_err(out_err)?;
        } else if file_type.is_file() {
            let mut f = File::open(entry.path()).map_err(|source| ArchiveError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            builder.append_file(rel, &mut f).map_err(out_err)?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular entry");
            continue;
        }
        entries += 1;
    }

    let encoder = builder.into_inner().map_err(out_err)?;
    let writer = encoder.finish().map_err(out_err)?;
    let file = writer.into_inner().map_err(|e| out_err(e.into_error()))?;
    file.sync_all().map_err(out_err)?;

    Ok(entries)
}

fn digest_file(path: &Path) -> ArchiveResult<(u64, String)> {
    let read_err = |source: io::Error| ArchiveError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher).map_err(read_err)?;
    Ok((size, hex::encode(hasher.finalize())))
}
