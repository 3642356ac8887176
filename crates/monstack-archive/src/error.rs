//! Error types for the archive codec.

use std::path::PathBuf;

use thiserror::Error;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("creating archive {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("opening archive {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("walking {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("reading tar entry: {0}")]
    Entry(std::io::Error),

    #[error("invalid tar entry: path traversal detected: {0}")]
    PathTraversal(String),

    #[error("tar entry {name} declares {size} bytes, limit is {limit}")]
    EntryTooLarge { name: String, size: u64, limit: u64 },
}

impl ArchiveError {
    /// Integrity errors mean the archive is corrupt or hostile.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            ArchiveError::PathTraversal(_) | ArchiveError::EntryTooLarge { .. }
        )
    }
}
