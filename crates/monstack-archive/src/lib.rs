//! monstack-archive — the archive codec for stack exports.
//!
//! An export is a directory tree; on the wire it is that tree, tarred and
//! gzip-compressed. Only directories and regular files are packed or
//! restored.
//!
//! # Safety guards on unpack
//!
//! - Every entry must resolve inside the destination root. An entry that
//!   escapes (`../x`, `/etc/x`) aborts the whole unpack with
//!   [`ArchiveError::PathTraversal`].
//! - A single entry may carry at most [`MAX_ENTRY_BYTES`]. Larger entries
//!   abort with [`ArchiveError::EntryTooLarge`] before anything is written.
//! - Permission bits are masked to [`FILE_MODE_MASK`]; directories are
//!   created with [`DIR_MODE`].
//! - Symlinks, hard links and device nodes are never created.

mod error;
mod pack;
mod unpack;

pub use error::{ArchiveError, ArchiveResult};
pub use pack::{pack, PackResult};
pub use unpack::{unpack, UnpackSummary};

/// Upper bound on the bytes extracted for any single entry (1 GiB).
pub const MAX_ENTRY_BYTES: u64 = 1 << 30;

/// Widest permission set an extracted file may receive.
pub const FILE_MODE_MASK: u32 = 0o750;

/// Mode for directories created during extraction.
pub const DIR_MODE: u32 = 0o750;
