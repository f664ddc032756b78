//! File system operations
//!
//! Low-level helpers shared by the storage operations.

use chrono::{DateTime, Local, Utc};
use log::warn;
use std::fs::{self, File, Metadata};
use std::io::Result;
use std::path::{Path, PathBuf};

use crate::storage::results::{EntryKind, FileEntry};

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
}

/// Snapshot of a filesystem object's metadata
pub fn entry_from_metadata(name: String, metadata: &Metadata) -> FileEntry {
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    FileEntry {
        name,
        kind,
        size: (kind == EntryKind::File).then(|| metadata.len()),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    }
}

/// Picks a backup name next to `path`: `<name>.backup_<YYYYMMDD_HHMMSS>`,
/// with `_<n>` appended when that name is already taken.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = format!("{}.backup_{}", file_name, now.format("%Y%m%d_%H%M%S"));

    let mut candidate = path.with_file_name(&stem);
    let mut counter = 1;
    while candidate.symlink_metadata().is_ok() {
        candidate = path.with_file_name(format!("{}_{}", stem, counter));
        counter += 1;
    }
    candidate
}

/// Copy a single file, carrying over its modification time
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let bytes = fs::copy(source, destination)?;
    if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified()) {
        let target = File::options().write(true).open(destination)?;
        target.set_modified(modified)?;
    }
    Ok(bytes)
}

/// Recursively copy a directory.
///
/// Nested symlinks are not followed and not copied, so a copy can never pull
/// content from outside the tree being copied.
pub fn copy_directory(source: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = destination.join(entry.file_name());

        if file_type.is_symlink() {
            warn!(
                "Skipping symlink {} while copying directory",
                entry.file_name().to_string_lossy()
            );
        } else if file_type.is_dir() {
            copy_directory(&entry.path(), &target)?;
        } else {
            copy_file(&entry.path(), &target)?;
        }
    }

    if let Ok(permissions) = fs::metadata(source).map(|m| m.permissions()) {
        fs::set_permissions(destination, permissions)?;
    }
    Ok(())
}
