//! Symlink and reparse-point detection for directory entries.

use std::fs::{DirEntry, Metadata};
use tracing::debug;

/// Return `true` if `entry` is a real directory the scanner may push onto
/// its stack.
///
/// Anything that cannot be inspected is treated as unsafe and silently
/// skipped; the scanner does not count it as an access error.
pub fn is_safe_dir(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(file_type) if file_type.is_symlink() => return false,
        Ok(_) => {}
        Err(err) => {
            debug!("Cannot read file type of {:?}: {}", entry.path(), err);
            return false;
        }
    }

    // `DirEntry::metadata` does not traverse symlinks.
    match entry.metadata() {
        Ok(meta) => !is_reparse_point(&meta),
        Err(err) => {
            debug!("Cannot stat {:?}: {}", entry.path(), err);
            false
        }
    }
}

/// Check the `FILE_ATTRIBUTE_REPARSE_POINT` bit (junctions, mount points,
/// cloud placeholders).
#[cfg(windows)]
pub fn is_reparse_point(meta: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    use windows::Win32::Storage::FileSystem::FILE_ATTRIBUTE_REPARSE_POINT;

    meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT.0 != 0
}

/// Non-Windows filesystems have no reparse points; symlinks are caught by
/// the file-type check in [`is_safe_dir`].
#[cfg(not(windows))]
pub fn is_reparse_point(_meta: &Metadata) -> bool {
    false
}
