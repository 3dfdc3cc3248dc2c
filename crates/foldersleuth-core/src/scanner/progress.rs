//! Scan progress reporting — lightweight snapshots handed from the scanner
//! to its progress sink after each directory is fully processed.

use std::path::PathBuf;

/// Running totals after one directory has been enumerated.
///
/// Emitted once per directory, not per file. Sinks must tolerate any call
/// frequency; nothing is buffered or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Root of the scan this snapshot belongs to.
    pub root: PathBuf,
    /// Directory whose entries were just processed.
    pub current_dir: PathBuf,
    /// Bytes of regular files counted so far.
    pub size_bytes: u64,
    /// Regular files counted so far.
    pub file_count: u64,
}
