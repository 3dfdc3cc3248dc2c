//! Scan outcome and persisted cache row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one scan of a folder subtree.
///
/// Immutable once produced. When `cancelled` is `true` the totals are a
/// partial snapshot and must never be written to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Scan root.
    pub path: PathBuf,
    /// Sum of regular file sizes encountered.
    pub size_bytes: u64,
    /// Number of regular files encountered.
    pub file_count: u64,
    /// `true` if the scan was aborted by its cancel flag.
    pub cancelled: bool,
    /// Entries or directories skipped because they could not be read.
    pub error_count: u64,
}

impl ScanResult {
    /// `true` if the result may be persisted and trusted as the size of `path`.
    pub fn is_authoritative(&self) -> bool {
        !self.cancelled
    }

    /// `true` if some entries were skipped, so the totals are a lower bound.
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.error_count > 0
    }
}

/// A row of the persistent cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalised absolute path; primary key of the store.
    pub path: PathBuf,
    pub size_bytes: u64,
    pub file_count: u64,
    /// When the row was last written.
    pub last_scanned: DateTime<Utc>,
}

impl CacheEntry {
    /// Rebuild the authoritative result this row was saved from.
    ///
    /// The store does not keep `error_count`, so a cache hit always reports zero.
    pub fn into_result(self) -> ScanResult {
        ScanResult {
            path: self.path,
            size_bytes: self.size_bytes,
            file_count: self.file_count,
            cancelled: false,
            error_count: 0,
        }
    }
}
