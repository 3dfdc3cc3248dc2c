/// Data model for FolderSleuth.
///
/// Plain value types produced by the scanner and persisted by the cache.
pub mod scan_result;
pub mod size;

pub use scan_result::{CacheEntry, ScanResult};
