//! Error types for the cache store and the scan worker.
//!
//! Filesystem access problems during a scan are not errors here: the
//! scanner counts them in `ScanResult::error_count` and keeps going.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the persistent cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store file could not be opened or its schema created.
    #[error("failed to open cache store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A query or write against an open store failed.
    #[error("cache store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The store was closed with [`crate::FolderCache::close`].
    #[error("cache store is closed")]
    Closed,

    /// The path cannot be turned into an absolute cache key.
    #[error("invalid cache key {path}: {source}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted value does not fit the model (e.g. a negative size).
    #[error("corrupt cache row for {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}

/// Failures of [`crate::ScanWorker::request_scan`].
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The background scan thread could not be created.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] std::io::Error),
}
