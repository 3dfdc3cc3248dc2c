/// FolderSleuth Core — folder scanning, persistent size cache, and the
/// single-flight scan worker.
///
/// This crate contains all business logic with zero UI dependencies.
/// Frontends talk to it exclusively through [`worker::ScanWorker`] and the
/// events it emits.
///
/// # Modules
///
/// - [`model`] — `ScanResult`, `CacheEntry`, and size formatting helpers.
/// - [`scanner`] — Iterative, cancellable depth-first folder walker.
/// - [`cache`] — SQLite-backed memoisation of scan results keyed by path.
/// - [`worker`] — Serves cache hits and runs at most one background scan.
/// - [`platform`] — Symlink / junction safety checks for traversal.
/// - [`error`] — Error types for the cache and the worker.
pub mod cache;
pub mod error;
pub mod model;
pub mod platform;
pub mod scanner;
pub mod worker;

pub use cache::FolderCache;
pub use error::{CacheError, WorkerError};
pub use model::{CacheEntry, ScanResult};
pub use scanner::{CancelFlag, ScanProgress, Scanner};
pub use worker::{NoopObserver, ScanObserver, ScanWorker, WorkerEvent};
