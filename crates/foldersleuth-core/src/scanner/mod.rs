/// Scanner module — computes the total size and file count of a folder
/// subtree.
///
/// The walk is a single-threaded, iterative depth-first traversal over an
/// explicit stack of pending directories, so pathological nesting depth
/// cannot overflow the call stack. It polls a [`CancelFlag`] before each
/// directory and before each entry, and reports a [`ScanProgress`]
/// snapshot after every directory it finishes.
pub mod progress;

pub use progress::ScanProgress;

use crate::model::ScanResult;
use crate::platform;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Shared cooperative cancellation flag.
///
/// Clones observe the same flag. Once set it stays set; the worker creates
/// a fresh flag for every scan so a stale one can never stop a newer scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the scan to stop at its next poll point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Callback receiving a snapshot after each processed directory.
pub type ProgressSink = Box<dyn FnMut(&ScanProgress) + Send>;

/// Running totals for one scan.
#[derive(Debug, Default)]
struct Totals {
    size_bytes: u64,
    file_count: u64,
    error_count: u64,
}

/// One-shot folder walker.
///
/// [`Scanner::scan`] consumes the scanner, so an instance can never be
/// reused or shared between scans.
pub struct Scanner {
    cancel: CancelFlag,
    progress: Option<ProgressSink>,
}

impl Scanner {
    /// Create a scanner bound to `cancel`, with no progress sink.
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            progress: None,
        }
    }

    /// Attach a progress sink, called on the scanning thread.
    pub fn with_progress<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&ScanProgress) + Send + 'static,
    {
        self.progress = Some(Box::new(sink));
        self
    }

    /// Walk `root` and return its totals.
    ///
    /// Never fails: unreadable directories and entries are counted in
    /// `error_count` and skipped. Symlinked and reparse-point directories
    /// are not descended into, and symlinks to files are not counted.
    pub fn scan(mut self, root: &Path) -> ScanResult {
        let start = Instant::now();
        info!("Scanning {}", root.display());

        let mut totals = Totals::default();
        let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
        let mut interrupted = false;

        while !stack.is_empty() {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let Some(current) = stack.pop() else { break };

            let entries = match fs::read_dir(&current) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("Cannot open {}: {}", current.display(), err);
                    totals.error_count += 1;
                    continue;
                }
            };

            if !drain_dir(&self.cancel, &current, entries, &mut stack, &mut totals) {
                interrupted = true;
            }

            if let Some(sink) = self.progress.as_mut() {
                sink(&ScanProgress {
                    root: root.to_path_buf(),
                    current_dir: current,
                    size_bytes: totals.size_bytes,
                    file_count: totals.file_count,
                });
            }
        }

        if interrupted {
            info!(
                "Scan of {} cancelled after {:?} ({} files so far)",
                root.display(),
                start.elapsed(),
                totals.file_count
            );
        } else {
            info!(
                "Scan of {} complete: {} files, {} bytes, {} errors in {:?}",
                root.display(),
                totals.file_count,
                totals.size_bytes,
                totals.error_count,
                start.elapsed()
            );
        }

        ScanResult {
            path: root.to_path_buf(),
            size_bytes: totals.size_bytes,
            file_count: totals.file_count,
            cancelled: interrupted,
            error_count: totals.error_count,
        }
    }
}

/// Visit every entry of one opened directory, polling `cancel` before each.
///
/// Returns `false` if cancellation cut the enumeration short.
fn drain_dir(
    cancel: &CancelFlag,
    dir: &Path,
    entries: fs::ReadDir,
    stack: &mut Vec<PathBuf>,
    totals: &mut Totals,
) -> bool {
    for entry in entries {
        if cancel.is_cancelled() {
            return false;
        }

        let outcome = entry.and_then(|entry| visit(&entry, stack, totals));
        if let Err(err) = outcome {
            debug!("Skipping entry in {}: {}", dir.display(), err);
            totals.error_count += 1;
        }
    }
    true
}

/// Account for one directory entry: add regular files to the totals and
/// push safe subdirectories onto the stack.
fn visit(entry: &DirEntry, stack: &mut Vec<PathBuf>, totals: &mut Totals) -> io::Result<()> {
    // `DirEntry::file_type` does not follow symlinks.
    let file_type = entry.file_type()?;

    if file_type.is_file() {
        let meta = entry.metadata()?;
        totals.size_bytes += meta.len();
        totals.file_count += 1;
    } else if file_type.is_dir() {
        if platform::is_safe_dir(entry) {
            stack.push(entry.path());
        } else {
            debug!("Not descending into linked directory {}", entry.path().display());
        }
    }

    Ok(())
}
