//! Single-flight scan worker.
//!
//! [`ScanWorker::request_scan`] answers from the cache when it can. On a
//! miss it cancels whatever scan is running, starts a new one on a
//! background thread, and returns immediately. At most one scan is live at a
//! time across all paths; a new request always supersedes the previous one.
//!
//! Results reach the frontend through a [`ScanObserver`]. The observer is
//! called on the scan thread, so frontends with thread affinity should use
//! the channel observer from [`ScanWorker::with_channel`] and drain it from
//! their own loop.

use crate::cache::{cache_key, FolderCache};
use crate::error::{CacheError, WorkerError};
use crate::model::ScanResult;
use crate::scanner::{CancelFlag, ScanProgress, Scanner};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Receives notifications from background scans.
///
/// For every scan the worker starts, exactly one of [`on_result`] or
/// [`on_store_error`] is called, after any number of [`on_progress`] calls.
///
/// [`on_result`]: ScanObserver::on_result
/// [`on_store_error`]: ScanObserver::on_store_error
/// [`on_progress`]: ScanObserver::on_progress
pub trait ScanObserver: Send + Sync {
    /// A directory inside the scan root was fully processed.
    fn on_progress(&self, _progress: &ScanProgress) {}

    /// The scan ended. A completed result has already been saved to the
    /// cache; a cancelled one has not.
    fn on_result(&self, _result: &ScanResult) {}

    /// The scan completed but saving it failed.
    fn on_store_error(&self, _result: &ScanResult, _error: &CacheError) {}
}

/// Observer that ignores every notification.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Messages delivered by the channel observer.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Running totals after one directory.
    Progress(ScanProgress),
    /// Terminal event of a scan, cancelled or completed.
    Finished(ScanResult),
    /// Terminal event of a completed scan whose result could not be cached.
    StoreFailed { result: ScanResult, message: String },
}

impl ScanObserver for Sender<WorkerEvent> {
    fn on_progress(&self, progress: &ScanProgress) {
        let _ = self.send(WorkerEvent::Progress(progress.clone()));
    }

    fn on_result(&self, result: &ScanResult) {
        let _ = self.send(WorkerEvent::Finished(result.clone()));
    }

    fn on_store_error(&self, result: &ScanResult, error: &CacheError) {
        let _ = self.send(WorkerEvent::StoreFailed {
            result: result.clone(),
            message: error.to_string(),
        });
    }
}

/// The one live background scan.
struct Session {
    id: u64,
    cancel: CancelFlag,
    /// Disconnects once the scan thread has notified the observer.
    done: Receiver<()>,
    thread: JoinHandle<()>,
}

impl Session {
    fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Serves cached sizes and runs at most one background scan.
pub struct ScanWorker {
    cache: Arc<FolderCache>,
    observer: Arc<dyn ScanObserver>,
    /// Replaced wholesale on every new scan.
    session: Mutex<Option<Session>>,
    next_id: AtomicU64,
}

impl ScanWorker {
    pub fn new(cache: Arc<FolderCache>, observer: Arc<dyn ScanObserver>) -> Self {
        Self {
            cache,
            observer,
            session: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Build a worker whose notifications arrive on the returned channel.
    ///
    /// The channel is unbounded so a slow consumer never stalls a scan.
    pub fn with_channel(cache: Arc<FolderCache>) -> (Self, Receiver<WorkerEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded::<WorkerEvent>();
        (Self::new(cache, Arc::new(tx)), rx)
    }

    /// The cache this worker reads and writes.
    pub fn cache(&self) -> &Arc<FolderCache> {
        &self.cache
    }

    /// Return the cached size of `path`, or start a background scan.
    ///
    /// `Ok(Some(_))` is a cache hit: authoritative, and no notification will
    /// follow for this call. `Ok(None)` means a scan was started, cancelling
    /// any scan that was already running; its outcome arrives through the
    /// observer.
    pub fn request_scan(&self, path: &Path) -> Result<Option<ScanResult>, WorkerError> {
        let root = cache_key(path)?;

        let mut session = self.session.lock();

        if let Some(entry) = self.cache.get(&root)? {
            debug!("Cache hit for {}", root.display());
            return Ok(Some(entry.into_result()));
        }

        if let Some(previous) = session.as_ref() {
            if previous.is_alive() {
                debug!("Superseding running scan for {}", root.display());
                previous.cancel.cancel();
            }
        }

        let cancel = CancelFlag::new();
        let progress_observer = Arc::clone(&self.observer);
        let scanner = Scanner::new(cancel.clone())
            .with_progress(move |progress| progress_observer.on_progress(progress));

        let cache = Arc::clone(&self.cache);
        let observer = Arc::clone(&self.observer);
        let (done_tx, done) = crossbeam_channel::bounded::<()>(1);
        let thread = thread::Builder::new()
            .name("foldersleuth-scanner".into())
            .spawn(move || {
                let result = scanner.scan(&root);
                finish_scan(&cache, observer.as_ref(), result);
                drop(done_tx);
            })
            .map_err(WorkerError::Spawn)?;

        // The superseded thread is detached; it stops at its next poll point.
        *session = Some(Session {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            cancel,
            done,
            thread,
        });
        Ok(None)
    }

    /// Cancel the running scan, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some(session) = self.session.lock().as_ref() {
            if session.is_alive() {
                info!("Cancelling running scan");
                session.cancel.cancel();
            }
        }
    }

    /// `true` while the most recently started scan is still running.
    pub fn is_scanning(&self) -> bool {
        self.session.lock().as_ref().is_some_and(Session::is_alive)
    }

    /// Block until the most recently started scan has finished and notified
    /// the observer.
    ///
    /// Earlier, superseded scans are not waited for. The session stays in
    /// place while waiting, so a concurrent request still supersedes it and
    /// [`is_scanning`](Self::is_scanning) stays accurate.
    pub fn wait(&self) {
        let (id, done) = match self.session.lock().as_ref() {
            Some(session) => (session.id, session.done.clone()),
            None => return,
        };

        // Never sent on; returns when the scan thread drops its end.
        let _ = done.recv();

        let mut slot = self.session.lock();
        if slot.as_ref().is_some_and(|session| session.id == id) {
            if let Some(session) = slot.take() {
                if session.thread.join().is_err() {
                    warn!("Scan thread panicked");
                }
            }
        }
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.cancel();
        self.wait();
    }
}

/// Persist a completed result, then notify the observer.
///
/// The save happens before the notification, so an observer that re-reads
/// the cache sees the new row.
fn finish_scan(cache: &FolderCache, observer: &dyn ScanObserver, result: ScanResult) {
    if result.cancelled {
        observer.on_result(&result);
        return;
    }

    match cache.save(&result) {
        Ok(()) => observer.on_result(&result),
        Err(err) => {
            warn!("Failed to cache scan of {}: {}", result.path.display(), err);
            observer.on_store_error(&result, &err);
        }
    }
}
