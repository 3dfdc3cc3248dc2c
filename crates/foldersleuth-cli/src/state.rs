//! Presentation state for the folder table.
//!
//! The scan thread talks to the frontend only through the worker's event
//! channel; every state change happens in [`FolderTable::apply_event`] on the
//! frontend's own thread.

use anyhow::{anyhow, Context};
use crossbeam_channel::Receiver;
use foldersleuth_core::cache::cache_key;
use foldersleuth_core::{FolderCache, ScanResult, ScanWorker, WorkerEvent};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Listed, not yet requested.
    Idle,
    /// Answered from the cache.
    Cached,
    /// Background scan running.
    Calculating,
    /// Scan completed and saved.
    Done,
    /// Scan was superseded or cancelled; sizes are partial.
    Cancelled,
    /// Scan completed but the result could not be cached.
    Failed,
}

impl RowStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cached => "cached",
            Self::Calculating => "calculating",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// `true` once no more events are expected for the row.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Calculating)
    }
}

/// One subfolder in the table.
#[derive(Debug, Clone, Serialize)]
pub struct FolderRow {
    pub name: String,
    /// Normalised absolute path, matching the worker's scan roots.
    pub path: PathBuf,
    pub status: RowStatus,
    pub size_bytes: Option<u64>,
    pub file_count: Option<u64>,
    /// Entries skipped during the scan; nonzero means partial confidence.
    pub error_count: u64,
    /// Store error text for `Failed` rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FolderRow {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            status: RowStatus::Idle,
            size_bytes: None,
            file_count: None,
            error_count: 0,
            message: None,
        }
    }

    fn apply_result(&mut self, result: &ScanResult, status: RowStatus) {
        self.status = status;
        self.size_bytes = Some(result.size_bytes);
        self.file_count = Some(result.file_count);
        self.error_count = result.error_count;
    }
}

/// All rows for one listed folder, plus a one-line status.
#[derive(Debug, Clone, Serialize)]
pub struct FolderTable {
    pub folder: PathBuf,
    pub rows: Vec<FolderRow>,
    pub status_line: String,
}

impl FolderTable {
    /// List the immediate subfolders of `folder`, sorted by name.
    ///
    /// A folder that cannot be listed gives an empty table whose status line
    /// carries the error.
    pub fn populate(folder: &Path) -> Self {
        let mut table = Self {
            folder: folder.to_path_buf(),
            rows: Vec::new(),
            status_line: String::new(),
        };

        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(err) => {
                table.status_line = format!("Error: {err}");
                return table;
            }
        };

        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let path = match cache_key(&entry.path()) {
                Ok(path) => path,
                Err(err) => {
                    warn!("Skipping folder: {err}");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            table.rows.push(FolderRow::new(name, path));
        }
        table.rows.sort_by(|a, b| a.name.cmp(&b.name));

        table.status_line = format!("{} folders found", table.rows.len());
        table
    }

    pub fn row(&self, path: &Path) -> Option<&FolderRow> {
        self.rows.iter().find(|r| r.path == path)
    }

    fn row_mut(&mut self, path: &Path) -> Option<&mut FolderRow> {
        self.rows.iter_mut().find(|r| r.path == path)
    }

    /// Record a synchronous cache hit.
    pub fn apply_hit(&mut self, result: &ScanResult) {
        if let Some(row) = self.row_mut(&result.path) {
            row.apply_result(result, RowStatus::Cached);
        }
    }

    /// Mark a row whose scan was just started.
    pub fn mark_calculating(&mut self, path: &Path) {
        if let Some(row) = self.row_mut(path) {
            row.status = RowStatus::Calculating;
        }
    }

    /// Fold one worker event into the table.
    ///
    /// Events for paths that are not rows are ignored.
    pub fn apply_event(&mut self, event: &WorkerEvent) {
        match event {
            WorkerEvent::Progress(progress) => {
                if let Some(row) = self.row_mut(&progress.root) {
                    row.status = RowStatus::Calculating;
                    row.size_bytes = Some(progress.size_bytes);
                    row.file_count = Some(progress.file_count);
                }
            }
            WorkerEvent::Finished(result) => {
                let status = if result.cancelled {
                    RowStatus::Cancelled
                } else {
                    RowStatus::Done
                };
                if let Some(row) = self.row_mut(&result.path) {
                    row.apply_result(result, status);
                }
            }
            WorkerEvent::StoreFailed { result, message } => {
                if let Some(row) = self.row_mut(&result.path) {
                    row.apply_result(result, RowStatus::Failed);
                    row.message = Some(message.clone());
                }
            }
        }
    }

    /// Bytes across every row that has a size.
    pub fn total_size(&self) -> u64 {
        self.rows.iter().filter_map(|r| r.size_bytes).sum()
    }
}

/// Drives a [`ScanWorker`] over every row of a [`FolderTable`].
pub struct App {
    worker: ScanWorker,
    events: Receiver<WorkerEvent>,
    pub table: FolderTable,
}

impl App {
    pub fn new(cache: Arc<FolderCache>, folder: &Path) -> Self {
        let (worker, events) = ScanWorker::with_channel(cache);
        Self {
            worker,
            events,
            table: FolderTable::populate(folder),
        }
    }

    /// Drop the cached entry of every row so the next run rescans it.
    pub fn invalidate_all(&self) -> anyhow::Result<usize> {
        let mut removed = 0;
        for row in &self.table.rows {
            if self
                .worker
                .cache()
                .invalidate(&row.path)
                .with_context(|| format!("invalidating {}", row.path.display()))?
            {
                removed += 1;
            }
        }
        info!("Invalidated {removed} cached folders");
        Ok(removed)
    }

    /// Size every row, one at a time.
    ///
    /// The worker is single-flight, so each miss is awaited before the next
    /// row is requested; otherwise every request would cancel the previous
    /// one. `on_event` sees each event after it has been applied.
    pub fn run(&mut self, mut on_event: impl FnMut(&FolderTable, &WorkerEvent)) -> anyhow::Result<()> {
        let paths: Vec<PathBuf> = self.table.rows.iter().map(|r| r.path.clone()).collect();

        for path in paths {
            let requested = self
                .worker
                .request_scan(&path)
                .with_context(|| format!("requesting scan of {}", path.display()))?;

            match requested {
                Some(hit) => self.table.apply_hit(&hit),
                None => {
                    self.table.mark_calculating(&path);
                    self.pump_until_settled(&path, &mut on_event)?;
                }
            }
        }

        let done = self
            .table
            .rows
            .iter()
            .filter(|r| r.status.is_terminal())
            .count();
        self.table.status_line = format!("{done} of {} folders sized", self.table.rows.len());
        Ok(())
    }

    /// Block on the event channel until the row for `path` stops calculating.
    fn pump_until_settled(
        &mut self,
        path: &Path,
        on_event: &mut impl FnMut(&FolderTable, &WorkerEvent),
    ) -> anyhow::Result<()> {
        loop {
            let event = self
                .events
                .recv()
                .map_err(|_| anyhow!("scan worker stopped while sizing {}", path.display()))?;
            self.table.apply_event(&event);
            on_event(&self.table, &event);

            let settled = self.table.row(path).map_or(true, |r| r.status.is_terminal());
            if settled {
                debug!("Row {} settled", path.display());
                return Ok(());
            }
        }
    }
}
