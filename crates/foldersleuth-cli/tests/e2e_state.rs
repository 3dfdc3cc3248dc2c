/// End-to-end tests for the terminal frontend state — listing subfolders,
/// sizing them through the real worker, cache hits on a second run, and the
/// row status machine.
use foldersleuth_cli::render::{render_json, render_progress, render_text};
use foldersleuth_cli::{App, FolderTable, RowStatus};
use foldersleuth_core::{FolderCache, ScanProgress, ScanResult, WorkerEvent};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// ```text
/// root/
///   alpha/ a.txt (100)  nested/b.txt (50)
///   beta/  c.bin (300)
///   loose.txt (999)     — a file, not listed
/// ```
fn make_temp_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let alpha = tmp.path().join("alpha");
    fs::create_dir_all(alpha.join("nested")).unwrap();
    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("nested").join("b.txt"), 50);
    fs::create_dir(tmp.path().join("beta")).unwrap();
    write_bytes(&tmp.path().join("beta").join("c.bin"), 300);
    write_bytes(&tmp.path().join("loose.txt"), 999);
    tmp
}

fn result_for(table: &FolderTable, name: &str, size_bytes: u64, cancelled: bool) -> ScanResult {
    let row = table.rows.iter().find(|r| r.name == name).unwrap();
    ScanResult {
        path: row.path.clone(),
        size_bytes,
        file_count: 1,
        cancelled,
        error_count: 0,
    }
}

// ── Listing ──────────────────────────────────────────────────────────────────

/// Only directories become rows, sorted by name, all starting idle.
#[test]
fn populate_lists_subfolders_only() {
    let tmp = make_temp_tree();
    let table = FolderTable::populate(tmp.path());

    let names: Vec<_> = table.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert!(table.rows.iter().all(|r| r.status == RowStatus::Idle));
    assert_eq!(table.status_line, "2 folders found");
}

/// An unlistable folder yields an empty table and an error status line.
#[test]
fn populate_missing_folder_reports_error() {
    let tmp = TempDir::new().unwrap();
    let table = FolderTable::populate(&tmp.path().join("missing"));
    assert!(table.rows.is_empty());
    assert!(table.status_line.starts_with("Error:"));
}

/// A subfolder whose name is not valid UTF-8 cannot be keyed in the cache,
/// so it is left out rather than failing the whole run.
#[cfg(target_os = "linux")]
#[test]
fn populate_skips_non_utf8_folder() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = make_temp_tree();
    fs::create_dir(tmp.path().join(OsStr::from_bytes(b"bad\xff"))).unwrap();

    let cache = Arc::new(FolderCache::open_in_memory().unwrap());
    let mut app = App::new(cache, tmp.path());
    let names: Vec<_> = app.table.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    app.run(|_, _| {}).unwrap();
    assert_eq!(app.table.status_line, "2 of 2 folders sized");
}

// ── Event folding ────────────────────────────────────────────────────────────

/// Progress marks a row calculating; Finished marks it done or cancelled.
#[test]
fn events_drive_row_status() {
    let tmp = make_temp_tree();
    let mut table = FolderTable::populate(tmp.path());
    let alpha = table.rows[0].path.clone();

    table.apply_event(&WorkerEvent::Progress(ScanProgress {
        root: alpha.clone(),
        current_dir: alpha.clone(),
        size_bytes: 100,
        file_count: 1,
    }));
    let row = table.row(&alpha).unwrap();
    assert_eq!(row.status, RowStatus::Calculating);
    assert_eq!(row.size_bytes, Some(100));

    let done = result_for(&table, "alpha", 150, false);
    table.apply_event(&WorkerEvent::Finished(done));
    assert_eq!(table.row(&alpha).unwrap().status, RowStatus::Done);

    let cancelled = result_for(&table, "beta", 10, true);
    let beta = cancelled.path.clone();
    table.apply_event(&WorkerEvent::Finished(cancelled));
    assert_eq!(table.row(&beta).unwrap().status, RowStatus::Cancelled);
}

/// A store failure is rendered distinctly from a normal outcome.
#[test]
fn store_failure_marks_row_failed() {
    let tmp = make_temp_tree();
    let mut table = FolderTable::populate(tmp.path());
    let result = result_for(&table, "beta", 300, false);
    let beta = result.path.clone();

    table.apply_event(&WorkerEvent::StoreFailed {
        result,
        message: "cache store is closed".into(),
    });

    let row = table.row(&beta).unwrap();
    assert_eq!(row.status, RowStatus::Failed);
    assert!(render_text(&table).contains("failed: cache store is closed"));
}

// ── Full runs ────────────────────────────────────────────────────────────────

/// A run sizes every subfolder; a second run answers from the cache.
#[test]
fn run_sizes_every_row_then_hits_cache() {
    let tmp = make_temp_tree();
    let db = TempDir::new().unwrap();
    let cache = Arc::new(FolderCache::open(db.path().join("cache.db")).unwrap());

    let mut app = App::new(Arc::clone(&cache), tmp.path());
    let mut progress_lines = Vec::new();
    app.run(|table, event| progress_lines.extend(render_progress(table, event)))
        .unwrap();

    let sizes: Vec<_> = app.table.rows.iter().map(|r| (r.status, r.size_bytes)).collect();
    assert_eq!(
        sizes,
        vec![(RowStatus::Done, Some(150)), (RowStatus::Done, Some(300))]
    );
    assert!(!progress_lines.is_empty());
    assert_eq!(app.table.status_line, "2 of 2 folders sized");
    drop(app);

    let mut second = App::new(Arc::clone(&cache), tmp.path());
    second.run(|_, _| panic!("cache hits must not emit events")).unwrap();
    assert!(second.table.rows.iter().all(|r| r.status == RowStatus::Cached));
    assert_eq!(second.table.total_size(), 450);
}

/// `invalidate_all` forces the next run to rescan.
#[test]
fn invalidate_all_forces_rescan() {
    let tmp = make_temp_tree();
    let cache = Arc::new(FolderCache::open_in_memory().unwrap());

    let mut app = App::new(Arc::clone(&cache), tmp.path());
    app.run(|_, _| {}).unwrap();
    assert_eq!(app.invalidate_all().unwrap(), 2);
    assert_eq!(app.invalidate_all().unwrap(), 0);

    write_bytes(&tmp.path().join("beta").join("d.bin"), 1);
    let mut rerun = App::new(cache, tmp.path());
    rerun.run(|_, _| {}).unwrap();
    let beta = rerun.table.rows.iter().find(|r| r.name == "beta").unwrap();
    assert_eq!(beta.status, RowStatus::Done);
    assert_eq!(beta.size_bytes, Some(301));
}

/// JSON output round-trips through serde_json with every row present.
#[test]
fn json_output_lists_rows() {
    let tmp = make_temp_tree();
    let cache = Arc::new(FolderCache::open_in_memory().unwrap());
    let mut app = App::new(cache, tmp.path());
    app.run(|_, _| {}).unwrap();

    let value: serde_json::Value = serde_json::from_str(&render_json(&app.table).unwrap()).unwrap();
    let rows = value["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "alpha");
    assert_eq!(rows[0]["status"], "done");
    assert_eq!(rows[1]["size_bytes"], 300);
}
